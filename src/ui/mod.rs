pub mod markdown_view;
pub mod message_row;
pub mod sidebar;
pub mod window;
