use gtk::prelude::*;
use relm4::prelude::*;

use crate::models::Role;
use crate::services::chat::{EntryState, LogEntry};
use crate::services::markdown::{blocks_to_plain_text, MessageBlock};
use crate::ui::markdown_view::render_blocks;

/// One bubble in the message log, rebuilt whenever the log changes.
pub struct MessageRow {
    entry: LogEntry<Vec<MessageBlock>>,
}

#[relm4::factory(pub)]
impl FactoryComponent for MessageRow {
    type Init = LogEntry<Vec<MessageBlock>>;
    type Input = ();
    type Output = ();
    type CommandOutput = ();
    type ParentWidget = gtk::Box;

    view! {
        gtk::Box {
            set_orientation: gtk::Orientation::Horizontal,
            set_spacing: 8,
            set_margin_top: 4,
            set_margin_bottom: 4,
            set_margin_start: 12,
            set_margin_end: 12,
        }
    }

    fn init_model(entry: Self::Init, _index: &DynamicIndex, _sender: FactorySender<Self>) -> Self {
        Self { entry }
    }

    fn init_widgets(
        &mut self,
        _index: &DynamicIndex,
        root: Self::Root,
        _returned_widget: &<Self::ParentWidget as relm4::factory::FactoryView>::ReturnedWidget,
        _sender: FactorySender<Self>,
    ) -> Self::Widgets {
        let is_user = self.entry.role == Role::User;
        root.set_halign(if is_user {
            gtk::Align::End
        } else {
            gtk::Align::Start
        });

        let avatar = gtk::Label::builder()
            .label(self.entry.role.avatar())
            .valign(gtk::Align::Start)
            .width_request(32)
            .height_request(32)
            .build();
        avatar.add_css_class("avatar");
        avatar.add_css_class(if is_user { "avatar-user" } else { "avatar-assistant" });

        let bubble = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(4)
            .margin_start(8)
            .margin_end(8)
            .margin_top(8)
            .margin_bottom(8)
            .build();

        match self.entry.state {
            EntryState::Pending => {
                let thinking = gtk::Box::builder()
                    .orientation(gtk::Orientation::Horizontal)
                    .spacing(8)
                    .build();
                thinking.append(&gtk::Spinner::builder().spinning(true).build());
                let label = gtk::Label::new(Some("Thinking\u{2026}"));
                label.add_css_class("dim-label");
                thinking.append(&label);
                bubble.append(&thinking);
            }
            EntryState::Failed => {
                let label = gtk::Label::builder()
                    .label(&self.entry.text)
                    .halign(gtk::Align::Start)
                    .wrap(true)
                    .build();
                label.add_css_class("error");
                bubble.append(&label);
            }
            EntryState::Rendered => match &self.entry.content {
                Some(blocks) => render_blocks(&bubble, blocks),
                None => bubble.append(&gtk::Label::new(Some(&self.entry.text))),
            },
        }

        let card = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .build();
        card.add_css_class("card");
        card.add_css_class(if is_user {
            "message-bubble-user"
        } else {
            "message-bubble-assistant"
        });
        card.append(&bubble);

        if let (EntryState::Rendered, Some(blocks)) = (self.entry.state, &self.entry.content) {
            let copy_button = gtk::Button::builder()
                .icon_name("edit-copy-symbolic")
                .tooltip_text("Copy message")
                .halign(gtk::Align::End)
                .margin_end(4)
                .margin_bottom(4)
                .build();
            copy_button.add_css_class("flat");
            copy_button.add_css_class("circular");
            let text = blocks_to_plain_text(blocks);
            copy_button.connect_clicked(move |button| {
                button.clipboard().set_text(&text);
            });
            card.append(&copy_button);
        }

        if is_user {
            root.append(&card);
            root.append(&avatar);
        } else {
            root.append(&avatar);
            root.append(&card);
        }

        let widgets = view_output!();
        widgets
    }
}
