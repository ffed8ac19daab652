#[cfg(feature = "desktop")]
pub mod app;
pub mod config;
pub mod models;
pub mod providers;
pub mod server;
pub mod services;
#[cfg(feature = "desktop")]
pub mod ui;
