use std::sync::Arc;

use anyhow::Result;
use relm4::prelude::*;
use tracing_subscriber::EnvFilter;

use nexora::app::{App, AppInit};
use nexora::config::{ClientConfig, APP_ID};
use nexora::providers::RemoteGenerator;
use nexora::services::Database;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env();
    let database = Database::open(&config.database_path()?)?;
    let generator = RemoteGenerator::new(&config.api_url)?;
    tracing::info!("Using Nexora server at {}", generator.endpoint());

    let app = adw::Application::builder().application_id(APP_ID).build();
    let relm = RelmApp::from_app(app);
    relm4::set_global_css(include_str!("../data/style.css"));

    relm.run::<App>(AppInit {
        database,
        generator: Arc::new(generator),
    });
    Ok(())
}
