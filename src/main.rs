use crate::app::App;
use property_table::config::ConsoleConfig;
use property_table::util;

pub mod app;
pub mod event;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = ConsoleConfig::load()?;
    util::log::init(&config.log_dir)?;
    tracing::info!(component = %config.component, "starting property table");

    let app = App::new(config)?;
    let terminal = ratatui::init();
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}
