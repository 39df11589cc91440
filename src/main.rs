use anyhow::{Context, Result};
use log::info;

use prodflow::config::Config;
use prodflow::logger;
use prodflow::App;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--init-config") {
        let path = Config::get_default_config_path()?;
        Config::generate_default_config(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = Config::load()?;
    logger::init(&config.logging)?;

    let app = App::open(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!("Realtime endpoints listening on {}", config.server.bind_address);

    axum::serve(listener, app.router())
        .await
        .context("Realtime server stopped")?;
    Ok(())
}
