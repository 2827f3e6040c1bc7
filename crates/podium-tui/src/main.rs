// Podium entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config (copying defaults on first run)
// 3. Build the HTTP transport and image builder
// 4. Start the load session (spawns the page fetcher)
// 5. Run the TUI event loop until the user quits
// 6. Cleanup on exit

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use podium_core::config;
use podium_core::image::SvgHeaderProbe;
use podium_core::session::Session;
use podium_core::transport::HttpTransport;
use podium_tui::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Podium starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: source={}, {} attempts per load, {} display slots",
        config.source.base_url,
        config.retry.max_failed_connection_attempts,
        config.window.viewport_slot_count
    );

    // 3. Transport and image builder, shared by the fetcher and avatar queue
    let transport = HttpTransport::new(config.source.request_timeout())
        .context("failed to build HTTP transport")?;

    // 4. Start loading pages in the background
    let session = Session::start(&config, Arc::new(transport), Arc::new(SvgHeaderProbe));

    // 5. Run the TUI until the user quits
    if let Err(e) = tui::run(session, &config).await {
        error!("TUI error: {:#}", e);
        return Err(e);
    }

    // 6. Cleanup happens in tui::run (session shutdown)
    info!("Podium shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("podium.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("podium=info,podium_core=info,podium_tui=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
