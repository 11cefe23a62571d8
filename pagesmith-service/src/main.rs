use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

mod api;
mod config;
mod error;
mod rasterize;

use crate::config::StaticConfig;
use crate::rasterize::PageRasterizer;

// Re-export config crate types to avoid namespace collision
use ::config::{Config as ConfigBuilder, Environment, File};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    info!(
        "Starting Pagesmith service v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load static configuration (server binding, rasterizer environment)
    let static_config: StaticConfig = ConfigBuilder::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("PAGESMITH")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    info!(
        host = %static_config.server.host,
        port = static_config.server.port,
        "Static configuration loaded"
    );

    // Ensure the temp directory exists before the first conversion needs it
    std::fs::create_dir_all(&static_config.rasterizer.temp_dir)?;

    let rasterizer = Arc::new(PageRasterizer::new(static_config.rasterizer.clone()));
    if rasterizer.tool_available().await {
        info!(
            tool = %static_config.rasterizer.tool_path.display(),
            "Rasterizer tool is available"
        );
    } else {
        warn!(
            tool = %static_config.rasterizer.tool_path.display(),
            "Rasterizer tool is not available; conversion requests will fail"
        );
    }

    // Build the router
    let app = api::router(rasterizer, &static_config);

    // Start the server
    let addr = format!(
        "{}:{}",
        static_config.server.host, static_config.server.port
    );
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pagesmith_service=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
