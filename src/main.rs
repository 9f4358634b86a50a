use docsign::config::ServiceConfig;
use docsign::handlers::{bind_server, ServiceContext};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting declaration service");

    let config = ServiceConfig::from_env()?;
    let ctx = ServiceContext::from_config(&config)?;
    info!(
        "Database initialized with {} declarations",
        ctx.repository()?.count_declarations().unwrap_or(0)
    );
    info!("Signing links point at {}", ctx.links().base());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
    };

    let (addr, server) = bind_server(config.bind_addr, Arc::new(ctx), shutdown)?;
    info!("Server running on {}", addr);
    server.await;

    Ok(())
}
