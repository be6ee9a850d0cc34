/**
 * Realtime Server Entry Point
 *
 * Loads configuration, binds the WebSocket/HTTP listener once and serves
 * until Ctrl-C.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use social_realtime::backend::server::{create_app, serve, RealtimeConfig};

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    // Initialize tracing with INFO level by default
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = match RealtimeConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "[STARTUP] Invalid configuration");
            return Err(e.into());
        }
    };
    let addr = config.socket_addr();
    let ws_path = config.ws_path.clone();

    let (app, state) = create_app(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %ws_path, "[STARTUP] Listening");

    serve(listener, app, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    })
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin realtime-server --features ssr");
    std::process::exit(1);
}
