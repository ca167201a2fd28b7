use std::env;
use std::sync::Arc;
use token_ledger_server::auth::AuthState;
use token_ledger_server::config::load_config;
use token_ledger_server::handlers::LedgerState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // -------------------------------
    // Load configuration
    // -------------------------------
    let config = load_config()?;

    // -------------------------------
    // Initialize Tracing / Logging
    // -------------------------------
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.rust_log));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        port = config.server_port,
        domain = %config.auth_domain,
        "Token ledger starting..."
    );
    if env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    // -------------------------------
    // Web Server Setup
    // -------------------------------
    let auth_state = Arc::new(AuthState::new(&config, None));
    tracing::info!("Login server account: {}", auth_state.server_stellar_address());

    let ledger_state = Arc::new(LedgerState::new(auth_state.resolver()));
    let app = token_ledger_server::app(auth_state, ledger_state);

    // -------------------------------
    // Run Server
    // -------------------------------
    let bind_addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Server listening on http://{}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", local_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
