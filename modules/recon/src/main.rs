use gateway_verifier::{GatewayVerifier, MockVerifier, PaystackVerifier, StripeVerifier};
use recon_rs::config::Config;
use recon_rs::store::{InMemoryStore, LedgerStore, PgStore};
use recon_rs::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Storage
    let store: Arc<dyn LedgerStore> = match config.store_type.to_lowercase().as_str() {
        "postgres" => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL checked by Config::from_env");

            tracing::info!("Connecting to database...");
            let pool = recon_rs::db::init_pool(database_url).await?;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./db/migrations").run(&pool).await?;

            Arc::new(PgStore::new(pool))
        }
        "inmemory" => {
            tracing::info!("Using in-memory store");
            Arc::new(InMemoryStore::new())
        }
        other => anyhow::bail!("Invalid STORE_TYPE: {other}. Must be 'postgres' or 'inmemory'"),
    };

    // Gateway verifiers
    let (paystack, stripe): (Arc<dyn GatewayVerifier>, Arc<dyn GatewayVerifier>) =
        match config.gateway_mode.to_lowercase().as_str() {
            "live" => (
                Arc::new(PaystackVerifier::from_env()?),
                Arc::new(StripeVerifier::from_env()?),
            ),
            "mock" => {
                tracing::info!("Using mock gateway verifiers");
                let mock = Arc::new(MockVerifier::new());
                (mock.clone(), mock)
            }
            other => anyhow::bail!("Invalid GATEWAY_MODE: {other}. Must be 'live' or 'mock'"),
        };

    let state = AppState {
        store,
        paystack,
        stripe,
    };

    let app = router(state).layer(
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Recon module listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
