use std::sync::Arc;

use alkebulan::payments::{PaymentGateway, StripeGateway};
use alkebulan::{db, routes, state};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Initialize the payment gateway (non-fatal: checkout disabled if the
    // provider credential is missing).
    let payments: Option<Arc<dyn PaymentGateway>> = match StripeGateway::from_env() {
        Ok(gateway) => {
            tracing::info!("payment gateway initialized");
            Some(Arc::new(gateway))
        }
        Err(e) => {
            tracing::warn!(error = %e, "payment gateway not configured — checkout disabled");
            None
        }
    };

    let config = state::AppConfig::from_env();
    let state = state::AppState::new(pool, payments, config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "alkebulan listening");
    axum::serve(listener, app).await.expect("server failed");
}
