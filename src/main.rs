//! Server binary: loads settings, prepares the database, wires S3 and SMTP, serves the API.

use social_api::{app, ensure_database_exists, ensure_tables, AppState, S3Store, Settings, SmtpMailer, TokenKeys};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("social_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await?;
    ensure_tables(&pool).await?;

    let storage = S3Store::from_env(settings.s3_bucket.clone(), settings.public_object_url()).await;
    let mailer = SmtpMailer::new(&settings.smtp)?;
    let state = AppState {
        pool,
        tokens: Arc::new(TokenKeys::from_settings(&settings)),
        storage: Arc::new(storage),
        mailer: Arc::new(mailer),
        settings: Arc::new(settings),
    };

    let listener = TcpListener::bind(&state.settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
