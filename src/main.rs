use anyhow::Result;
use course_api::api::{create_routes, AppState};
use course_api::config::{AppConfig, DatabaseConfig, DatabaseSeeder};
use course_api::storage::StorageBackend;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db_config = DatabaseConfig::from_env()?;
    if config.is_production() && db_config.backend == StorageBackend::Memory {
        anyhow::bail!("In-memory storage is not allowed when ENVIRONMENT=production");
    }
    let storage = db_config.connect().await?;

    if config.seed_demo_data {
        DatabaseSeeder::new(storage.clone(), config.max_students_per_course)
            .seed_all()
            .await?;
    }

    let app = create_routes(AppState::new(storage, &config));

    let listener = TcpListener::bind(config.server_address()).await?;
    info!(
        "Course API starting on http://{} ({} storage, {} environment)",
        config.server_address(),
        db_config.backend,
        config.environment
    );
    info!("Health check available at http://{}/health", config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
