use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pulse_media::{
    api::{self, AppState},
    config::AppConfig,
    storage::{MediaStore, UPLOADS_MOUNT},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    let bind_address = config.bind_address();

    let storage = MediaStore::new(config.upload_dir.clone(), UPLOADS_MOUNT);
    storage.ensure_root().await?;

    let state = AppState::new(storage, config.database.clone());
    let router = api::router(state, config.upload_body_limit);
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!(
        upload_dir = %config.upload_dir.display(),
        "media backend started at http://{}",
        bind_address
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
