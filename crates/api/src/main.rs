use anyhow::Result;
use volo_api::{build_app_with, ApiConfig};
use volo_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("volo_api");

    let config = ApiConfig::from_env();
    let bind = config.bind.clone();
    let app = build_app_with(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "volo hotel api started");

    axum::serve(listener, app).await?;
    Ok(())
}
