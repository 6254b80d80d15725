use anyhow::Context;

use pantry_infra::PantryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pantry_observability::init();

    let config = PantryConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr;

    let app = pantry_api::app::build_app_from_config(&config)
        .await
        .context("failed to build application")?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(
        addr = %listener.local_addr().context("listener has no local address")?,
        collection = %config.collection,
        store = config.store.name(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
