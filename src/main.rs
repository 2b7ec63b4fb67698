use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use matchstudy_api::{
    config::Config,
    db::{self, PostgresRepository},
    routes::{create_router, AppState},
    services::recommendation::EngineSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;

    let state = AppState {
        repo: Arc::new(PostgresRepository::new(pool)),
        settings: EngineSettings::from(&config),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
