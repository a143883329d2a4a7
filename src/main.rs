use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use trip_planner_api::{
  app::{cors_layer, create_app},
  config::AppConfig,
  db::pool::create_pool,
  domains::destination::client::HttpDestinationService,
  state::SharedAppState,
  storage::{ObjectStorage, S3Storage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenv().ok();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).init();

  let config = AppConfig::from_env()?;

  let pool = create_pool(&config).await.context("Failed to create database pool")?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database migrations applied successfully");

  let storage: Option<Arc<dyn ObjectStorage>> = match &config.s3 {
    Some(s3) => Some(Arc::new(S3Storage::new(s3).await?)),
    None => {
      tracing::warn!("S3_BUCKET not set, avatar uploads are disabled");
      None
    }
  };

  let http_client = HttpDestinationService::build_client(&config.apis).context("Failed to build HTTP client")?;

  let app_state = SharedAppState::new(pool, &config, storage, http_client);
  let app = create_app(app_state).layer(cors_layer(config.cors_allowed_origin.as_deref())?);

  let listener = tokio::net::TcpListener::bind(&config.bind_address)
    .await
    .with_context(|| format!("Failed to bind {}", config.bind_address))?;

  tracing::info!("Server running on http://{}", config.bind_address);

  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

  tracing::info!("Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!("Failed to install Ctrl+C handler: {}", e);
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut stream) => {
        stream.recv().await;
      }
      Err(e) => {
        tracing::error!("Failed to install signal handler: {}", e);
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
      _ = ctrl_c => {},
      _ = terminate => {},
  }

  tracing::info!("Received termination signal, shutting down gracefully...");
}
