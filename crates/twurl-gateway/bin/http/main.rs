mod cli;
mod telemetry;

use crate::cli::{StorageBackendArg, CLI};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use twurl_core::{Shortener, UrlStore};
use twurl_gateway::{App, AppState};
use twurl_generator::RandomGenerator;
use twurl_shortener::{ShortenerService, ShortenerSettings};
use twurl_storage::{InMemoryRepository, MySqlRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::parse();

    telemetry::init(config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        storage_backend = %config.storage,
        log_format = %config.log_format,
        "starting gateway server"
    );

    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_attempts)
        .max_page_size(config.max_page_size)
        .build();

    let shortener = match config.storage {
        StorageBackendArg::InMemory => build_shortener(InMemoryRepository::new(), settings),
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .ok_or("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(&mysql_dsn).await?;
            repository.ensure_schema().await?;
            build_shortener(repository, settings)
        }
    };

    run_server(
        config.listen_addr,
        AppState::new(shortener, config.public_base_url),
    )
    .await?;

    Ok(())
}

fn build_shortener<R: UrlStore>(repository: R, settings: ShortenerSettings) -> Arc<dyn Shortener> {
    Arc::new(ShortenerService::with_settings(
        repository,
        RandomGenerator::new(),
        settings,
    ))
}

async fn run_server(listen_addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
