use crate::cli::LogFormat;
use tracing::subscriber::set_global_default;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    LogTracer::init()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => set_global_default(
            registry.with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stdout),
            ),
        )?,
        LogFormat::Pretty => set_global_default(
            registry.with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stdout),
            ),
        )?,
    }

    Ok(())
}
