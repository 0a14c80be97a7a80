//! Logging setup driven by the configuration

use anyhow::{Context, Result};
use dfpconfig::Config;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Name of the log file inside `log_home`
pub const LOG_FILE: &str = "dfp_api_lib.log";

/// Level used when `RUST_LOG` is not set.
pub fn default_level(config: &Config) -> Level {
    if config.debug || config.xml_log {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Installs the global subscriber.
///
/// Logs go to `log_home/dfp_api_lib.log` when `log_home` is set, to the
/// console otherwise. `RUST_LOG` overrides the level taken from `debug`.
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level(config)).into())
        .from_env_lossy();
    let subscriber = Registry::default().with(filter);

    match &config.log_home {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let path = dir.join(LOG_FILE);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;

            subscriber
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?;
        }
        None => {
            subscriber
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_level(true),
                )
                .try_init()?;
        }
    }

    Ok(())
}
