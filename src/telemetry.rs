//! Logging setup
//!
//! - JSON file logs, rotated daily, written off-thread
//! - Compact console logs on stderr in verbose mode (stdout carries the
//!   streamed reply)
//!
//! `RUST_LOG` overrides the default filter.

use crate::config::TelemetryConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Keeps the log writer alive; drop it last to flush pending lines
pub struct Telemetry {
    _file_guard: WorkerGuard,
}

impl Telemetry {
    pub fn init(config: &TelemetryConfig) -> anyhow::Result<Self> {
        Self::init_with(&config.log_dir, config.verbose)
    }

    pub fn init_with(log_dir: &Path, verbose: bool) -> anyhow::Result<Self> {
        std::fs::create_dir_all(log_dir)?;

        let session_id = Uuid::new_v4();

        let file_appender = tracing_appender::rolling::daily(log_dir, "deepdimension.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("debug,hyper=info,reqwest=info,h2=info,rustls=info")
            } else {
                EnvFilter::new("info,hyper=warn,reqwest=warn,h2=warn,rustls=warn")
            }
        });

        // A global subscriber may already be installed (tests, embedding apps)
        if verbose {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        }

        tracing::info!(
            session_id = %session_id,
            log_dir = %log_dir.display(),
            "Telemetry initialized"
        );

        Ok(Self {
            _file_guard: file_guard,
        })
    }
}
