//! Logging Infrastructure
//!
//! Structured logging setup for development (pretty) and production (JSON).
//! `RUST_LOG` always wins over the configured level.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// 默认过滤规则
fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "order_server={level},shared={level},tower_http={level},http_access={level},sqlx=warn"
    ))
}

/// Initialize the global subscriber
///
/// With `log_dir` set, output is also written to a daily-rolling file. The
/// returned guard must be kept alive for the file writer to flush.
pub fn init_logger(
    level: &str,
    json: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "order-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(file_layer);

    if json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(false))
            .try_init()?;
    }

    Ok(guard)
}
