//! Tracing setup.
//!
//! Stderr always gets a layer. Setting `MOTHERSHIP_DOCK_LOG=1` adds a file
//! layer (`mothership-dock.log` under the log dir) and turns the default
//! level up to `info`. `RUST_LOG` replaces the default level either way.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "MOTHERSHIP_DOCK_LOG";
const LOG_FILE: &str = "mothership-dock.log";

/// Flushes the file writer on drop. Hold it in `main`.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn file_logging_enabled() -> bool {
    std::env::var(LOG_ENV).as_deref() == Ok("1")
}

fn default_level(file_logging: bool) -> &'static str {
    if file_logging { "info" } else { "warn" }
}

/// Install the global subscriber. Call once.
pub fn init(log_dir: &Path) -> LogGuard {
    let file_logging = file_logging_enabled();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(file_logging)));

    let (file_layer, file_guard) = if file_logging {
        let _ = std::fs::create_dir_all(log_dir);
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    LogGuard {
        _file_guard: file_guard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_raises_default_level() {
        assert_eq!(default_level(true), "info");
        assert_eq!(default_level(false), "warn");
    }
}
