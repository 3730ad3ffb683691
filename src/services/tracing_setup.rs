//! Tracing subscriber setup
//!
//! The viewer owns the terminal, so diagnostics always go to a file.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber writing to `log_file_path`.
///
/// Filtering follows `RUST_LOG`, defaulting to INFO. Returns an error if the
/// log file cannot be created; the caller decides whether that is fatal.
pub fn init_global(log_file_path: &Path) -> std::io::Result<()> {
    let log_file = File::create(log_file_path)?;
    let subscriber = build_subscriber(log_file);
    // A subscriber may already be installed (e.g. by a test harness).
    let _ = subscriber.try_init();
    Ok(())
}

/// Build the subscriber shared between production and tests.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_subscriber_writes_to_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Command execution failed: test");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("WARN"));
        assert!(contents.contains("Command execution failed: test"));
    }
}
