use anyhow::Context;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

/// `logs/Amazon_logs_{ddmmYYYYHHMM}.txt`, one file per run
pub fn log_file_path(logs_dir: &Path, started_at: DateTime<Local>) -> PathBuf {
    logs_dir.join(format!("Amazon_logs_{}.txt", started_at.format("%d%m%Y%H%M")))
}

pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Console output plus a plain-text copy of every line in the run's log file.
/// `RUST_LOG` overrides the default `info` level.
pub fn subscriber(log_file: File) -> impl Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
}

pub fn init(log_path: &Path) -> anyhow::Result<()> {
    let file = open_log_file(log_path)?;
    tracing::subscriber::set_global_default(subscriber(file))
        .context("Failed to install logging subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn log_file_is_named_after_start_time() {
        let started = Local.with_ymd_and_hms(2025, 1, 7, 9, 5, 0).unwrap();
        assert_eq!(
            log_file_path(Path::new("logs"), started),
            Path::new("logs").join("Amazon_logs_070120250905.txt")
        );
    }

    #[test]
    fn events_land_in_the_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.txt");
        let file = open_log_file(&path).unwrap();

        tracing::subscriber::with_default(subscriber(file), || {
            tracing::info!("Search Keyword: desk lamp now start scraping");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Search Keyword: desk lamp now start scraping"));
        assert!(!contents.contains('\u{1b}'));
    }
}
