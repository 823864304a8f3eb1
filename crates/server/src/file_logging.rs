//! Console logging plus optional rotating JSON log files.
//!
//! - `PLANNER_FILE_LOGGING`: "true" or "1" enables file output
//! - `PLANNER_LOG_DIR`: log directory (default `logs`)
//! - `PLANNER_LOG_MAX_FILES`: daily files to keep (default 7)
//!
//! `RUST_LOG`, when set, replaces the per-crate default filter.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "planneros.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub log_dir: PathBuf,
    pub max_files: usize,
}

impl FileLoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("PLANNER_FILE_LOGGING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let log_dir = lookup("PLANNER_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));
        let max_files = lookup("PLANNER_LOG_MAX_FILES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);
        Self {
            enabled,
            log_dir,
            max_files,
        }
    }
}

fn default_filter(level: &str) -> String {
    format!("warn,server={level},services={level},db={level},utils={level},tower_http={level}")
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Hold the returned guard until shutdown so
/// buffered file output is flushed.
pub fn init_logging(log_level: &str) -> Option<WorkerGuard> {
    let config = FileLoggingConfig::from_env();
    let console_layer = tracing_subscriber::fmt::layer().with_filter(build_filter(log_level));

    if !config.enabled {
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        tracing_subscriber::registry().with(console_layer).init();
        tracing::warn!(log_dir = ?config.log_dir, error = %e, "Failed to create log directory; logging to console only");
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(build_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = ?config.log_dir,
        max_files = config.max_files,
        "File logging enabled"
    );

    let log_dir = config.log_dir.clone();
    let max_files = config.max_files;
    std::thread::spawn(move || {
        cleanup_old_logs(&log_dir, max_files);
    });

    Some(guard)
}

/// Keep the `max_files` newest log files and delete the rest. Returns how
/// many were removed.
fn cleanup_old_logs(log_dir: &Path, max_files: usize) -> usize {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return 0;
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
        })
        .filter_map(|e| {
            e.metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|t| (e.path(), t))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.into_iter().skip(max_files) {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(?path, "Removed old log file");
                removed += 1;
            }
            Err(e) => tracing::warn!(?path, error = %e, "Failed to remove old log file"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs, thread, time::Duration};

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FileLoggingConfig::from_lookup(|_| None);
        assert!(!config.enabled);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.max_files, 7);
    }

    #[test]
    fn test_config_overrides() {
        let vars = HashMap::from([
            ("PLANNER_FILE_LOGGING", "1"),
            ("PLANNER_LOG_DIR", "/var/log/planneros"),
            ("PLANNER_LOG_MAX_FILES", "3"),
        ]);
        let config = FileLoggingConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert!(config.enabled);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/planneros"));
        assert_eq!(config.max_files, 3);
    }

    #[test]
    fn test_cleanup_keeps_newest() {
        let dir = TempDir::new().unwrap();
        for day in 1..=4 {
            fs::write(dir.path().join(format!("{LOG_FILE_PREFIX}.2026-01-0{day}")), "{}").unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        fs::write(dir.path().join("unrelated.txt"), "keep").unwrap();

        assert_eq!(cleanup_old_logs(dir.path(), 2), 2);

        let mut remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                format!("{LOG_FILE_PREFIX}.2026-01-03"),
                format!("{LOG_FILE_PREFIX}.2026-01-04"),
                "unrelated.txt".to_string(),
            ]
        );
    }
}
