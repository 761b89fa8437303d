use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const DEFAULT_DB_URL: &str = "sqlite://study.sqlite3";
pub const DEFAULT_BANK: &str = "data";

/// Runtime settings, read from the environment and then overridden by flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    /// Question bank base URL or directory.
    pub bank: String,
    pub namespace: Option<String>,
    pub rust_log: String,
}

impl Config {
    /// Reads `STUDY_DB_URL`, `STUDY_BANK`, `STUDY_NAMESPACE` and `RUST_LOG`.
    #[must_use]
    pub fn from_env() -> Self {
        let db_url = env::var("STUDY_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.to_string(), normalize_sqlite_url);
        let bank = env::var("STUDY_BANK")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BANK.to_string());
        let namespace = env::var("STUDY_NAMESPACE")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            db_url,
            bank,
            namespace,
            rust_log,
        }
    }
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories when missing.
///
/// # Errors
///
/// Returns an error for a URL without a file path, or if the file cannot be
/// created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| format!("invalid database url: {db_url}"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(format!("invalid database url: {db_url}").into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        debug!(path = %path.display(), "created database file");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/study.db".into()),
            "sqlite:///tmp/study.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/lib/study.db".into()),
            "sqlite:///var/lib/study.db"
        );

        let relative = normalize_sqlite_url("progress.sqlite3".into());
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("/progress.sqlite3"));
    }

    #[test]
    fn prepare_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("study.sqlite3");
        let url = format!("sqlite://{}", file.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(file.exists());
        // A second call leaves the existing file alone.
        prepare_sqlite_file(&url).unwrap();

        assert!(prepare_sqlite_file("postgres://db").is_err());
    }
}
