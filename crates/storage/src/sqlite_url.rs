//! Checks on the sqlite connection string handed to [`crate::Store`].

use std::fs;
use std::io;
use std::path::Path;

pub const MEMORY_PREFIX: &str = "sqlite::memory:";
pub const URL_PREFIX: &str = "sqlite://";

#[derive(Debug, thiserror::Error)]
pub enum SqliteUrlError {
    #[error("sqlite path must start with `sqlite://` or use `sqlite::memory:`")]
    BadScheme,
    #[error("sqlite path is missing a filesystem component after `sqlite://`")]
    MissingPath,
}

pub fn validate_sqlite_url(url: &str) -> Result<(), SqliteUrlError> {
    if url.starts_with(MEMORY_PREFIX) {
        return Ok(());
    }
    let rest = url
        .strip_prefix(URL_PREFIX)
        .ok_or(SqliteUrlError::BadScheme)?;
    if file_part(rest).is_empty() {
        return Err(SqliteUrlError::MissingPath);
    }
    Ok(())
}

/// Creates the directory a file-backed database will live in.
pub fn ensure_parent_dir(url: &str) -> io::Result<()> {
    if url.starts_with(MEMORY_PREFIX) {
        return Ok(());
    }
    if let Some(rest) = url.strip_prefix(URL_PREFIX) {
        if let Some(parent) = Path::new(file_part(rest)).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}

fn file_part(rest: &str) -> &str {
    rest.split_once('?').map(|(path, _)| path).unwrap_or(rest)
}
