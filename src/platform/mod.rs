// historysync platform paths
// Safari's data directory plus a per-OS directory for our own state and the
// ingest database.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

/// Returns the user's home directory, falling back to `/tmp`.
pub(crate) fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Returns Safari's data directory: `~/Library/Safari`.
///
/// The path is computed on every platform so exports and tests can point at a
/// copied profile; only macOS actually has one.
pub fn get_safari_dir() -> PathBuf {
    home_dir().join("Library").join("Safari")
}

/// Returns the directory for historysync's own state.
///
/// - **macOS**: `~/Library/Application Support/historysync`
/// - **Linux**: `~/.local/share/historysync` (or `$XDG_DATA_HOME/historysync`)
/// - elsewhere: `~/.historysync`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        home_dir().join(".historysync")
    }
}
