// historysync data path for macOS
// Data: ~/Library/Application Support/historysync

use std::path::PathBuf;

/// `~/Library/Application Support/historysync`
pub fn get_data_dir() -> PathBuf {
    super::home_dir()
        .join("Library")
        .join("Application Support")
        .join("historysync")
}
