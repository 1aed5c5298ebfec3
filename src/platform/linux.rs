// historysync data path for Linux
// Data: ~/.local/share/historysync

use std::env;
use std::path::PathBuf;

/// Uses `$XDG_DATA_HOME/historysync` if set, otherwise `~/.local/share/historysync`.
pub fn get_data_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("historysync")
    } else {
        super::home_dir()
            .join(".local")
            .join("share")
            .join("historysync")
    }
}
