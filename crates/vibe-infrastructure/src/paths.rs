//! Path management for vibe configuration files.
//!
//! ```text
//! ~/.config/vibe/
//! └── config.toml    # Client configuration
//! ```

use std::path::PathBuf;
use vibe_core::{Result, SyncError};

pub struct VibePaths;

impl VibePaths {
    /// Returns the vibe configuration directory (`~/.config/vibe`).
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to the config directory
    /// - `Err(SyncError::Config)`: Home directory could not be determined
    pub fn config_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".config").join("vibe"))
            .ok_or_else(|| SyncError::config("Cannot find home directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_location() {
        if let Ok(path) = VibePaths::config_file() {
            assert!(path.ends_with(".config/vibe/config.toml"));
        }
    }
}
