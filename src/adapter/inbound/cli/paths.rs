//! Path utilities for derivgate.
//!
//! All local data lives under `~/.derivgate/`:
//! - `~/.derivgate/config.toml` - main configuration
//! - `~/.derivgate/.env` - optional environment file holding the API token

use std::path::PathBuf;

/// Returns the derivgate home directory (`~/.derivgate/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".derivgate")
}

/// Returns the default config file path (`~/.derivgate/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the per-user env file (`~/.derivgate/.env`).
pub fn env_file() -> PathBuf {
    home_dir().join(".env")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_derivgate_home() {
        let home = home_dir();
        assert!(home.to_string_lossy().contains(".derivgate"));
        assert!(default_config().starts_with(&home));
        assert!(env_file().starts_with(&home));
        assert!(default_config().ends_with("config.toml"));
    }
}
