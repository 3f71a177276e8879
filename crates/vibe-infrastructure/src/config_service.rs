//! Configuration service implementation.
//!
//! Loads the client configuration from `~/.config/vibe/config.toml` and
//! applies environment overrides on top of it.

use crate::paths::VibePaths;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use vibe_core::config::ClientConfig;
use vibe_core::{Result, SyncError};

pub const ENV_API_BASE_URL: &str = "VIBE_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "VIBE_REQUEST_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "VIBE_LOG_LEVEL";

/// Configuration service that loads and caches the client configuration.
///
/// A missing file yields the defaults; a malformed one is a
/// [`SyncError::Serialization`] error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit file location; `None` resolves `~/.config/vibe/config.toml`.
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading from an explicit file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading it if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let path = match &self.path {
            Some(path) => path.clone(),
            None => VibePaths::config_file()?,
        };
        let mut loaded = Self::load_file(&path)?;
        apply_overrides(&mut loaded, |name| std::env::var(name).ok())?;

        {
            let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    fn load_file(path: &Path) -> Result<ClientConfig> {
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ClientConfig = toml::from_str(&content)?;
        tracing::debug!("[ConfigService] Loaded {}", path.display());
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies `VIBE_*` overrides using `lookup` to read variables.
pub fn apply_overrides(
    config: &mut ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
        config.api_base_url = url.trim().to_string();
    }
    if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
        config.request_timeout_ms = raw.trim().parse().map_err(|_| {
            SyncError::config(format!(
                "{} must be a number of milliseconds, got {:?}",
                ENV_REQUEST_TIMEOUT_MS, raw
            ))
        })?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        config.log_level = level.trim().to_string();
    }
    Ok(())
}
