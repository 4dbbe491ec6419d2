mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::{debug, info};

/// Loads `.env`, then the YAML file named by `CONFIG_PATH`, then applies
/// environment overrides.
pub async fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let mut config = load_from_path(&config_path).await?;
    config.apply_overrides(|key| env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}

/// A missing file is not an error: every setting has a default.
pub async fn load_from_path(config_path: &str) -> Result<Config> {
    debug!("Loading configuration from: {}", config_path);

    match tokio::fs::read_to_string(config_path).await {
        Ok(config_str) => parse(&config_str),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No config file at {}, using defaults", config_path);
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn parse(config_str: &str) -> Result<Config> {
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

impl Config {
    /// Applies `API_URL`, `HOST` and `PORT` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("API_URL").filter(|v| !v.trim().is_empty()) {
            debug!("API_URL overridden from environment");
            self.api.url = url.trim().to_string();
        }
        if let Some(host) = lookup("HOST").filter(|v| !v.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("Invalid PORT value: '{}'", port)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.url.trim().is_empty() {
            return Err(Error::config("api.url must not be empty"));
        }
        if self.image.max_dimension == 0 {
            return Err(Error::config("image.max_dimension must be greater than 0"));
        }
        if let Some(secs) = self.server.session_ttl_secs {
            crate::flow::session::ttl_from_secs(secs)?;
        }
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(Error::config(format!(
                "image.jpeg_quality must be between 1 and 100, got {}",
                self.image.jpeg_quality
            )));
        }
        Ok(())
    }
}
