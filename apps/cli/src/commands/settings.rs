//! `billwise config show | init`

use std::path::PathBuf;

use crate::config::{AppConfig, ConfigError};
use crate::error::{ApiError, ApiResult};

/// Prints the effective configuration (file plus environment) as TOML.
pub fn show(config: &AppConfig) -> ApiResult<()> {
    println!("{}", render(config)?);
    Ok(())
}

pub fn render(config: &AppConfig) -> ApiResult<String> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::from(e).into())
}

/// Writes a default config file, refusing to overwrite one unless `force`.
pub fn init(path: Option<PathBuf>, force: bool) -> ApiResult<PathBuf> {
    let path = path
        .or_else(AppConfig::default_config_path)
        .ok_or(ConfigError::NoPath)?;

    if path.exists() && !force {
        return Err(ApiError::invalid_input(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    AppConfig::default().save(Some(path.clone()))?;
    println!("✅ Wrote {}", path.display());
    Ok(path)
}
