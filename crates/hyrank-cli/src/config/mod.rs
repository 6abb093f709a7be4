//! Configuration loading for the hyrank binary.
//! Resolution order: `--config`, then the HYRANK_CONFIG env var, then
//! hyrank.toml in the working directory, then built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use tracing::{info, warn};

use hyrank_common::RankingConfig;

pub const CONFIG_ENV: &str = "HYRANK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "hyrank.toml";

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    WorkingDir(PathBuf),
    Defaults,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

/// Pick the configuration source. An explicit path (flag or env) is used
/// as-is; the working-directory file only when it exists.
pub fn resolve_source(
    flag: Option<&Path>,
    env_value: Option<String>,
    working_dir: &Path,
) -> ConfigSource {
    if let Some(p) = flag {
        return ConfigSource::Flag(p.to_path_buf());
    }
    if let Some(v) = env_value.filter(|v| !v.trim().is_empty()) {
        return ConfigSource::Env(PathBuf::from(v));
    }
    let local = working_dir.join(DEFAULT_CONFIG_FILE);
    if local.exists() {
        ConfigSource::WorkingDir(local)
    } else {
        ConfigSource::Defaults
    }
}

/// Load and validate the run configuration.
pub fn load(flag: Option<&Path>) -> anyhow::Result<(RankingConfig, ConfigSource)> {
    let cwd = std::env::current_dir().context("cannot read the working directory")?;
    let source = resolve_source(flag, std::env::var(CONFIG_ENV).ok(), &cwd);

    let config = match &source {
        ConfigSource::Flag(path) | ConfigSource::Env(path) | ConfigSource::WorkingDir(path) => {
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: {}\n\
                     Run `hyrank init-config` to write one with the defaults.",
                    path.display()
                );
            }
            let config = RankingConfig::load(path)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            info!(path = %path.display(), "Loaded configuration");
            config
        }
        ConfigSource::Defaults => {
            warn!(
                "No configuration found (--config, {CONFIG_ENV}, ./{DEFAULT_CONFIG_FILE}); using defaults"
            );
            RankingConfig::default()
        }
    };

    config.validate().context("invalid configuration")?;
    Ok((config, source))
}

/// Serialise a configuration in the requested format.
pub fn render(config: &RankingConfig, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Toml => config.to_toml()?,
        ConfigFormat::Yaml => config.to_yaml()?,
    })
}

#[cfg(test)]
mod tests;
