//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use storefront_commerce::EngineConfig;

use crate::output::Output;

/// Environment variable naming the engine config file.
pub const CONFIG_ENV: &str = "STOREFRONT_CONFIG";

/// Execution context for CLI commands.
pub struct Context {
    /// Engine configuration.
    pub config: EngineConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context, reading the config from `--config`, then
    /// `$STOREFRONT_CONFIG`, then a `storefront.toml` found upwards from the
    /// working directory.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let explicit = config_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok());

        let config = match explicit {
            Some(path) => EngineConfig::load(&path)
                .with_context(|| format!("Failed to load config: {}", path))?,
            None => Self::find_config(&cwd).unwrap_or_default(),
        };
        tracing::debug!(?config, "engine config loaded");

        Ok(Self { config, output, cwd })
    }

    /// Find config file in directory tree. Files that fail to parse are
    /// logged and skipped.
    fn find_config(start: &Path) -> Option<EngineConfig> {
        let config_names = ["storefront.toml", ".storefront.toml"];

        let mut current = start.to_path_buf();
        loop {
            for name in &config_names {
                let config_path = current.join(name);
                if config_path.exists() {
                    match EngineConfig::load(&config_path) {
                        Ok(config) => return Some(config),
                        Err(e) => tracing::warn!(
                            path = %config_path.display(),
                            error = %e,
                            "ignoring unreadable config file"
                        ),
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
