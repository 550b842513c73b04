use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pgm_maps_github::GitHubFetcherConfig;
use serde::Deserialize;

/// Settings file looked up in the working directory when `--settings` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "pgm-maps.toml";

/// Optional settings read from `pgm-maps.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub sources_file: PathBuf,
    pub out_dir: PathBuf,
    pub api_base_url: Option<String>,
    pub raw_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources_file: PathBuf::from("sources.json"),
            out_dir: PathBuf::from("Maps"),
            api_base_url: None,
            raw_base_url: None,
        }
    }
}

impl Settings {
    /// Load settings. An explicitly requested file must exist; the default
    /// file falls back to built-in defaults when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse settings file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, sources: Option<PathBuf>, out_dir: Option<PathBuf>) -> Self {
        if let Some(sources) = sources {
            self.sources_file = sources;
        }
        if let Some(out_dir) = out_dir {
            self.out_dir = out_dir;
        }
        self
    }

    pub fn fetcher_config(&self, token: Option<String>) -> GitHubFetcherConfig {
        GitHubFetcherConfig {
            token,
            api_base_url: self.api_base_url.clone(),
            raw_base_url: self.raw_base_url.clone(),
        }
    }
}
