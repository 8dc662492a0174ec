use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::nist;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub leapsecs: LeapConfig,
}

/// Where to get a fresh leap second table from.
#[derive(Debug, Deserialize, Clone)]
pub struct LeapConfig {
    /// URLs tried in order until one succeeds
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// bound on each transfer
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// whether to fetch at startup at all
    #[serde(default = "default_refresh")]
    pub refresh: bool,
    /// local copy, read before the network and rewritten after a fetch
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_sources() -> Vec<String> {
    [nist::IANA_URL, nist::IERS_URL, nist::NIST_URL]
        .iter()
        .map(|url| url.to_string())
        .collect()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_refresh() -> bool {
    true
}

impl Default for LeapConfig {
    fn default() -> Self {
        LeapConfig {
            sources: default_sources(),
            timeout_secs: default_timeout_secs(),
            refresh: default_refresh(),
            file: None,
        }
    }
}

impl LeapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Config::parse(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }
}
