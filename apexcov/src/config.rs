use relay::RelayConfig;
use relay::types::STATUS_OPTIONS;
use serde::Deserialize;
use std::fs::File;

#[derive(Deserialize, Debug)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

fn default_agents() -> Vec<String> {
    ["", "Lewis", "Brandon", "Kelly"]
        .iter()
        .map(|a| a.to_string())
        .collect()
}

fn default_statuses() -> Vec<String> {
    STATUS_OPTIONS.iter().map(|s| s.to_string()).collect()
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    /// Endpoint and shared secret for the webhook store. When omitted the
    /// deployment environment variables are used instead.
    pub relay: Option<RelayConfig>,
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}
