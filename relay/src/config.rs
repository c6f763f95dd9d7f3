use crate::client::RelayError;
use serde::Deserialize;

/// Endpoint and credential for the spreadsheet-backed webhook. Both values
/// are required; an empty string is treated the same as unset.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RelayConfig {
    pub url: String,
    pub secret: String,
}

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
}

impl RelayConfig {
    /// Reads the deployment environment variables the hosted site used,
    /// newest name first.
    pub fn from_env() -> Result<Self, RelayError> {
        let url = env_any(&[
            "APPSCRIPT_AGENT_URL",
            "APPSCRIPT_AGENT_WEBHOOK_URL",
            "APPSCRIPT_WEBHOOK_URL",
        ]);
        let secret = env_any(&["AGENT_SECRET", "AGENT_BACKEND_SECRET"]);

        match (url, secret) {
            (Some(url), Some(secret)) => Ok(RelayConfig { url, secret }),
            _ => Err(RelayError::ConfigurationMissing),
        }
    }
}
