use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigInputError {
    #[error("please enter the server URL")]
    EmptyServerUrl,
    #[error("please enter the client token")]
    EmptyClientToken,
}

/// Connection settings persisted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub client_token: String,
}

impl ConnectionConfig {
    /// Builds a record from raw form input, trimming both fields.
    pub fn from_input(server_url: &str, client_token: &str) -> Result<Self, ConfigInputError> {
        let server_url = server_url.trim();
        let client_token = client_token.trim();
        if server_url.is_empty() {
            return Err(ConfigInputError::EmptyServerUrl);
        }
        if client_token.is_empty() {
            return Err(ConfigInputError::EmptyClientToken);
        }
        Ok(Self {
            server_url: server_url.to_string(),
            client_token: client_token.to_string(),
        })
    }

    /// Arguments for the host's `save_config` command.
    #[must_use]
    pub fn save_args(&self) -> Value {
        json!({
            "serverUrl": self.server_url,
            "clientToken": self.client_token,
        })
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.server_url.trim().is_empty() && self.client_token.trim().is_empty()
    }
}

/// Decodes a `get_config` result. `null` and records with both fields blank
/// count as "nothing saved".
pub fn decode_saved_config(value: Value) -> Result<Option<ConnectionConfig>, serde_json::Error> {
    let config: Option<ConnectionConfig> = serde_json::from_value(value)?;
    Ok(config.filter(|config| !config.is_blank()))
}
