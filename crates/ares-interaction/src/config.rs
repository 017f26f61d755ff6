//! Generation engine configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which engine variant to start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EngineKind {
    #[default]
    Mock,
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    pub base_url: String,
    pub model: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "phi3.5".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteEndpointConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for RemoteEndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            request_timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for RemoteEndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEndpointConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub local: LocalModelConfig,
    pub remote: RemoteEndpointConfig,
}
