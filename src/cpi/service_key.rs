//! CPI service key - the credential bundle of a tenant

use crate::steps::StepError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Service key as downloaded from the BTP cockpit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceKey {
    pub oauth: OAuth,
}

/// OAuth section of a service key
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth {
    /// Tenant API host
    #[serde(rename = "url")]
    pub host: String,

    #[serde(rename = "tokenurl")]
    pub token_url: String,

    #[serde(rename = "clientid")]
    pub client_id: String,

    #[serde(rename = "clientsecret")]
    pub client_secret: String,
}

impl fmt::Debug for OAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth")
            .field("host", &self.host)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

impl ServiceKey {
    /// Parse a service key from its JSON text
    pub fn from_json(json: &str) -> Result<Self, StepError> {
        let mut key: ServiceKey = serde_json::from_str(json)
            .map_err(|e| StepError::ServiceKey(format!("error unmarshalling serviceKey: {}", e)))?;

        key.oauth.host = key.oauth.host.trim_end_matches('/').to_string();
        key.oauth.token_url = key.oauth.token_url.trim_end_matches('/').to_string();

        for (field, value) in [
            ("url", &key.oauth.host),
            ("tokenurl", &key.oauth.token_url),
            ("clientid", &key.oauth.client_id),
        ] {
            if value.trim().is_empty() {
                return Err(StepError::ServiceKey(format!("field oauth.{} is empty", field)));
            }
        }

        info!("CPI serviceKey read successfully");
        Ok(key)
    }

    /// Load a service key given either inline JSON or a path to a JSON file
    pub fn load(source: &str) -> Result<Self, StepError> {
        if source.trim_start().starts_with('{') {
            return Self::from_json(source);
        }

        let path = Path::new(source.trim());
        let content = std::fs::read_to_string(path).map_err(|e| StepError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content)
    }
}

/// Where a service key comes from: inline JSON or a file path
///
/// `Debug` redacts inline JSON so options can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceKeySource(String);

impl ServiceKeySource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn is_inline(&self) -> bool {
        self.0.trim_start().starts_with('{')
    }

    pub fn load(&self) -> Result<ServiceKey, StepError> {
        ServiceKey::load(&self.0)
    }
}

impl fmt::Debug for ServiceKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inline() {
            f.write_str("ServiceKeySource(<inline>)")
        } else {
            f.debug_tuple("ServiceKeySource").field(&self.0).finish()
        }
    }
}
