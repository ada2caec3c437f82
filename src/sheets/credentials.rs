use serde::Deserialize;
use std::path::PathBuf;

use super::StoreError;
use crate::config::{InlineCredentialFields, SheetsConfig, DEFAULT_KEY_FILE};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google service-account key, as found in the downloaded JSON key file.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Where the service-account key comes from. Inline fields win over a key
/// file, but only when all of them are present.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Inline(ServiceAccountKey),
    KeyFile(PathBuf),
}

impl CredentialSource {
    pub fn resolve(config: &SheetsConfig) -> Self {
        if let Some(key) = inline_key(&config.inline_credentials) {
            return CredentialSource::Inline(key);
        }
        let path = config
            .key_file
            .clone()
            .unwrap_or_else(|| DEFAULT_KEY_FILE.to_string());
        CredentialSource::KeyFile(PathBuf::from(path))
    }

    pub fn load(self) -> Result<ServiceAccountKey, StoreError> {
        match self {
            CredentialSource::Inline(key) => Ok(key),
            CredentialSource::KeyFile(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    StoreError::Credentials(format!("cannot read key file {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    StoreError::Credentials(format!("invalid key file {}: {}", path.display(), e))
                })
            }
        }
    }
}

fn inline_key(fields: &InlineCredentialFields) -> Option<ServiceAccountKey> {
    Some(ServiceAccountKey {
        key_type: fields.key_type.clone()?,
        project_id: fields.project_id.clone()?,
        private_key_id: fields.private_key_id.clone()?,
        // Env files usually carry the PEM with escaped newlines.
        private_key: fields.private_key.as_ref()?.replace("\\n", "\n"),
        client_email: fields.client_email.clone()?,
        client_id: fields.client_id.clone()?,
        token_uri: default_token_uri(),
    })
}
