use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::database::record::HeaderMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub sheets: SheetsConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

/// Which transport backs the table adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Google,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub backend: StoreBackend,
    pub spreadsheet_id: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub header_mode: HeaderMode,
    /// Explicit key file path; falls back to `DEFAULT_KEY_FILE` when unset.
    pub key_file: Option<String>,
    #[serde(skip)]
    pub inline_credentials: InlineCredentialFields,
}

/// Raw `GOOGLE_SA_*` values. Only usable when every field is present.
#[derive(Clone, Default)]
pub struct InlineCredentialFields {
    pub key_type: Option<String>,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: Option<String>,
    pub client_email: Option<String>,
    pub client_id: Option<String>,
}

impl std::fmt::Debug for InlineCredentialFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineCredentialFields")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Token lifetime as written in the environment, e.g. `365d` or `12h`.
    pub jwt_expires_in: String,
}

pub const DEFAULT_SPREADSHEET_ID: &str = "1MeCb_ClcxP-H_e6vYid49l-ayRd0cF-TE_StXRO9dnM";
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_KEY_FILE: &str = "service-account.json";
pub const DEFAULT_JWT_SECRET: &str = "change-me-secret";
pub const DEFAULT_JWT_EXPIRES_IN: &str = "365d";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Sheets overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.sheets.backend = match v.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "google" | "sheets" => StoreBackend::Google,
                other => {
                    tracing::warn!("Unknown STORE_BACKEND '{}', keeping {:?}", other, self.sheets.backend);
                    self.sheets.backend
                }
            };
        }
        if let Ok(v) = env::var("GOOGLE_SHEET_ID") {
            if !v.is_empty() {
                self.sheets.spreadsheet_id = v;
            }
        }
        if let Ok(v) = env::var("SHEETS_API_BASE_URL") {
            self.sheets.api_base_url = v;
        }
        if let Ok(v) = env::var("SHEETS_REQUEST_TIMEOUT_SECS") {
            self.sheets.request_timeout_secs = v.parse().unwrap_or(self.sheets.request_timeout_secs);
        }
        if let Ok(v) = env::var("SHEETS_HEADER_MODE") {
            match v.parse() {
                Ok(mode) => self.sheets.header_mode = mode,
                Err(e) => tracing::warn!("{}, keeping {:?}", e, self.sheets.header_mode),
            }
        }
        self.sheets.key_file = non_empty_var("GOOGLE_APPLICATION_CREDENTIALS");
        self.sheets.inline_credentials = InlineCredentialFields {
            key_type: non_empty_var("GOOGLE_SA_TYPE"),
            project_id: non_empty_var("GOOGLE_SA_PROJECT_ID"),
            private_key_id: non_empty_var("GOOGLE_SA_PRIVATE_KEY_ID"),
            private_key: non_empty_var("GOOGLE_SA_PRIVATE_KEY"),
            client_email: non_empty_var("GOOGLE_SA_CLIENT_EMAIL"),
            client_id: non_empty_var("GOOGLE_SA_CLIENT_ID"),
        };

        // Security overrides
        if let Some(v) = non_empty_var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = non_empty_var("JWT_EXPIRES_IN") {
            self.security.jwt_expires_in = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            sheets: SheetsConfig::defaults(30),
            security: SecurityConfig::defaults(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            sheets: SheetsConfig::defaults(20),
            security: SecurityConfig::defaults(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            sheets: SheetsConfig::defaults(15),
            security: SecurityConfig::defaults(),
        }
    }
}

impl SheetsConfig {
    fn defaults(request_timeout_secs: u64) -> Self {
        Self {
            backend: StoreBackend::Google,
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            api_base_url: DEFAULT_SHEETS_API_BASE_URL.to_string(),
            request_timeout_secs,
            header_mode: HeaderMode::TrustDeclaredOrder,
            key_file: None,
            inline_credentials: InlineCredentialFields::default(),
        }
    }

    /// In-memory backend with otherwise default settings.
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Self::defaults(30)
        }
    }
}

impl SecurityConfig {
    fn defaults() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expires_in: DEFAULT_JWT_EXPIRES_IN.to_string(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
