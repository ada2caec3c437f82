pub mod user_service;
pub mod worklog_service;

pub use user_service::{PublicUser, Session, UserService};
pub use worklog_service::WorklogService;

use crate::auth::JwtError;
use crate::sheets::StoreError;

/// Domain outcomes of the resource services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl ServiceError {
    pub fn missing_fields(message: impl Into<String>, fields: Vec<&'static str>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            fields,
        }
    }
}

/// True when a JSON input value counts as "not provided": absent, null,
/// empty string, `false` or zero.
pub(crate) fn is_blank(value: Option<&serde_json::Value>) -> bool {
    use serde_json::Value;
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}
