//! Transport to the remote tabular store.
//!
//! `TabularStore` is the row-oriented surface the table adapters speak: read a
//! range, append a row, overwrite a span, resolve a sheet id and delete rows.
//! `GoogleSheetsClient` talks to the Sheets REST API; `MemoryStore` mimics its
//! behavior in process.

pub mod credentials;
pub mod google;
pub mod manager;
pub mod memory;
pub mod range;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use credentials::{CredentialSource, ServiceAccountKey};
pub use google::GoogleSheetsClient;
pub use manager::StoreManager;
pub use memory::MemoryStore;

/// Errors surfaced by the store transport
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store credentials unavailable: {0}")]
    Credentials(String),

    #[error("store authentication failed: {0}")]
    Auth(String),

    #[error("invalid store endpoint: {0}")]
    Endpoint(String),

    #[error("store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("row position {0} is not a data row")]
    InvalidPosition(usize),

    #[error("unexpected store response: {0}")]
    Decode(String),

    #[error(transparent)]
    Range(#[from] range::RangeError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl StoreError {
    /// The store's way of saying the addressed range/sheet does not exist yet.
    pub fn is_missing_range(&self) -> bool {
        matches!(self, StoreError::Api { status: 400 | 404, .. })
    }
}

/// How the store interprets written values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputOption {
    /// Stored exactly as given.
    Raw,
    /// Parsed as if typed into the UI (numbers, dates, formulas).
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// Row-oriented operations against a spreadsheet-like store.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Every populated row within `range`, each as its cells' text.
    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError>;

    /// Insert `row` after the last populated row of the table within `range`.
    async fn append_row(&self, range: &str, row: Vec<Value>) -> Result<(), StoreError>;

    /// Overwrite the cells starting at the top-left of `range`.
    async fn update_values(
        &self,
        range: &str,
        rows: Vec<Vec<Value>>,
        input: ValueInputOption,
    ) -> Result<(), StoreError>;

    /// Internal numeric id of the sheet titled `title`, if it exists.
    async fn sheet_id(&self, title: &str) -> Result<Option<i64>, StoreError>;

    /// Structurally remove rows `[start_index, end_index)` (0-based), shifting later rows up.
    async fn delete_rows(&self, sheet_id: i64, start_index: usize, end_index: usize) -> Result<(), StoreError>;

    /// Create an empty sheet and return its id.
    async fn add_sheet(&self, title: &str) -> Result<i64, StoreError>;
}

/// Text a cell holds after `value` is written to it.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
