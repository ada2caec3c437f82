use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// How data rows are matched to the registered columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderMode {
    /// Zip each row positionally against the registered column list,
    /// ignoring whatever the sheet's header row says.
    #[default]
    TrustDeclaredOrder,
    /// Read and write each registered column at the index it occupies in the
    /// sheet's header row; columns the header lacks decode as "" and are not
    /// written.
    TrustHeader,
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust-declared-order" | "declared" => Ok(HeaderMode::TrustDeclaredOrder),
            "trust-header" | "header" => Ok(HeaderMode::TrustHeader),
            other => Err(format!("Unknown header mode '{}'", other)),
        }
    }
}

/// A keyed view of one data row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field rendered as text; missing and null read as "".
    pub fn text(&self, key: &str) -> String {
        self.fields.get(key).map(crate::sheets::cell_text).unwrap_or_default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Overlay every field of `changes` onto this record.
    pub fn merge(&mut self, changes: Map<String, Value>) -> &mut Self {
        for (key, value) in changes {
            self.fields.insert(key, value);
        }
        self
    }

    /// Copy restricted to `columns`, missing ones filled with "".
    pub fn project(&self, columns: &[&str]) -> Record {
        let mut out = Record::new();
        for column in columns {
            let value = match self.fields.get(*column) {
                None | Some(Value::Null) => Value::String(String::new()),
                Some(v) => v.clone(),
            };
            out.set(*column, value);
        }
        out
    }
}

/// Decodes raw store rows (header first) into records keyed by `columns`.
/// No rows at all decodes to no records.
pub fn decode_rows(raw_rows: &[Vec<String>], columns: &[&str], mode: HeaderMode) -> Vec<Record> {
    let Some((header, data)) = raw_rows.split_first() else {
        return Vec::new();
    };
    data.iter()
        .map(|row| decode_row(header, row, columns, mode))
        .collect()
}

/// Decodes one data row. Cells past the end of a short row read as "".
pub fn decode_row(header: &[String], row: &[String], columns: &[&str], mode: HeaderMode) -> Record {
    let mut record = Record::new();
    for (position, column) in columns.iter().enumerate() {
        let index = match mode {
            HeaderMode::TrustDeclaredOrder => Some(position),
            HeaderMode::TrustHeader => header_index(header, column),
        };
        let cell = index.and_then(|i| row.get(i)).cloned().unwrap_or_default();
        record.set(*column, cell);
    }
    record
}

/// Index of `column` in a header row. Header cells are compared trimmed.
pub fn header_index(header: &[String], column: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == column)
}

fn cell_value(record: &Record, column: &str) -> Value {
    match record.get(column) {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(value) => value.clone(),
    }
}

/// Encodes `record` in `columns` order. Missing or null fields become "";
/// fields outside `columns` are dropped.
pub fn encode_row(record: &Record, columns: &[&str]) -> Vec<Value> {
    columns.iter().map(|column| cell_value(record, column)).collect()
}

/// Encodes `record` as a row as wide as `header`, each registered column at
/// the index the header gives it. Cells under unregistered header columns keep
/// their value from `base`; registered columns the header lacks are not written.
pub fn encode_by_header(record: &Record, header: &[String], base: &[String], columns: &[&str]) -> Vec<Value> {
    let mut row: Vec<Value> = (0..header.len())
        .map(|i| Value::String(base.get(i).cloned().unwrap_or_default()))
        .collect();
    for column in columns {
        if let Some(index) = header_index(header, column) {
            row[index] = cell_value(record, column);
        }
    }
    row
}
