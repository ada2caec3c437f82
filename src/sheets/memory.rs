use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::range::{parse_range, SheetRange};
use super::{cell_text, StoreError, TabularStore, ValueInputOption};

/// In-process spreadsheet that behaves like the Sheets API for the calls the
/// adapters make: unknown sheets are a 400, reads omit trailing blanks, appends
/// land after the last populated row and row deletes shift later rows up.
#[derive(Default)]
pub struct MemoryStore {
    sheets: RwLock<Vec<MemorySheet>>,
}

#[derive(Debug, Clone)]
struct MemorySheet {
    id: i64,
    title: String,
    rows: Vec<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already contains the given sheets, all empty.
    pub async fn with_sheets(titles: &[&str]) -> Self {
        let store = Self::new();
        for title in titles {
            // A fresh store cannot hold duplicates.
            let _ = store.add_sheet(title).await;
        }
        store
    }

    /// Raw grid of a sheet, for assertions.
    pub async fn snapshot(&self, title: &str) -> Option<Vec<Vec<String>>> {
        let sheets = self.sheets.read().await;
        sheets.iter().find(|s| s.title == title).map(|s| s.rows.clone())
    }
}

fn unknown_range(range: &str) -> StoreError {
    StoreError::Api {
        status: 400,
        message: format!("Unable to parse range: {}", range),
    }
}

fn find_sheet<'a>(sheets: &'a mut [MemorySheet], range: &SheetRange, raw: &str) -> Result<&'a mut MemorySheet, StoreError> {
    sheets
        .iter_mut()
        .find(|s| s.title == range.sheet)
        .ok_or_else(|| unknown_range(raw))
}

fn row_is_blank(row: &[String], range: &SheetRange) -> bool {
    row.iter()
        .enumerate()
        .filter(|(col, _)| *col >= range.start_col && *col <= range.end_col)
        .all(|(_, cell)| cell.is_empty())
}

fn write_cells(rows: &mut Vec<Vec<String>>, row_index: usize, start_col: usize, values: &[Value]) {
    if rows.len() <= row_index {
        rows.resize(row_index + 1, Vec::new());
    }
    let row = &mut rows[row_index];
    if row.len() < start_col + values.len() {
        row.resize(start_col + values.len(), String::new());
    }
    for (offset, value) in values.iter().enumerate() {
        row[start_col + offset] = cell_text(value);
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let parsed = parse_range(range)?;
        let sheets = self.sheets.read().await;
        let sheet = sheets
            .iter()
            .find(|s| s.title == parsed.sheet)
            .ok_or_else(|| unknown_range(range))?;

        let first = parsed.start_row.unwrap_or(1) - 1;
        let last = parsed.end_row.unwrap_or(sheet.rows.len()).min(sheet.rows.len());

        let mut out: Vec<Vec<String>> = (first..last)
            .map(|i| {
                let mut cells: Vec<String> = sheet.rows[i]
                    .iter()
                    .skip(parsed.start_col)
                    .take(parsed.end_col - parsed.start_col + 1)
                    .cloned()
                    .collect();
                while cells.last().is_some_and(|c| c.is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }
        Ok(out)
    }

    async fn append_row(&self, range: &str, row: Vec<Value>) -> Result<(), StoreError> {
        let parsed = parse_range(range)?;
        let mut sheets = self.sheets.write().await;
        let sheet = find_sheet(&mut sheets, &parsed, range)?;

        let next = sheet
            .rows
            .iter()
            .rposition(|r| !row_is_blank(r, &parsed))
            .map_or(0, |i| i + 1);
        sheet.rows.insert(next.min(sheet.rows.len()), Vec::new());
        write_cells(&mut sheet.rows, next, parsed.start_col, &row);
        Ok(())
    }

    async fn update_values(
        &self,
        range: &str,
        rows: Vec<Vec<Value>>,
        _input: ValueInputOption,
    ) -> Result<(), StoreError> {
        let parsed = parse_range(range)?;
        let mut sheets = self.sheets.write().await;
        let sheet = find_sheet(&mut sheets, &parsed, range)?;

        let top = parsed.start_row.unwrap_or(1) - 1;
        for (offset, values) in rows.iter().enumerate() {
            write_cells(&mut sheet.rows, top + offset, parsed.start_col, values);
        }
        Ok(())
    }

    async fn sheet_id(&self, title: &str) -> Result<Option<i64>, StoreError> {
        let sheets = self.sheets.read().await;
        Ok(sheets.iter().find(|s| s.title == title).map(|s| s.id))
    }

    async fn delete_rows(&self, sheet_id: i64, start_index: usize, end_index: usize) -> Result<(), StoreError> {
        let mut sheets = self.sheets.write().await;
        let sheet = sheets
            .iter_mut()
            .find(|s| s.id == sheet_id)
            .ok_or_else(|| StoreError::Api {
                status: 400,
                message: format!("No grid with id: {}", sheet_id),
            })?;

        let end = end_index.min(sheet.rows.len());
        if start_index < end {
            sheet.rows.drain(start_index..end);
        }
        Ok(())
    }

    async fn add_sheet(&self, title: &str) -> Result<i64, StoreError> {
        let mut sheets = self.sheets.write().await;
        if sheets.iter().any(|s| s.title == title) {
            return Err(StoreError::Api {
                status: 400,
                message: format!("A sheet with the name \"{}\" already exists", title),
            });
        }
        let id = sheets.iter().map(|s| s.id + 1).max().unwrap_or(0);
        sheets.push(MemorySheet {
            id,
            title: title.to_string(),
            rows: Vec::new(),
        });
        Ok(id)
    }
}
