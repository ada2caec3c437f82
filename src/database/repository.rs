use std::sync::Arc;
use tracing::{debug, info, warn};

use serde_json::Value;

use super::record::{decode_row, decode_rows, encode_by_header, encode_row, header_index, HeaderMode, Record};
use super::schema::TableSchema;
use crate::sheets::{range, StoreError, StoreManager, ValueInputOption};

/// A record together with the physical row it was read from. The position is
/// only valid until the next structural delete on the same table.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedRecord {
    pub position: usize,
    pub record: Record,
}

/// Record-level CRUD over one sheet. Every call is a fresh round trip; nothing
/// is cached between calls.
#[derive(Clone)]
pub struct Repository {
    schema: TableSchema,
    stores: Arc<StoreManager>,
    header_mode: HeaderMode,
}

/// Row 1 holds the header; data starts at row 2.
pub const FIRST_DATA_ROW: usize = 2;

impl Repository {
    pub fn new(schema: TableSchema, stores: Arc<StoreManager>, header_mode: HeaderMode) -> Self {
        Self {
            schema,
            stores,
            header_mode,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Range reads and appends go through. Trusting the header means columns
    /// may sit anywhere in the sheet, so the whole sheet is read.
    fn read_range(&self) -> String {
        match self.header_mode {
            HeaderMode::TrustDeclaredOrder => self.schema.range(),
            HeaderMode::TrustHeader => self.schema.sheet_range(),
        }
    }

    /// Raw rows of the table; a range the store reports as missing reads as empty.
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let store = self.stores.store()?;
        match store.get_values(&self.read_range()).await {
            Ok(rows) => Ok(rows),
            Err(e) if e.is_missing_range() => {
                debug!("Table '{}' not provisioned yet: {}", self.schema.name, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Writes the header row when the table has no rows at all, creating the
    /// sheet first if the store does not know it. Existing headers are left as
    /// they are. Returns whether a header was written.
    pub async fn initialize(&self) -> Result<bool, StoreError> {
        let store = self.stores.store()?;
        let rows = match store.get_values(&self.schema.range()).await {
            Ok(rows) => rows,
            Err(e) if e.is_missing_range() => {
                info!("Creating sheet '{}'", self.schema.name);
                store.add_sheet(self.schema.name).await?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if !rows.is_empty() {
            debug!("Table '{}' already has a header", self.schema.name);
            return Ok(false);
        }

        let header = self
            .schema
            .columns
            .iter()
            .map(|c| serde_json::Value::String(c.to_string()))
            .collect();
        store
            .update_values(&self.schema.header_anchor(), vec![header], ValueInputOption::Raw)
            .await?;
        info!("Wrote header for table '{}'", self.schema.name);
        Ok(true)
    }

    /// Every record in physical order.
    pub async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        let rows = self.fetch_rows().await?;
        Ok(decode_rows(&rows, self.schema.columns, self.header_mode))
    }

    /// Cells to write for `record`. Under `TrustHeader` the row is laid out by
    /// the sheet's current header, keeping the existing cells of `position`
    /// under columns the table does not register. Without a header the
    /// declared order is used.
    async fn encode_for_write(&self, record: &Record, position: Option<usize>) -> Result<Vec<Value>, StoreError> {
        if self.header_mode == HeaderMode::TrustDeclaredOrder {
            return Ok(encode_row(record, self.schema.columns));
        }

        let rows = self.fetch_rows().await?;
        let Some(header) = rows.first().filter(|h| !h.is_empty()) else {
            return Ok(encode_row(record, self.schema.columns));
        };
        let missing: Vec<&str> = self
            .schema
            .columns
            .iter()
            .copied()
            .filter(|c| header_index(header, c).is_none())
            .collect();
        if !missing.is_empty() {
            warn!("Table '{}' header lacks {:?}; those fields are not written", self.schema.name, missing);
        }

        let base = position
            .and_then(|p| rows.get(p - 1))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(encode_by_header(record, header, base, self.schema.columns))
    }

    /// Appends `record` after the last populated row.
    pub async fn append(&self, record: &Record) -> Result<(), StoreError> {
        let row = self.encode_for_write(record, None).await?;
        let store = self.stores.store()?;
        store.append_row(&self.read_range(), row).await
    }

    /// First record whose `id_column` matches `target_id` (both trimmed), with
    /// its 1-based row position. A header without `id_column` finds nothing.
    pub async fn find_by_id(&self, id_column: &str, target_id: &str) -> Result<Option<LocatedRecord>, StoreError> {
        let rows = self.fetch_rows().await?;
        if rows.len() < FIRST_DATA_ROW {
            return Ok(None);
        }

        let (header, data) = rows.split_at(1);
        let header = &header[0];
        let Some(id_index) = header_index(header, id_column) else {
            warn!("Table '{}' header has no '{}' column", self.schema.name, id_column);
            return Ok(None);
        };

        let target = target_id.trim();
        let found = data.iter().enumerate().find(|(_, row)| {
            row.get(id_index).map(|cell| cell.trim()).unwrap_or("") == target
        });

        Ok(found.map(|(index, row)| LocatedRecord {
            position: index + FIRST_DATA_ROW,
            record: decode_row(header, row, self.schema.columns, self.header_mode),
        }))
    }

    /// Overwrites the whole row at `position` with `record`.
    pub async fn update_at(&self, position: usize, record: &Record) -> Result<(), StoreError> {
        if position < FIRST_DATA_ROW {
            return Err(StoreError::InvalidPosition(position));
        }
        let row = self.encode_for_write(record, Some(position)).await?;
        let store = self.stores.store()?;
        let target = range::row_span(self.schema.name, position, row.len());
        store
            .update_values(&target, vec![row], ValueInputOption::UserEntered)
            .await
    }

    /// Structurally deletes the row at `position`; every later row moves up one.
    pub async fn delete_at(&self, position: usize) -> Result<(), StoreError> {
        if position < FIRST_DATA_ROW {
            return Err(StoreError::InvalidPosition(position));
        }
        let store = self.stores.store()?;
        let sheet_id = store
            .sheet_id(self.schema.name)
            .await?
            .ok_or_else(|| StoreError::SheetNotFound(self.schema.name.to_string()))?;
        store.delete_rows(sheet_id, position - 1, position).await
    }
}
