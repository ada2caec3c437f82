use crate::sheets::range;

/// Static description of one logical table: its sheet and ordered columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const USERS: TableSchema = TableSchema {
    name: "users",
    columns: &["id", "username", "password", "display_name"],
};

pub const WORKLOGS: TableSchema = TableSchema {
    name: "worklogs",
    columns: &["id", "user_id", "date", "duration_hours", "reason", "notes"],
};

/// Every table the service provisions at startup.
pub const REGISTRY: &[TableSchema] = &[USERS, WORKLOGS];

impl TableSchema {
    /// Registered columns only, `'<name>'!A:<last>`.
    pub fn range(&self) -> String {
        range::column_span(self.name, self.columns.len())
    }

    /// The whole sheet, for reads that must see columns beyond the registered ones.
    pub fn sheet_range(&self) -> String {
        range::whole_sheet(self.name)
    }

    pub fn header_anchor(&self) -> String {
        range::first_cell(self.name)
    }
}
