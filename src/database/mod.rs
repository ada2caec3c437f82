pub mod record;
pub mod repository;
pub mod schema;

pub use record::{decode_rows, encode_row, HeaderMode, Record};
pub use repository::{LocatedRecord, Repository};
pub use schema::TableSchema;
