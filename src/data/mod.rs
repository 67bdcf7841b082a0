//! Data module - table loading and record extraction

mod loader;
mod records;

pub use loader::{DataLoader, SUPPORTED_EXTENSIONS};
pub use records::{ColumnMapping, PathwayRecord, RecordExtractor};
