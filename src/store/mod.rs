pub mod loader;
pub mod records;

pub use loader::{load_records, records_from_reader, StoreError};
pub use records::{sku_options, RecordStore};
