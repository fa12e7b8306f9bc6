pub mod api;
pub mod config;
pub mod models;
pub mod service;
pub mod store;
pub mod utils;

pub use config::AppConfig;
pub use service::InvoiceLedger;
pub use store::{load_records, RecordStore};
