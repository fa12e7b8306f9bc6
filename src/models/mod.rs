pub mod invoice;
pub mod record;
pub mod report;

pub use invoice::{CandidateProduct, InvoiceHeader, InvoiceSnapshot, InvoiceTotals, LineItem};
pub use record::{RecordMonth, TransactionRecord};
pub use report::{AggregateRow, Dimension, Reduction, SkuOption, SummaryRow};
