pub mod aggregator;
pub mod catalog;
pub mod export;
pub mod ledger;
pub mod sorter;

pub use aggregator::{aggregate, customer_breakdown, customer_type_history, sku_breakdown, summarize_customer_type};
pub use catalog::{candidate_for_sku, recall_price, search, search_with_limit, DEFAULT_SEARCH_LIMIT};
pub use ledger::InvoiceLedger;
pub use sorter::{sort_rows, Direction, Sortable, SortedTable};
