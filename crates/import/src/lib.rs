pub mod bai2;
pub mod export;
pub mod match_engine;
pub mod rows;
pub(crate) mod util;

pub use bai2::{
    AccountRecord, Bai2Error, Bai2Parser, BalanceEntry, FileRecord, GroupRecord, InheritedContext,
    TransactionRecord,
};
pub use export::ExportError;
pub use match_engine::{filter_unprocessed, InvoiceMatchEngine, MatchedRow, RowKey};
pub use rows::{balance_rows, transaction_rows, BalanceRow, ExportProfile, TransactionRow};
