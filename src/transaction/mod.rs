//! Income and expense transactions, and the endpoints for managing them.

mod amount;
mod core;
mod create;
mod delete;
mod edit;
mod list;
mod payload;
mod query;

pub use amount::Amount;
pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionType, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, update_transaction,
};
pub(crate) use core::map_transaction_row;
pub use create::create_transaction_endpoint;
pub use delete::delete_transaction_endpoint;
pub use edit::{partial_update_transaction_endpoint, update_transaction_endpoint};
pub use list::{
    get_transaction_endpoint, list_transaction_months_endpoint, list_transactions_endpoint,
};
pub use payload::parse_transaction_payload;
pub use query::{TransactionQueryParams, query_transaction_months, query_transactions};
