//! Transactions: the money that moved, when, and under which category.

mod core;
mod create;
mod delete;
mod details;
mod edit;
mod form;
mod list;
mod query;

pub use core::{
    Transaction, TransactionBuilder, UpdateOutcome, create_transaction, create_transaction_table,
    delete_transaction, get_transaction, update_transaction,
};
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use delete::delete_transaction_endpoint;
pub use details::get_transaction_page;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use list::get_transactions_page;
pub use query::{
    ReportTransaction, get_all_transactions, get_recent_transactions,
    get_transaction_with_category, get_transactions_in_range,
};

pub(crate) use list::signed_amount_view;
