//! Transaction management for the finance dashboard.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the database functions for storing it
//! - The form used to create and edit transactions
//! - Route handlers for listing, reading, creating, editing and deleting transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;

pub use core::{Transaction, create_transaction_table, get_transactions_for_user};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::{get_transaction_endpoint, get_transactions_endpoint};

#[cfg(test)]
pub use core::{count_transactions, create_transaction};
