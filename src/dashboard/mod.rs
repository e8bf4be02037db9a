//! Dashboard module
//!
//! Summarises a user's month: balance, budget progress, a daily spending cap,
//! the latest transactions and a week of expenses for charting.

mod handlers;
mod summary;

pub use handlers::get_dashboard_endpoint;
