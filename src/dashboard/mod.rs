//! Dashboard module
//!
//! Provides an overview page with the current month's totals, the latest
//! transactions and where the money went this month.

mod handlers;

pub use handlers::get_dashboard_page;
