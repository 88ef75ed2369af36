//! Expense Tracker is a web app for recording income and expenses against
//! categories and viewing monthly, yearly and per-category reports.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod report;
mod routing;
mod seed;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::{Category, CategoryKind, CategoryTitle, NewCategory};
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use report::{
    CategoryTotal, DAILY_SERIES_DAYS, DailyTotal, MonthTotal, PeriodSummary, ReportTransaction,
    TREND_MONTHS, TrendPoint, YearlyRollup, category_breakdown, daily_series, long_month_label,
    month_label, month_window, monthly_summary, short_month_label, summarise, trailing_trend,
    trend_window, yearly_rollup,
};
pub use routing::build_router;
pub use seed::seed_database;
pub use timezone::{get_local_offset, local_now};
pub use transaction::{Transaction, TransactionBuilder, UpdateOutcome};

use crate::{
    alert::Alert, html::error_view, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An empty string was used to create a category title.
    #[error("Category title cannot be empty")]
    EmptyCategoryTitle,

    /// A string could not be parsed as either "Income" or "Expense".
    #[error("\"{0}\" is not a valid category type, expected \"Income\" or \"Expense\"")]
    InvalidCategoryKind(String),

    /// The category ID used to create or update a transaction did not match a
    /// valid category.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// Tried to delete a category that transactions still refer to.
    ///
    /// The caller should delete or move the transactions first.
    #[error("the category is used by {0} transaction(s)")]
    CategoryInUse(u32),

    /// Tried to change the type of a category that transactions refer to.
    ///
    /// Changing the type would silently move those transactions between
    /// income and expenses in every report.
    #[error("the type of a category cannot be changed once transactions use it")]
    CategoryKindLocked,

    /// An amount from a form was not a decimal number from zero to one trillion
    /// with at most two decimal places.
    #[error(
        "\"{0}\" is not a valid amount, expected a number from 0 to 1,000,000,000,000 \
        with at most two decimal places"
    )]
    InvalidAmount(String),

    /// A date-time string from a form could not be parsed.
    #[error("could not parse \"{0}\" as a date and time")]
    InvalidTimestamp(String),

    /// The year or month requested for a report is out of range.
    #[error("invalid report period: {0}")]
    InvalidReportPeriod(String),

    /// The transaction was changed by someone else between loading the edit
    /// form and saving it.
    #[error("the transaction was modified by another request")]
    TransactionConflict,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::InvalidReportPeriod(reason) => (
                StatusCode::BAD_REQUEST,
                error_view("Bad Request", "400", "Invalid Report Period", &reason),
            )
                .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// The HTTP status code that an alert for this error should be sent with.
    fn alert_status_code(&self) -> StatusCode {
        match self {
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory => StatusCode::NOT_FOUND,
            Error::TransactionConflict | Error::CategoryInUse(_) | Error::CategoryKindLocked => {
                StatusCode::CONFLICT
            }
            Error::EmptyCategoryTitle
            | Error::InvalidCategoryKind(_)
            | Error::InvalidCategory(_)
            | Error::InvalidAmount(_)
            | Error::InvalidTimestamp(_)
            | Error::InvalidReportPeriod(_) => StatusCode::BAD_REQUEST,
            Error::SqlError(_) | Error::InvalidTimezoneError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn into_alert_response(self) -> Response {
        let status_code = self.alert_status_code();

        let alert = match self {
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            },
            Error::InvalidCategory(category_id) => Alert::Error {
                message: "Invalid category".to_owned(),
                details: format!("Could not find a category with the ID {category_id}."),
            },
            Error::InvalidAmount(text) => Alert::Error {
                message: "Invalid amount".to_owned(),
                details: format!(
                    "Could not read \"{text}\" as an amount from 0 to 1,000,000,000,000 \
                    with at most two decimal places."
                ),
            },
            Error::InvalidTimestamp(text) => Alert::Error {
                message: "Invalid transaction date".to_owned(),
                details: format!("Could not read \"{text}\" as a date and time."),
            },
            Error::EmptyCategoryTitle | Error::InvalidCategoryKind(_) => Alert::Error {
                message: "Invalid category".to_owned(),
                details: self.to_string(),
            },
            Error::TransactionConflict => Alert::Error {
                message: "Could not update transaction".to_owned(),
                details: "The transaction was changed since you opened this page. \
                    Reload the page to see the latest version and try again."
                    .to_owned(),
            },
            Error::UpdateMissingTransaction => Alert::Error {
                message: "Could not update transaction".to_owned(),
                details: "The transaction could not be found.".to_owned(),
            },
            Error::DeleteMissingTransaction => Alert::Error {
                message: "Could not delete transaction".to_owned(),
                details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            },
            Error::UpdateMissingCategory => Alert::Error {
                message: "Could not update category".to_owned(),
                details: "The category could not be found.".to_owned(),
            },
            Error::DeleteMissingCategory => Alert::Error {
                message: "Could not delete category".to_owned(),
                details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                    .to_owned(),
            },
            Error::CategoryInUse(count) => Alert::Error {
                message: "Could not delete category".to_owned(),
                details: format!(
                    "The category is used by {count} transaction(s). \
                    Delete those transactions or move them to another category first."
                ),
            },
            Error::CategoryKindLocked => Alert::Error {
                message: "Could not update category".to_owned(),
                details: "The type of a category cannot be changed once it has transactions."
                    .to_owned(),
            },
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "An unexpected error occurred, check the server logs for more details."
                    .to_owned(),
            },
        };

        (status_code, alert.into_html()).into_response()
    }
}
