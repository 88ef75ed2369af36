//! Transaction editing page and endpoint.
//!
//! The edit form carries the version of the transaction it was loaded with,
//! so saving over someone else's change is refused instead of silently
//! overwriting it.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    database_id::TransactionId,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::{get_local_offset, local_now},
    transaction::{
        Transaction, UpdateOutcome,
        form::{TransactionFormData, TransactionFormDefaults, transaction_form_fields},
        get_transaction, update_transaction,
    },
};

/// The state needed for the edit transaction page and endpoint.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the transaction editing page, pre-filled with the stored values.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
        }
    })?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(edit_transaction_view(&transaction, &categories).into_response())
}

/// Handle transaction update form submission.
///
/// A form without a version is treated as stale.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let builder = match form.validate(local_now(local_offset)) {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    let Some(expected_version) = form.version else {
        return Error::TransactionConflict.into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_transaction(transaction_id, expected_version, builder, &connection) {
        Ok(UpdateOutcome::Updated(_)) => (
            HxRedirect(endpoints::format_endpoint(
                endpoints::TRANSACTION_VIEW,
                transaction_id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Ok(UpdateOutcome::Conflict) => {
            tracing::debug!(
                "Rejected stale update of transaction {transaction_id} at version {expected_version}"
            );
            Error::TransactionConflict.into_alert_response()
        }
        Ok(UpdateOutcome::NotFound) => Error::UpdateMissingTransaction.into_alert_response(),
        Err(error @ Error::InvalidCategory(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating transaction {transaction_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_transaction_view(transaction: &Transaction, categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();
    let update_endpoint = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);
    let defaults = TransactionFormDefaults {
        category_id: Some(transaction.category_id),
        amount: Some(transaction.amount),
        date: transaction.date,
        note: transaction.note.as_deref(),
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Transaction" }

            form
                hx-put=(update_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                input type="hidden" name="version" value=(transaction.version);

                (transaction_form_fields(&defaults, categories))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Transaction" }
            }
        }
    };

    base("Edit Transaction", &[dollar_input_styles()], &content)
}
