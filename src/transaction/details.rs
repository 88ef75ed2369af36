//! Page showing a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    endpoints,
    html::{CARD_STYLE, CATEGORY_BADGE_STYLE, PAGE_CONTAINER_STYLE, base, edit_delete_action_links},
    navigation::NavBar,
    transaction::{
        ReportTransaction, core::format_timestamp, get_transaction_with_category,
        list::signed_amount_view,
    },
};

/// The state needed for the transaction details page.
#[derive(Debug, Clone)]
pub struct TransactionPageState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a single transaction with its category.
///
/// # Errors
/// Responds with the 404 page if the transaction does not exist.
pub async fn get_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction_with_category(transaction_id, &connection)?;

    Ok(transaction_view(&transaction).into_response())
}

fn transaction_view(transaction: &ReportTransaction) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let delete_url = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);
    let time = transaction.date.time();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            article id="transaction-details" class={(CARD_STYLE) " w-full max-w-md space-y-4"}
            {
                h1 class="text-xl font-bold" { "Transaction #" (transaction.id) }

                dl class="grid grid-cols-2 gap-2"
                {
                    dt class="font-semibold" { "Amount" }
                    dd { (signed_amount_view(transaction)) }

                    dt class="font-semibold" { "Type" }
                    dd { (transaction.category.kind) }

                    dt class="font-semibold" { "Category" }
                    dd
                    {
                        span class=(CATEGORY_BADGE_STYLE) { (transaction.category.title_with_icon()) }
                    }

                    dt class="font-semibold" { "Date" }
                    dd
                    {
                        time datetime=(format_timestamp(transaction.date))
                        {
                            (transaction.date.date())
                            (format!(" {:02}:{:02}", time.hour(), time.minute()))
                        }
                    }

                    dt class="font-semibold" { "Note" }
                    dd { (transaction.note.as_deref().unwrap_or("-")) }
                }

                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        "Are you sure you want to delete this transaction?",
                        "#transaction-details",
                        "outerHTML",
                    ))
                }
            }
        }
    };

    base("Transaction", &[], &content)
}
