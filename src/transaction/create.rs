//! Transaction creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
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
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, link},
    navigation::NavBar,
    timezone::{get_local_offset, local_now},
    transaction::{
        create_transaction,
        form::{TransactionFormData, TransactionFormDefaults, transaction_form_fields},
    },
};

/// The state needed for the new transaction page and endpoint.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for creating a transaction, dated now by default.
pub async fn get_new_transaction_page(
    State(state): State<CreateTransactionState>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let defaults = TransactionFormDefaults {
        category_id: None,
        amount: None,
        date: local_now(local_offset),
        note: None,
    };

    Ok(new_transaction_view(&defaults, &categories).into_response())
}

/// Handle transaction creation form submission.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let builder = match form.validate(local_now(local_offset)) {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(builder, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::InvalidCategory(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a transaction: {error}");
            error.into_alert_response()
        }
    }
}

fn new_transaction_view(
    defaults: &TransactionFormDefaults<'_>,
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Transaction" }

            @if categories.is_empty() {
                p
                {
                    "Transactions need a category. "
                    (link(endpoints::NEW_CATEGORY_VIEW, "Create a category"))
                    " first."
                }
            } @else {
                form
                    hx-post=(endpoints::TRANSACTIONS_API)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (transaction_form_fields(defaults, categories))

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Transaction" }
                }
            }
        }
    };

    base("New Transaction", &[dollar_input_styles()], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Form;
    use rust_decimal::Decimal;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        category::{CategoryKind, CategoryTitle, NewCategory, create_category},
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document,
        },
        transaction::{get_all_transactions, form::TransactionFormData},
    };

    use super::{CreateTransactionState, create_transaction_endpoint, get_new_transaction_page};

    fn get_state() -> CreateTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CreateTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn create_test_category(state: &CreateTransactionState, title: &str, kind: CategoryKind) -> i64 {
        create_category(
            NewCategory {
                title: CategoryTitle::new_unchecked(title),
                icon: String::new(),
                kind,
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn render_page() {
        let state = get_state();
        create_test_category(&state, "Salary", CategoryKind::Income);
        create_test_category(&state, "Food", CategoryKind::Expense);

        let response = get_new_transaction_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "datetime-local");
        assert_form_submit_button(&form);

        let groups = form
            .select(&Selector::parse("optgroup").unwrap())
            .map(|group| group.value().attr("label").unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(groups, vec!["Expense", "Income"]);
    }

    #[tokio::test]
    async fn page_asks_for_category_when_none_exist() {
        let response = get_new_transaction_page(State(get_state())).await.unwrap();

        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("form").unwrap()).next().is_none(),
            "form should not be shown without categories"
        );
        let create_link = html
            .select(&Selector::parse("main a, div a").unwrap())
            .any(|a| a.value().attr("href") == Some(endpoints::NEW_CATEGORY_VIEW));
        assert!(create_link);
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let state = get_state();
        let category_id = create_test_category(&state, "Food", CategoryKind::Expense);
        let form = TransactionFormData {
            category_id,
            amount: "12.50".to_owned(),
            date: "2024-02-03T18:30".to_owned(),
            note: "Pizza".to_owned(),
            version: None,
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, Decimal::new(1250, 2));
        assert_eq!(transactions[0].note.as_deref(), Some("Pizza"));
    }

    #[tokio::test]
    async fn create_with_unknown_category_is_bad_request() {
        let state = get_state();
        let form = TransactionFormData {
            category_id: 42,
            amount: "1".to_owned(),
            date: String::new(),
            note: String::new(),
            version: None,
        };

        let response = create_transaction_endpoint(State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_invalid_amount_is_bad_request() {
        let state = get_state();
        let category_id = create_test_category(&state, "Food", CategoryKind::Expense);
        let form = TransactionFormData {
            category_id,
            amount: "-3".to_owned(),
            date: String::new(),
            note: String::new(),
            version: None,
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            get_all_transactions(&state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }
}
