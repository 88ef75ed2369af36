//! Transactions listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::CategoryKind,
    endpoints,
    html::{
        CATEGORY_BADGE_STYLE, EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    transaction::{ReportTransaction, get_all_transactions},
};

/// The state needed for the transactions listing page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render every transaction, newest first.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_all_transactions(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?;

    Ok(transactions_view(&transactions).into_response())
}

/// Format an amount with a sign and colour that follows the category type.
pub(crate) fn signed_amount_view(transaction: &ReportTransaction) -> Markup {
    let (sign, style) = match transaction.category.kind {
        CategoryKind::Income => ("+", INCOME_TEXT_STYLE),
        CategoryKind::Expense => ("-", EXPENSE_TEXT_STYLE),
    };

    html! {
        span class={"font-mono " (style)} { (sign) (format_currency(transaction.amount)) }
    }
}

fn transactions_view(transactions: &[ReportTransaction]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let table_row = |transaction: &ReportTransaction| {
        let view_url = endpoints::format_endpoint(endpoints::TRANSACTION_VIEW, transaction.id);
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
        let delete_url = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);
        let confirm_message = format!(
            "Are you sure you want to delete the transaction of {} on {}?",
            format_currency(transaction.amount),
            transaction.date.date()
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class={(TABLE_CELL_STYLE) " whitespace-nowrap"} { (transaction.date.date()) }
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CATEGORY_BADGE_STYLE) { (transaction.category.title_with_icon()) }
                }
                td class={(TABLE_CELL_STYLE) " text-right"} { (signed_amount_view(transaction)) }
                td class=(TABLE_CELL_STYLE) { (transaction.note.as_deref().unwrap_or("")) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        a href=(view_url) class=(LINK_STYLE) { "View" }

                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add Transaction" }
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (table_row(transaction))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions recorded yet. "
                                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                                        {
                                            "Add your first transaction"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Transactions", &[], &content)
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rust_decimal::Decimal;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::datetime;

    use crate::{
        category::{CategoryKind, CategoryTitle, NewCategory, create_category},
        db::initialize,
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{Transaction, create_transaction},
    };

    use super::{TransactionsPageState, get_transactions_page};

    fn get_state() -> TransactionsPageState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn lists_transactions_newest_first_with_signed_amounts() {
        let state = get_state();
        let (paycheck, lunch) = {
            let connection = state.db_connection.lock().unwrap();
            let salary = create_category(
                NewCategory {
                    title: CategoryTitle::new_unchecked("Salary"),
                    icon: "💼".to_owned(),
                    kind: CategoryKind::Income,
                },
                &connection,
            )
            .unwrap();
            let food = create_category(
                NewCategory {
                    title: CategoryTitle::new_unchecked("Food"),
                    icon: String::new(),
                    kind: CategoryKind::Expense,
                },
                &connection,
            )
            .unwrap();
            let paycheck = create_transaction(
                Transaction::build(salary.id, Decimal::new(30000, 2), datetime!(2025-03-01 09:00)),
                &connection,
            )
            .unwrap();
            let lunch = create_transaction(
                Transaction::build(food.id, Decimal::new(1250, 2), datetime!(2025-03-02 12:30))
                    .note("Sushi"),
                &connection,
            )
            .unwrap();
            (paycheck, lunch)
        };

        let response = get_transactions_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let rows = html
            .select(&Selector::parse("tbody tr").unwrap())
            .map(|row| {
                row.select(&Selector::parse("td").unwrap())
                    .take(4)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                vec![
                    "2025-03-02".to_owned(),
                    "Food".to_owned(),
                    "-$12.50".to_owned(),
                    "Sushi".to_owned()
                ],
                vec![
                    "2025-03-01".to_owned(),
                    "💼 Salary".to_owned(),
                    "+$300.00".to_owned(),
                    String::new()
                ],
            ]
        );

        let view_links = html
            .select(&Selector::parse("tbody a").unwrap())
            .filter(|link| link.text().collect::<String>() == "View")
            .map(|link| link.value().attr("href").unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            view_links,
            vec![
                endpoints::format_endpoint(endpoints::TRANSACTION_VIEW, lunch.id),
                endpoints::format_endpoint(endpoints::TRANSACTION_VIEW, paycheck.id),
            ]
        );
    }

    #[tokio::test]
    async fn shows_placeholder_when_empty() {
        let response = get_transactions_page(State(get_state())).await.unwrap();

        let html = parse_html_document(response).await;
        let text = html
            .select(&Selector::parse("tbody td").unwrap())
            .next()
            .expect("placeholder row missing")
            .text()
            .collect::<String>();
        assert!(text.contains("No transactions recorded yet."));
    }
}
