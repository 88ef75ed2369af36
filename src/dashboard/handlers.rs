//! Dashboard HTTP handler and view rendering.

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
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link,
    },
    navigation::NavBar,
    report::{
        CategoryTotal, PeriodSummary, breakdown_table_view, category_breakdown, long_month_label,
        month_window, summarise, summary_cards_view,
    },
    timezone::{get_local_offset, local_now},
    transaction::{
        ReportTransaction, get_recent_transactions, get_transactions_in_range,
        signed_amount_view,
    },
};

/// How many of the latest transactions the dashboard lists.
const RECENT_TRANSACTION_COUNT: u32 = 7;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    month_label: String,
    summary: PeriodSummary,
    recent_transactions: Vec<ReportTransaction>,
    expense_breakdown: Vec<CategoryTotal>,
}

/// Display a page with an overview of the current month.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = local_now(local_offset).date();

    let window = month_window(today);

    let (recent_transactions, this_month) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let recent_transactions = get_recent_transactions(RECENT_TRANSACTION_COUNT, &connection)
            .inspect_err(|error| tracing::error!("could not get recent transactions: {error}"))?;

        if recent_transactions.is_empty() {
            return Ok(dashboard_no_data_view().into_response());
        }

        let this_month = get_transactions_in_range(window, &connection).inspect_err(|error| {
            tracing::error!("could not get this month's transactions: {error}")
        })?;

        (recent_transactions, this_month)
    };

    let data = DashboardData {
        month_label: long_month_label(today),
        summary: summarise(&this_month),
        recent_transactions,
        expense_breakdown: category_breakdown(&this_month, CategoryKind::Expense),
    };

    Ok(dashboard_view(&data).into_response())
}

fn dashboard_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "adding a transaction");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your totals will show up here once you start by "
                (new_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn recent_transactions_view(transactions: &[ReportTransaction]) -> Markup {
    html! {
        section id="recent-transactions" class="w-full space-y-2"
        {
            div class="flex justify-between items-baseline"
            {
                h2 class="text-lg font-semibold" { "Recent Transactions" }

                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
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
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(endpoints::format_endpoint(endpoints::TRANSACTION_VIEW, transaction.id))
                                        class=(LINK_STYLE)
                                    {
                                        (transaction.date.date())
                                    }
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    span class=(CATEGORY_BADGE_STYLE) { (transaction.category.title_with_icon()) }
                                }
                                td class={(TABLE_CELL_STYLE) " text-right"} { (signed_amount_view(transaction)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { (data.month_label) }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add Transaction" }
                }

                (summary_cards_view(&data.summary))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (recent_transactions_view(&data.recent_transactions))
                    (breakdown_table_view("expense-breakdown", CategoryKind::Expense, &data.expense_breakdown))
                }
            }
        }
    );

    base("Dashboard", &[], &content)
}
