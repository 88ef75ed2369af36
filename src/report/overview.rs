//! The reports page: this month at a glance plus the recent trend.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    category::CategoryKind,
    endpoints,
    html::{
        HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    report::{
        aggregation::{
            CategoryTotal, DAILY_SERIES_DAYS, PeriodSummary, TREND_MONTHS, TrendPoint,
            category_breakdown, daily_series, long_month_label, month_window, monthly_summary,
            trailing_trend, trend_window,
        },
        charts::{ReportChart, charts_script, charts_view, daily_spending_chart, trend_chart},
        views::{breakdown_table_view, summary_cards_view},
    },
    timezone::{get_local_offset, local_now},
    transaction::{ReportTransaction, get_transactions_in_range},
};

/// The state needed by the report pages.
#[derive(Debug, Clone)]
pub struct ReportsState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

struct OverviewData {
    month_label: String,
    summary: PeriodSummary,
    expense_breakdown: Vec<CategoryTotal>,
    income_breakdown: Vec<CategoryTotal>,
    trend: Vec<TrendPoint>,
    charts: [ReportChart; 2],
}

/// Render the reports overview for the current month.
pub async fn get_reports_page(State(state): State<ReportsState>) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let now = local_now(local_offset);
    let today = now.date();

    // One query for both the trend and the daily series.
    let trend_range = trend_window(today, TREND_MONTHS);
    let daily_start = (now - Duration::days(DAILY_SERIES_DAYS)).date();
    let start = (*trend_range.start()).min(daily_start);

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_in_range(start..=*trend_range.end(), &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?
    };

    let current_month = month_window(today);
    let this_month = transactions
        .iter()
        .filter(|transaction| current_month.contains(&transaction.date.date()))
        .cloned()
        .collect::<Vec<ReportTransaction>>();

    let trend = trailing_trend(&transactions, today, TREND_MONTHS);
    let daily = daily_series(&transactions, now, DAILY_SERIES_DAYS);

    let data = OverviewData {
        month_label: long_month_label(today),
        summary: monthly_summary(&transactions, today),
        expense_breakdown: category_breakdown(&this_month, CategoryKind::Expense),
        income_breakdown: category_breakdown(&this_month, CategoryKind::Income),
        charts: [
            ReportChart {
                id: "daily-spending-chart",
                options: daily_spending_chart(&daily).to_string(),
            },
            ReportChart {
                id: "trend-chart",
                options: trend_chart(&trend).to_string(),
            },
        ],
        trend,
    };

    Ok(reports_view(&data).into_response())
}

fn trend_table_view(trend: &[TrendPoint]) -> Markup {
    html! {
        section id="trend" class="w-full space-y-2"
        {
            h2 class="text-lg font-semibold" { "Last " (trend.len()) " Months" }

            div class="overflow-x-auto dark:bg-gray-800"
            {
                table class="w-full text-sm text-left rtl:text-right
                    text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Income" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Expenses" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Balance" }
                        }
                    }

                    tbody
                    {
                        @for point in trend {
                            @let month_url = format!(
                                "{}?year={}&month={}",
                                endpoints::MONTHLY_REPORT_VIEW,
                                point.month.year(),
                                u8::from(point.month.month())
                            );

                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a href=(month_url) class=(LINK_STYLE) { (point.label) }
                                }
                                td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(point.summary.income)) }
                                td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(point.summary.expense)) }
                                td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(point.summary.balance)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn reports_view(data: &OverviewData) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Reports: " (data.month_label) }

                    div class="flex gap-4"
                    {
                        a href=(endpoints::MONTHLY_REPORT_VIEW) class=(LINK_STYLE) { "Monthly" }
                        a href=(endpoints::YEARLY_REPORT_VIEW) class=(LINK_STYLE) { "Yearly" }
                    }
                }

                (summary_cards_view(&data.summary))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (breakdown_table_view("expense-breakdown", CategoryKind::Expense, &data.expense_breakdown))
                    (breakdown_table_view("income-breakdown", CategoryKind::Income, &data.income_breakdown))
                }

                (charts_view(&data.charts))

                (trend_table_view(&data.trend))
            }
        }
    };

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&data.charts),
    ];

    base("Reports", &scripts, &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use rust_decimal::Decimal;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{Duration, UtcOffset};

    use crate::{
        category::{CategoryKind, CategoryTitle, NewCategory, create_category},
        db::initialize,
        html::format_currency,
        test_utils::{assert_valid_html, parse_html_document},
        timezone::local_now,
        transaction::{Transaction, create_transaction},
    };

    use super::{ReportsState, get_reports_page};

    fn get_state() -> ReportsState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        ReportsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn text_of(html: &scraper::Html, selector: &str) -> String {
        html.select(&Selector::parse(selector).unwrap())
            .next()
            .unwrap_or_else(|| panic!("{selector} missing"))
            .text()
            .collect::<String>()
    }

    #[tokio::test]
    async fn shows_current_month_totals_and_trend() {
        let state = get_state();
        let now = local_now(UtcOffset::UTC);
        let first_of_month = now.replace_day(1).unwrap().replace_time(time::Time::MIDNIGHT);
        {
            let connection = state.db_connection.lock().unwrap();
            let salary = create_category(
                NewCategory {
                    title: CategoryTitle::new_unchecked("Salary"),
                    icon: String::new(),
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
            create_transaction(
                Transaction::build(salary.id, Decimal::from(1000), first_of_month),
                &connection,
            )
            .unwrap();
            create_transaction(
                Transaction::build(food.id, Decimal::from(200), first_of_month),
                &connection,
            )
            .unwrap();
            // Last month, only part of the trend.
            create_transaction(
                Transaction::build(food.id, Decimal::from(50), first_of_month - Duration::days(1)),
                &connection,
            )
            .unwrap();
        }

        let response = get_reports_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        assert!(text_of(&html, "#total-income").contains(&format_currency(Decimal::from(1000))));
        assert!(text_of(&html, "#total-expenses").contains(&format_currency(Decimal::from(200))));
        assert!(text_of(&html, "#balance").contains(&format_currency(Decimal::from(800))));

        let trend_rows = html
            .select(&Selector::parse("#trend tbody tr").unwrap())
            .count();
        assert_eq!(trend_rows, 6);

        for chart_id in ["#daily-spending-chart", "#trend-chart"] {
            assert!(
                html.select(&Selector::parse(chart_id).unwrap()).next().is_some(),
                "{chart_id} missing"
            );
        }
    }

    #[tokio::test]
    async fn invalid_timezone_is_server_error() {
        let mut state = get_state();
        state.local_timezone = "Nowhere/Special".to_owned();

        let response = get_reports_page(State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
