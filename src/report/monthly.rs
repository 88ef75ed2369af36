//! The monthly report: every transaction of one month with its totals.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, Month};

use crate::{
    Error,
    category::CategoryKind,
    endpoints,
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    report::{
        ReportsState,
        aggregation::{
            CategoryTotal, PeriodSummary, category_breakdown, long_month_label, month_window,
            summarise,
        },
        views::{breakdown_table_view, summary_cards_view},
    },
    timezone::{get_local_offset, local_now},
    transaction::{ReportTransaction, get_transactions_in_range, signed_amount_view},
};

/// The years a report can be requested for.
const REPORT_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// The month to report on, the current month when left out.
#[derive(Debug, Default, Deserialize)]
pub struct MonthlyReportQuery {
    /// The calendar year, 1 to 9999.
    pub year: Option<i32>,
    /// The month of the year, 1 to 12.
    pub month: Option<u8>,
}

impl MonthlyReportQuery {
    /// The first day of the requested month, filling gaps from `today`.
    ///
    /// # Errors
    /// Returns [Error::InvalidReportPeriod] if the month is not 1-12 or the
    /// year is outside 1-9999.
    fn resolve(&self, today: Date) -> Result<Date, Error> {
        let year = self.year.unwrap_or(today.year());
        let month = self.month.unwrap_or(u8::from(today.month()));

        if !REPORT_YEARS.contains(&year) {
            return Err(Error::InvalidReportPeriod(format!(
                "The year {year} is out of range, expected a year from 1 to 9999."
            )));
        }

        let month = Month::try_from(month).map_err(|_| {
            Error::InvalidReportPeriod(format!(
                "The month {month} is out of range, expected a month from 1 to 12."
            ))
        })?;

        Date::from_calendar_date(year, month, 1)
            .map_err(|error| Error::InvalidReportPeriod(error.to_string()))
    }
}

struct MonthlyReport {
    month: Date,
    summary: PeriodSummary,
    transactions: Vec<ReportTransaction>,
    expense_breakdown: Vec<CategoryTotal>,
    income_breakdown: Vec<CategoryTotal>,
}

/// Render the transactions and totals of the month given by `?year=&month=`.
pub async fn get_monthly_report_page(
    State(state): State<ReportsState>,
    Query(query): Query<MonthlyReportQuery>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let month = query.resolve(local_now(local_offset).date())?;
    let window = month_window(month);

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_in_range(window, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?
    };

    let report = MonthlyReport {
        month,
        summary: summarise(&transactions),
        expense_breakdown: category_breakdown(&transactions, CategoryKind::Expense),
        income_breakdown: category_breakdown(&transactions, CategoryKind::Income),
        transactions,
    };

    Ok(monthly_report_view(&report).into_response())
}

fn month_url(month: Date) -> String {
    format!(
        "{}?year={}&month={}",
        endpoints::MONTHLY_REPORT_VIEW,
        month.year(),
        u8::from(month.month())
    )
}

fn transactions_table_view(transactions: &[ReportTransaction]) -> Markup {
    html! {
        section id="month-transactions" class="w-full space-y-2"
        {
            h2 class="text-lg font-semibold" { "Transactions" }

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
                                td class=(TABLE_CELL_STYLE) { (transaction.note.as_deref().unwrap_or("")) }
                            }
                        }

                        @if transactions.is_empty() {
                            tr
                            {
                                td
                                    colspan="4"
                                    class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                {
                                    "No transactions this month."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn monthly_report_view(report: &MonthlyReport) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let window = month_window(report.month);
    let previous_month = window
        .start()
        .previous_day()
        .filter(|date| REPORT_YEARS.contains(&date.year()));
    let next_month = window
        .end()
        .next_day()
        .filter(|date| REPORT_YEARS.contains(&date.year()));

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { (long_month_label(report.month)) }

                    nav class="flex gap-4" aria-label="Month navigation"
                    {
                        @if let Some(previous_month) = previous_month {
                            a id="previous-month" href=(month_url(previous_month)) class=(LINK_STYLE) { "← Previous" }
                        }
                        @if let Some(next_month) = next_month {
                            a id="next-month" href=(month_url(next_month)) class=(LINK_STYLE) { "Next →" }
                        }
                    }
                }

                (summary_cards_view(&report.summary))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (breakdown_table_view("expense-breakdown", CategoryKind::Expense, &report.expense_breakdown))
                    (breakdown_table_view("income-breakdown", CategoryKind::Income, &report.income_breakdown))
                }

                (transactions_table_view(&report.transactions))
            }
        }
    };

    base(&long_month_label(report.month), &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rust_decimal::Decimal;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        category::{CategoryKind, CategoryTitle, NewCategory, create_category},
        db::initialize,
        html::format_currency,
        report::ReportsState,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{Transaction, create_transaction},
    };

    use super::{MonthlyReportQuery, get_monthly_report_page};

    fn get_state() -> ReportsState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        ReportsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[test]
    fn resolve_fills_missing_parts_from_today() {
        let today = date!(2024-07-19);

        assert_eq!(MonthlyReportQuery::default().resolve(today), Ok(date!(2024-07-01)));
        assert_eq!(
            MonthlyReportQuery {
                year: Some(2023),
                month: None
            }
            .resolve(today),
            Ok(date!(2023-07-01))
        );
        assert_eq!(
            MonthlyReportQuery {
                year: None,
                month: Some(2)
            }
            .resolve(today),
            Ok(date!(2024-02-01))
        );
    }

    #[test]
    fn resolve_rejects_out_of_range_values() {
        let today = date!(2024-07-19);

        for query in [
            MonthlyReportQuery {
                year: Some(2024),
                month: Some(13),
            },
            MonthlyReportQuery {
                year: Some(2024),
                month: Some(0),
            },
            MonthlyReportQuery {
                year: Some(0),
                month: Some(1),
            },
        ] {
            assert!(matches!(
                query.resolve(today),
                Err(Error::InvalidReportPeriod(_))
            ));
        }
    }

    #[tokio::test]
    async fn january_report_excludes_february() {
        let state = get_state();
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
            for (category_id, amount, date) in [
                (salary.id, 1000, datetime!(2024-01-05 09:00)),
                (food.id, 200, datetime!(2024-01-10 18:00)),
                (food.id, 50, datetime!(2024-02-01 08:00)),
            ] {
                create_transaction(
                    Transaction::build(category_id, Decimal::from(amount), date),
                    &connection,
                )
                .unwrap();
            }
        }

        let response = get_monthly_report_page(
            State(state),
            Query(MonthlyReportQuery {
                year: Some(2024),
                month: Some(1),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let heading = html
            .select(&Selector::parse("h1").unwrap())
            .map(|h1| h1.text().collect::<String>())
            .find(|text| text.contains("January 2024"));
        assert!(heading.is_some(), "January 2024 heading missing");

        let balance = html
            .select(&Selector::parse("#balance").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(balance.contains(&format_currency(Decimal::from(800))));

        let dates = html
            .select(&Selector::parse("#month-transactions tbody tr td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(dates, vec!["2024-01-10", "2024-01-05"]);

        let previous = html
            .select(&Selector::parse("#previous-month").unwrap())
            .next()
            .unwrap();
        assert_eq!(
            previous.value().attr("href"),
            Some("/reports/monthly?year=2023&month=12")
        );
    }

    #[tokio::test]
    async fn last_supported_month_renders_without_next_link() {
        let state = get_state();

        let response = get_monthly_report_page(
            State(state.clone()),
            Query(MonthlyReportQuery {
                year: Some(9999),
                month: Some(12),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert!(
            html.select(&Selector::parse("#next-month").unwrap())
                .next()
                .is_none()
        );
        let previous = html
            .select(&Selector::parse("#previous-month").unwrap())
            .next()
            .expect("previous month link missing");
        assert_eq!(
            previous.value().attr("href"),
            Some("/reports/monthly?year=9999&month=11")
        );

        let follow_up = get_monthly_report_page(
            State(state),
            Query(MonthlyReportQuery {
                year: Some(2024),
                month: Some(1),
            }),
        )
        .await
        .unwrap();
        assert_eq!(follow_up.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn first_supported_month_renders_without_previous_link() {
        let response = get_monthly_report_page(
            State(get_state()),
            Query(MonthlyReportQuery {
                year: Some(1),
                month: Some(1),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert!(
            html.select(&Selector::parse("#previous-month").unwrap())
                .next()
                .is_none()
        );
        let next = html
            .select(&Selector::parse("#next-month").unwrap())
            .next()
            .expect("next month link missing");
        assert_eq!(
            next.value().attr("href"),
            Some("/reports/monthly?year=1&month=2")
        );
    }

    #[tokio::test]
    async fn invalid_month_is_bad_request() {
        let response = get_monthly_report_page(
            State(get_state()),
            Query(MonthlyReportQuery {
                year: Some(2024),
                month: Some(13),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
