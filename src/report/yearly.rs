//! The yearly report: income and expenses for each month of a year.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, Month};

use crate::{
    Error, endpoints,
    html::{
        HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    report::{
        ReportsState,
        aggregation::{YearlyRollup, yearly_rollup},
        charts::{ReportChart, charts_script, charts_view, yearly_chart},
        views::summary_cards_view,
    },
    timezone::{get_local_offset, local_now},
    transaction::get_transactions_in_range,
};

/// The year to report on, the current year when left out.
#[derive(Debug, Default, Deserialize)]
pub struct YearlyReportQuery {
    /// The calendar year, 1 to 9999.
    pub year: Option<i32>,
}

/// Render the 12-month rollup of the year given by `?year=`.
pub async fn get_yearly_report_page(
    State(state): State<ReportsState>,
    Query(query): Query<YearlyReportQuery>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let year = query
        .year
        .unwrap_or_else(|| local_now(local_offset).year());

    let (start, end) = year_bounds(year)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_in_range(start..=end, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?
    };

    let rollup = yearly_rollup(&transactions, year);
    let chart = ReportChart {
        id: "yearly-chart",
        options: yearly_chart(&rollup).to_string(),
    };

    Ok(yearly_report_view(&rollup, &chart).into_response())
}

fn year_bounds(year: i32) -> Result<(Date, Date), Error> {
    let out_of_range = || {
        Error::InvalidReportPeriod(format!(
            "The year {year} is out of range, expected a year from 1 to 9999."
        ))
    };

    if !(1..=9999).contains(&year) {
        return Err(out_of_range());
    }

    let start = Date::from_calendar_date(year, Month::January, 1).map_err(|_| out_of_range())?;
    let end = Date::from_calendar_date(year, Month::December, 31).map_err(|_| out_of_range())?;

    Ok((start, end))
}

fn year_url(year: i32) -> String {
    format!("{}?year={year}", endpoints::YEARLY_REPORT_VIEW)
}

fn yearly_table_view(rollup: &YearlyRollup) -> Markup {
    html! {
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table id="yearly-table" class="w-full text-sm text-left rtl:text-right
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
                    @for month in &rollup.months {
                        @let month_url = format!(
                            "{}?year={}&month={}",
                            endpoints::MONTHLY_REPORT_VIEW,
                            rollup.year,
                            u8::from(month.month)
                        );

                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                a href=(month_url) class=(LINK_STYLE) { (month.label) }
                            }
                            td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(month.summary.income)) }
                            td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(month.summary.expense)) }
                            td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(month.summary.balance)) }
                        }
                    }
                }

                tfoot
                {
                    tr class="font-semibold text-gray-900 dark:text-white"
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                        td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(rollup.total.income)) }
                        td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(rollup.total.expense)) }
                        td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(rollup.total.balance)) }
                    }
                }
            }
        }
    }
}

fn yearly_report_view(rollup: &YearlyRollup, chart: &ReportChart) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let charts = std::slice::from_ref(chart);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Year " (rollup.year) }

                    nav class="flex gap-4" aria-label="Year navigation"
                    {
                        @if rollup.year > 1 {
                            a id="previous-year" href=(year_url(rollup.year - 1)) class=(LINK_STYLE) { "← " (rollup.year - 1) }
                        }
                        @if rollup.year < 9999 {
                            a id="next-year" href=(year_url(rollup.year + 1)) class=(LINK_STYLE) { (rollup.year + 1) " →" }
                        }
                    }
                }

                (summary_cards_view(&rollup.total))

                (charts_view(charts))

                (yearly_table_view(rollup))
            }
        }
    };

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base(&format!("Year {}", rollup.year), &scripts, &content)
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
    use time::macros::datetime;

    use crate::{
        category::{CategoryKind, CategoryTitle, NewCategory, create_category},
        db::initialize,
        html::format_currency,
        report::ReportsState,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{Transaction, create_transaction},
    };

    use super::{YearlyReportQuery, get_yearly_report_page};

    fn get_state() -> ReportsState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        ReportsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn shows_twelve_months_and_year_total() {
        let state = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let food = create_category(
                NewCategory {
                    title: CategoryTitle::new_unchecked("Food"),
                    icon: String::new(),
                    kind: CategoryKind::Expense,
                },
                &connection,
            )
            .unwrap();
            for date in [
                datetime!(2024-12-31 23:59:59),
                datetime!(2024-01-01 00:00),
                datetime!(2023-12-31 23:59:59),
            ] {
                create_transaction(
                    Transaction::build(food.id, Decimal::from(10), date),
                    &connection,
                )
                .unwrap();
            }
        }

        let response = get_yearly_report_page(
            State(state),
            Query(YearlyReportQuery { year: Some(2024) }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let months = html
            .select(&Selector::parse("#yearly-table tbody tr td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            months,
            vec![
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"
            ]
        );

        let total_expenses = html
            .select(&Selector::parse("#yearly-table tfoot td").unwrap())
            .nth(1)
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(total_expenses.trim(), format_currency(Decimal::from(20)));
        assert!(
            html.select(&Selector::parse("#yearly-chart").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn last_supported_year_has_no_next_link() {
        let response = get_yearly_report_page(
            State(get_state()),
            Query(YearlyReportQuery { year: Some(9999) }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert!(
            html.select(&Selector::parse("#next-year").unwrap())
                .next()
                .is_none()
        );
        assert!(
            html.select(&Selector::parse("#previous-year").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn out_of_range_year_is_bad_request() {
        let response = get_yearly_report_page(
            State(get_state()),
            Query(YearlyReportQuery { year: Some(10_000) }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
