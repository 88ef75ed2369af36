//! ECharts configuration for the report and dashboard charts.
//!
//! Charts are built with charming, serialised to JSON and initialised by a
//! script in the page head:
//! - **Daily spending**: expenses per day over the last 30 days
//! - **Trend**: income and expense bars with a balance line per month
//! - **Year**: income and expense bars for each month of a year

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Line, bar},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    html::HeadElement,
    report::aggregation::{DailyTotal, TrendPoint, YearlyRollup, short_month_label},
};

/// A chart with its HTML container ID and ECharts configuration.
pub(crate) struct ReportChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for `charts`.
pub(crate) fn charts_view(charts: &[ReportChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for `charts`.
///
/// Each chart follows the browser's dark mode setting and resizes with the window.
pub(crate) fn charts_script(charts: &[ReportChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

pub(crate) fn daily_spending_chart(series: &[DailyTotal]) -> Chart {
    let labels = series
        .iter()
        .map(|day| format!("{} {}", short_month_label(day.date.month()), day.date.day()))
        .collect::<Vec<_>>();
    let values = series
        .iter()
        .map(|day| to_chart_value(day.amount))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Daily Spending")
                .subtext("Last 30 days"),
        )
        .tooltip(currency_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(bar::Bar::new().name("Expenses").data(values))
}

pub(crate) fn trend_chart(trend: &[TrendPoint]) -> Chart {
    let labels = trend
        .iter()
        .map(|point| point.label.clone())
        .collect::<Vec<_>>();
    let income = trend
        .iter()
        .map(|point| to_chart_value(point.summary.income))
        .collect::<Vec<_>>();
    let expense = trend
        .iter()
        .map(|point| to_chart_value(point.summary.expense))
        .collect::<Vec<_>>();
    let balance = trend
        .iter()
        .map(|point| to_chart_value(point.summary.balance))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Income vs Expenses")
                .subtext(format!("Last {} months", trend.len())),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().left("center").top("1%"))
        .grid(default_grid().top(70))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(bar::Bar::new().name("Income").data(income))
        .series(bar::Bar::new().name("Expenses").data(expense))
        .series(Line::new().name("Balance").data(balance))
}

pub(crate) fn yearly_chart(rollup: &YearlyRollup) -> Chart {
    let labels = rollup
        .months
        .iter()
        .map(|month| month.label.to_owned())
        .collect::<Vec<_>>();
    let income = rollup
        .months
        .iter()
        .map(|month| to_chart_value(month.summary.income))
        .collect::<Vec<_>>();
    let expense = rollup
        .months
        .iter()
        .map(|month| to_chart_value(month.summary.expense))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text(format!("{}", rollup.year)).subtext("Per month"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().left("center").top("1%"))
        .grid(default_grid().top(70))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(bar::Bar::new().name("Income").data(income))
        .series(bar::Bar::new().name("Expenses").data(expense))
}

/// Charts only need display precision.
fn to_chart_value(amount: Decimal) -> f64 {
    amount.round_dp(2).to_f64().unwrap_or_default()
}

fn default_grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .contain_label(true)
}

fn currency_axis() -> Axis {
    Axis::new()
        .type_(AxisType::Value)
        .axis_label(AxisLabel::new().formatter(currency_formatter()))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
