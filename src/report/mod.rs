//! Reports over transactions: monthly and yearly summaries, category
//! breakdowns, daily spending and the monthly trend.

mod aggregation;
mod charts;
mod monthly;
mod overview;
mod views;
mod yearly;

pub use aggregation::{
    CategoryTotal, DAILY_SERIES_DAYS, DailyTotal, MonthTotal, PeriodSummary, TREND_MONTHS,
    TrendPoint, YearlyRollup, category_breakdown, daily_series, long_month_label, month_label,
    month_window, monthly_summary, short_month_label, summarise, trailing_trend, trend_window,
    yearly_rollup,
};
pub use monthly::get_monthly_report_page;
pub use overview::{ReportsState, get_reports_page};
pub use yearly::get_yearly_report_page;

pub use crate::transaction::ReportTransaction;

pub(crate) use views::{breakdown_table_view, summary_cards_view};
