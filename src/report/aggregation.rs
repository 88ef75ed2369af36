//! Report arithmetic over transactions that have already been loaded.
//!
//! Every function here is pure: the caller queries the store for a date range
//! and passes the rows in. Amounts are summed as [Decimal] and only rounded
//! when displayed.

use std::{collections::BTreeMap, ops::RangeInclusive};

use rust_decimal::Decimal;
use time::{Date, Duration, Month, PrimitiveDateTime};

use crate::{
    category::{Category, CategoryKind},
    database_id::CategoryId,
    transaction::ReportTransaction,
};

/// How many days the daily spending series looks back by default.
pub const DAILY_SERIES_DAYS: i64 = 30;

/// How many months the trend covers by default, including the current month.
pub const TREND_MONTHS: u32 = 6;

/// Income, expense and their difference over some period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodSummary {
    /// The sum of income transactions.
    pub income: Decimal,
    /// The sum of expense transactions.
    pub expense: Decimal,
    /// Always exactly `income - expense`.
    pub balance: Decimal,
}

impl PeriodSummary {
    /// Sums saturate at the limits of [Decimal] instead of overflowing.
    fn add(&mut self, kind: CategoryKind, amount: Decimal) {
        match kind {
            CategoryKind::Income => self.income = self.income.saturating_add(amount),
            CategoryKind::Expense => self.expense = self.expense.saturating_add(amount),
        }

        self.balance = self.income.saturating_sub(self.expense);
    }
}

/// The total of one category within a kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category the transactions belong to.
    pub category: Category,
    /// The sum of the category's transactions.
    pub total: Decimal,
    /// The number of transactions that make up `total`.
    pub count: u32,
    /// Share of the kind's grand total in the range 0 to 100.
    pub percentage: Decimal,
}

/// Money spent on a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTotal {
    /// The calendar day.
    pub date: Date,
    /// The sum of the day's expenses.
    pub amount: Decimal,
}

/// One month of a trend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendPoint {
    /// The first day of the month.
    pub month: Date,
    /// e.g. "Jan 2024"
    pub label: String,
    /// Income and expense over the month.
    pub summary: PeriodSummary,
}

/// One month of a yearly rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthTotal {
    /// The month of the year.
    pub month: Month,
    /// e.g. "Jan"
    pub label: &'static str,
    /// Income and expense over the month.
    pub summary: PeriodSummary,
}

/// A calendar year broken down by month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyRollup {
    /// The calendar year.
    pub year: i32,
    /// January to December, months without transactions are zero.
    pub months: [MonthTotal; 12],
    /// Income and expense over the whole year.
    pub total: PeriodSummary,
}

/// The first day of the month containing `date`.
fn first_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// The first to the last day of the month containing `date`, both inclusive.
pub fn month_window(date: Date) -> RangeInclusive<Date> {
    let last_day = date.month().length(date.year());
    let last = date.replace_day(last_day).unwrap_or(date);

    first_of_month(date)..=last
}

/// The first day of each of the `n` months ending with the month containing
/// `now`, oldest first.
fn trailing_months(now: Date, n: u32) -> Vec<Date> {
    let mut months = Vec::with_capacity(n as usize);
    let mut month = first_of_month(now);

    for _ in 0..n {
        months.push(month);
        month = first_of_month(month - Duration::days(1));
    }

    months.reverse();
    months
}

/// The dates covered by a trend of `n` months ending with the month containing `now`.
///
/// A trend of zero months still covers the current month so that the range
/// is never empty.
pub fn trend_window(now: Date, n: u32) -> RangeInclusive<Date> {
    let months = trailing_months(now, n.max(1));
    let start = months.first().copied().unwrap_or_else(|| first_of_month(now));

    start..=*month_window(now).end()
}

/// Sum income and expense over all of `transactions`.
pub fn summarise(transactions: &[ReportTransaction]) -> PeriodSummary {
    transactions
        .iter()
        .fold(PeriodSummary::default(), |mut summary, transaction| {
            summary.add(transaction.category.kind, transaction.amount);
            summary
        })
}

/// Sum income and expense over the calendar month containing `month`.
///
/// Transactions outside of that month are ignored.
pub fn monthly_summary(transactions: &[ReportTransaction], month: Date) -> PeriodSummary {
    let window = month_window(month);

    transactions
        .iter()
        .filter(|transaction| window.contains(&transaction.date.date()))
        .fold(PeriodSummary::default(), |mut summary, transaction| {
            summary.add(transaction.category.kind, transaction.amount);
            summary
        })
}

/// Total, count and share of each category of `kind`.
///
/// Sorted by descending total, equal totals by ascending category ID.
pub fn category_breakdown(
    transactions: &[ReportTransaction],
    kind: CategoryKind,
) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<CategoryId, (&Category, Decimal, u32)> = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.category.kind == kind)
    {
        let group = groups
            .entry(transaction.category.id)
            .or_insert((&transaction.category, Decimal::ZERO, 0));
        group.1 = group.1.saturating_add(transaction.amount);
        group.2 += 1;
    }

    let grand_total = groups
        .values()
        .fold(Decimal::ZERO, |sum, (_, total, _)| sum.saturating_add(*total));
    let hundred = Decimal::ONE_HUNDRED;

    let mut totals = groups
        .into_values()
        .map(|(category, total, count)| CategoryTotal {
            category: category.clone(),
            total,
            count,
            percentage: if grand_total > Decimal::ZERO {
                total / grand_total * hundred
            } else {
                Decimal::ZERO
            },
        })
        .collect::<Vec<_>>();

    // Stable, so ties keep the ID order from the map.
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
}

/// Expenses per calendar day over the `window_days` days up to `now`.
///
/// Days without expenses are left out rather than reported as zero.
pub fn daily_series(
    transactions: &[ReportTransaction],
    now: PrimitiveDateTime,
    window_days: i64,
) -> Vec<DailyTotal> {
    let start = now
        .checked_sub(Duration::days(window_days))
        .unwrap_or(PrimitiveDateTime::MIN);
    let mut days: BTreeMap<Date, Decimal> = BTreeMap::new();

    for transaction in transactions.iter().filter(|transaction| {
        transaction.category.kind == CategoryKind::Expense
            && start <= transaction.date
            && transaction.date <= now
    }) {
        let day = days.entry(transaction.date.date()).or_default();
        *day = day.saturating_add(transaction.amount);
    }

    days.into_iter()
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect()
}

/// Monthly summaries for the `n` months ending with the month containing `now`, oldest first.
pub fn trailing_trend(transactions: &[ReportTransaction], now: Date, n: u32) -> Vec<TrendPoint> {
    trailing_months(now, n)
        .into_iter()
        .map(|month| TrendPoint {
            month,
            label: month_label(month),
            summary: monthly_summary(transactions, month),
        })
        .collect()
}

/// Monthly and total income and expense for `year`.
///
/// Transactions from other years are ignored.
pub fn yearly_rollup(transactions: &[ReportTransaction], year: i32) -> YearlyRollup {
    let mut months: [MonthTotal; 12] = std::array::from_fn(|index| {
        let month = Month::January.nth_next(index as u8);

        MonthTotal {
            month,
            label: short_month_label(month),
            summary: PeriodSummary::default(),
        }
    });
    let mut total = PeriodSummary::default();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.date.year() == year)
    {
        let index = usize::from(u8::from(transaction.date.month())) - 1;
        months[index]
            .summary
            .add(transaction.category.kind, transaction.amount);
        total.add(transaction.category.kind, transaction.amount);
    }

    YearlyRollup {
        year,
        months,
        total,
    }
}

/// e.g. "Jan 2024"
pub fn month_label(date: Date) -> String {
    format!("{} {}", short_month_label(date.month()), date.year())
}

/// e.g. "January 2024"
pub fn long_month_label(date: Date) -> String {
    format!("{} {}", date.month(), date.year())
}

/// Three-letter month name, e.g. "Jan".
pub fn short_month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
