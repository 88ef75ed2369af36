//! Queries that read transactions together with their category.
//!
//! Every report needs the category type of each transaction, so these
//! queries always join the category table.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime};

use crate::{
    Error,
    category::{Category, map_category_row_with_offset},
    database_id::TransactionId,
    transaction::core::{get_decimal, get_timestamp},
};

/// A transaction with its category loaded, the input to every report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTransaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money, always counted in the direction of the category type.
    pub amount: Decimal,
    /// When the transaction happened, in local time.
    pub date: PrimitiveDateTime,
    /// An optional note, e.g. "Coffee with Sam".
    pub note: Option<String>,
    /// The category the transaction belongs to.
    pub category: Category,
}

const SELECT_WITH_CATEGORY: &str = "SELECT t.id, t.amount, t.date, t.note, c.id, c.title, c.icon, c.type
    FROM \"transaction\" t
    INNER JOIN category c ON c.id = t.category_id";

const NEWEST_FIRST: &str = "ORDER BY t.date DESC, t.id DESC";

/// Retrieve transaction `id` with its category.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a transaction.
pub fn get_transaction_with_category(
    id: TransactionId,
    connection: &Connection,
) -> Result<ReportTransaction, Error> {
    connection
        .prepare(&format!("{SELECT_WITH_CATEGORY} WHERE t.id = ?1"))?
        .query_row([id], map_report_transaction_row)
        .map_err(Error::from)
}

/// Retrieve every transaction, newest first.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<ReportTransaction>, Error> {
    connection
        .prepare(&format!("{SELECT_WITH_CATEGORY} {NEWEST_FIRST}"))?
        .query_map([], map_report_transaction_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// Retrieve the `limit` newest transactions, newest first.
pub fn get_recent_transactions(
    limit: u32,
    connection: &Connection,
) -> Result<Vec<ReportTransaction>, Error> {
    connection
        .prepare(&format!("{SELECT_WITH_CATEGORY} {NEWEST_FIRST} LIMIT ?1"))?
        .query_map([limit], map_report_transaction_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// Retrieve the transactions whose calendar date lies in `date_range`, newest first.
///
/// Both ends are inclusive and cover the whole day, so a range ending on the
/// 31st includes a transaction at 23:59:59 on the 31st.
pub fn get_transactions_in_range(
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<ReportTransaction>, Error> {
    let start = format!("{} 00:00:00", format_date(*date_range.start()));
    let end = format!("{} 23:59:59", format_date(*date_range.end()));

    connection
        .prepare(&format!(
            "{SELECT_WITH_CATEGORY} WHERE t.date BETWEEN ?1 AND ?2 {NEWEST_FIRST}"
        ))?
        .query_map([start, end], map_report_transaction_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(Error::from)
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn map_report_transaction_row(row: &Row) -> Result<ReportTransaction, rusqlite::Error> {
    Ok(ReportTransaction {
        id: row.get(0)?,
        amount: get_decimal(row, 1)?,
        date: get_timestamp(row, 2)?,
        note: row.get(3)?,
        category: map_category_row_with_offset(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        category::{Category, CategoryKind, CategoryTitle, NewCategory, create_category},
        db::initialize,
        transaction::{
            Transaction, create_transaction, get_all_transactions, get_recent_transactions,
            get_transaction_with_category, get_transactions_in_range,
        },
    };

    fn get_test_connection() -> (Connection, Category) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let category = create_category(
            NewCategory {
                title: CategoryTitle::new_unchecked("Groceries"),
                icon: "🥕".to_owned(),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        (conn, category)
    }

    #[test]
    fn loads_category_with_transaction() {
        let (conn, category) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(category.id, Decimal::new(4550, 2), datetime!(2024-01-05 10:00))
                .note("Weekly shop"),
            &conn,
        )
        .unwrap();

        let got = get_transaction_with_category(transaction.id, &conn).unwrap();

        assert_eq!(got.id, transaction.id);
        assert_eq!(got.amount, Decimal::new(4550, 2));
        assert_eq!(got.note.as_deref(), Some("Weekly shop"));
        assert_eq!(got.category, category);
    }

    #[test]
    fn missing_transaction_with_category_is_not_found() {
        let (conn, _) = get_test_connection();

        assert_eq!(
            get_transaction_with_category(99, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn lists_newest_first_with_id_tie_break() {
        let (conn, category) = get_test_connection();
        let older = create_transaction(
            Transaction::build(category.id, Decimal::ONE, datetime!(2024-01-01 09:00)),
            &conn,
        )
        .unwrap();
        let first_same_time = create_transaction(
            Transaction::build(category.id, Decimal::ONE, datetime!(2024-01-02 09:00)),
            &conn,
        )
        .unwrap();
        let second_same_time = create_transaction(
            Transaction::build(category.id, Decimal::ONE, datetime!(2024-01-02 09:00)),
            &conn,
        )
        .unwrap();

        let ids = get_all_transactions(&conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, vec![second_same_time.id, first_same_time.id, older.id]);
    }

    #[test]
    fn recent_transactions_are_limited() {
        let (conn, category) = get_test_connection();
        for day in 1..=10 {
            create_transaction(
                Transaction::build(
                    category.id,
                    Decimal::from(day),
                    datetime!(2024-03-01 12:00).replace_day(day).unwrap(),
                ),
                &conn,
            )
            .unwrap();
        }

        let recent = get_recent_transactions(7, &conn).unwrap();

        assert_eq!(recent.len(), 7);
        assert_eq!(recent[0].amount, Decimal::from(10));
        assert_eq!(recent[6].amount, Decimal::from(4));
    }

    #[test]
    fn range_includes_whole_first_and_last_day() {
        let (conn, category) = get_test_connection();
        for date in [
            datetime!(2023-12-31 23:59:59),
            datetime!(2024-01-01 00:00:00),
            datetime!(2024-01-31 23:59:59),
            datetime!(2024-02-01 00:00:00),
        ] {
            create_transaction(Transaction::build(category.id, Decimal::ONE, date), &conn).unwrap();
        }

        let dates = get_transactions_in_range(date!(2024-01-01)..=date!(2024-01-31), &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.date)
            .collect::<Vec<_>>();

        assert_eq!(
            dates,
            vec![datetime!(2024-01-31 23:59:59), datetime!(2024-01-01 00:00:00)]
        );
    }
}
