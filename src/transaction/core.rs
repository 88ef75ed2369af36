//! Defines the core data models and database queries for transactions.

use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, macros::format_description};

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Whether it is income or expense depends on the transaction's category.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the transaction happened, in local time.
    pub date: PrimitiveDateTime,
    /// The amount of money spent or earned in this transaction.
    pub amount: Decimal,
    /// An optional free-text note.
    pub note: Option<String>,
    /// Incremented on every update, used to detect concurrent edits.
    pub version: i64,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        category_id: CategoryId,
        amount: Decimal,
        date: PrimitiveDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            category_id,
            amount,
            date,
            note: None,
        }
    }
}

/// The fields of a [Transaction] that a user can set.
///
/// The store assigns the ID and version.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The category the transaction belongs to.
    pub category_id: CategoryId,

    /// The amount of money, non-negative in practice.
    pub amount: Decimal,

    /// When the money moved.
    ///
    /// Stored with second precision, anything finer is dropped.
    pub date: PrimitiveDateTime,

    /// A free-text note, `None` when blank.
    pub note: Option<String>,
}

impl TransactionBuilder {
    /// Set the note for the transaction. Blank notes are stored as `None`.
    pub fn note(mut self, note: &str) -> Self {
        let note = note.trim();
        self.note = (!note.is_empty()).then(|| note.to_owned());
        self
    }
}

/// The result of an optimistic update of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The transaction was saved, with its new version.
    Updated(Transaction),
    /// Another request changed the transaction after it was loaded.
    Conflict,
    /// The transaction no longer exists.
    NotFound,
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Format a date-time as it is stored in the database, e.g. "2024-01-05 14:30:00".
///
/// The fixed width format keeps lexical order equal to chronological order,
/// which the range queries rely on.
pub fn format_timestamp(date: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second()
    )
}

/// Parse a date-time written by [format_timestamp].
pub fn parse_timestamp(text: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
}

/// Parse the value of an `<input type="datetime-local">`, e.g. "2024-01-05T14:30".
///
/// Browsers omit the seconds when they are zero, so both forms are accepted.
///
/// # Errors
/// Returns [Error::InvalidTimestamp] if `text` is in neither form.
pub fn parse_form_timestamp(text: &str) -> Result<PrimitiveDateTime, Error> {
    let text = text.trim();

    PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            text,
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
    })
    .map_err(|_| Error::InvalidTimestamp(text.to_owned()))
}

/// Format a date-time for an `<input type="datetime-local">`.
pub fn format_form_timestamp(date: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute()
    )
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (category_id, date, amount, note, version)
             VALUES (?1, ?2, ?3, ?4, 1)
             RETURNING id, category_id, date, amount, note, version",
        )?
        .query_row(
            (
                builder.category_id,
                format_timestamp(builder.date),
                builder.amount.to_string(),
                &builder.note,
            ),
            map_transaction_row,
        )
        .map_err(|error| map_category_foreign_key_error(error, builder.category_id))
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, category_id, date, amount, note, version
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Replace the fields of transaction `id` if it is still at `expected_version`.
///
/// When no row matches, the transaction is looked up again: if it still
/// exists the caller lost a race and gets [UpdateOutcome::Conflict],
/// otherwise [UpdateOutcome::NotFound]. Conflicts are never retried here.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the new category ID does not refer to a category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    expected_version: i64,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<UpdateOutcome, Error> {
    let updated = connection
        .prepare(
            "UPDATE \"transaction\"
             SET category_id = ?1, date = ?2, amount = ?3, note = ?4, version = version + 1
             WHERE id = ?5 AND version = ?6
             RETURNING id, category_id, date, amount, note, version",
        )?
        .query_row(
            (
                builder.category_id,
                format_timestamp(builder.date),
                builder.amount.to_string(),
                &builder.note,
                id,
                expected_version,
            ),
            map_transaction_row,
        )
        .optional()
        .map_err(|error| map_category_foreign_key_error(error, builder.category_id))?;

    if let Some(transaction) = updated {
        return Ok(UpdateOutcome::Updated(transaction));
    }

    match get_transaction(id, connection) {
        Ok(_) => Ok(UpdateOutcome::Conflict),
        Err(Error::NotFound) => Ok(UpdateOutcome::NotFound),
        Err(error) => Err(error),
    }
}

/// Delete transaction `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the transaction does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                note TEXT,
                version INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    // Used by every report, which all select a date range.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;

    Ok(())
}

/// Map a row of `id, category_id, date, amount, note, version` to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let category_id = row.get(1)?;
    let date = get_timestamp(row, 2)?;
    let amount = get_decimal(row, 3)?;
    let note = row.get(4)?;
    let version = row.get(5)?;

    Ok(Transaction {
        id,
        category_id,
        date,
        amount,
        note,
        version,
    })
}

/// Read a date-time column written by [format_timestamp].
pub(crate) fn get_timestamp(row: &Row, index: usize) -> Result<PrimitiveDateTime, rusqlite::Error> {
    let text: String = row.get(index)?;

    parse_timestamp(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Read a decimal column stored as text.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

fn map_category_foreign_key_error(error: rusqlite::Error, category_id: CategoryId) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidCategory(category_id),
        error => error.into(),
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        Error,
        category::{CategoryKind, CategoryTitle, NewCategory, create_category},
        database_id::CategoryId,
        db::initialize,
        transaction::{
            Transaction, UpdateOutcome, create_transaction, delete_transaction, get_transaction,
            update_transaction,
        },
    };

    fn get_test_connection() -> (Connection, CategoryId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let category = create_category(
            NewCategory {
                title: CategoryTitle::new_unchecked("Food"),
                icon: "🍽️".to_owned(),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        (conn, category.id)
    }

    #[test]
    fn create_succeeds() {
        let (conn, category_id) = get_test_connection();
        let amount = Decimal::new(1230, 2);

        let transaction = create_transaction(
            Transaction::build(category_id, amount, datetime!(2025-10-05 12:00:30)).note("Lunch"),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.amount, amount);
        assert_eq!(transaction.date, datetime!(2025-10-05 12:00:30));
        assert_eq!(transaction.note.as_deref(), Some("Lunch"));
        assert_eq!(transaction.version, 1);
    }

    #[test]
    fn create_drops_subsecond_precision() {
        let (conn, category_id) = get_test_connection();

        let transaction = create_transaction(
            Transaction::build(category_id, Decimal::ONE, datetime!(2025-10-05 12:00:30.75)),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.date, datetime!(2025-10-05 12:00:30));
    }

    #[test]
    fn blank_note_is_stored_as_none() {
        let (conn, category_id) = get_test_connection();

        let transaction = create_transaction(
            Transaction::build(category_id, Decimal::ONE, datetime!(2025-10-05 12:00)).note("  "),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.note, None);
    }

    #[test]
    fn amounts_keep_exact_decimal_value() {
        let (conn, category_id) = get_test_connection();
        let amount = Decimal::new(1, 1) + Decimal::new(2, 1);

        let created = create_transaction(
            Transaction::build(category_id, amount, datetime!(2025-10-05 12:00)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(created.id, &conn).map(|transaction| transaction.amount),
            Ok(Decimal::new(3, 1))
        );
    }

    #[test]
    fn create_fails_on_invalid_category_id() {
        let (conn, _) = get_test_connection();

        let result = create_transaction(
            Transaction::build(42, Decimal::ONE, datetime!(2025-10-04 00:00)),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(42)));
    }

    #[test]
    fn get_missing_transaction_returns_not_found() {
        let (conn, _) = get_test_connection();

        assert_eq!(get_transaction(1337, &conn), Err(Error::NotFound));
    }

    #[test]
    fn update_bumps_version() {
        let (conn, category_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(category_id, Decimal::ONE, datetime!(2025-10-04 00:00)),
            &conn,
        )
        .unwrap();

        let outcome = update_transaction(
            transaction.id,
            transaction.version,
            Transaction::build(category_id, Decimal::TWO, datetime!(2025-10-05 00:00)).note("Fixed"),
            &conn,
        )
        .unwrap();

        let want = Transaction {
            id: transaction.id,
            category_id,
            date: datetime!(2025-10-05 00:00),
            amount: Decimal::TWO,
            note: Some("Fixed".to_owned()),
            version: 2,
        };
        assert_eq!(outcome, UpdateOutcome::Updated(want.clone()));
        assert_eq!(get_transaction(transaction.id, &conn), Ok(want));
    }

    #[test]
    fn update_with_stale_version_is_a_conflict() {
        let (conn, category_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(category_id, Decimal::ONE, datetime!(2025-10-04 00:00)),
            &conn,
        )
        .unwrap();
        let edit = Transaction::build(category_id, Decimal::TEN, datetime!(2025-10-04 00:00));
        update_transaction(transaction.id, 1, edit.clone(), &conn).unwrap();

        let outcome = update_transaction(transaction.id, 1, edit, &conn).unwrap();

        assert_eq!(outcome, UpdateOutcome::Conflict);
        assert_eq!(
            get_transaction(transaction.id, &conn).map(|transaction| transaction.version),
            Ok(2)
        );
    }

    #[test]
    fn update_of_deleted_transaction_is_not_found() {
        let (conn, category_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(category_id, Decimal::ONE, datetime!(2025-10-04 00:00)),
            &conn,
        )
        .unwrap();
        delete_transaction(transaction.id, &conn).unwrap();

        let outcome = update_transaction(
            transaction.id,
            transaction.version,
            Transaction::build(category_id, Decimal::TEN, datetime!(2025-10-04 00:00)),
            &conn,
        )
        .unwrap();

        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[test]
    fn update_fails_on_invalid_category_id() {
        let (conn, category_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(category_id, Decimal::ONE, datetime!(2025-10-04 00:00)),
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            transaction.id,
            transaction.version,
            Transaction::build(999, Decimal::ONE, datetime!(2025-10-04 00:00)),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(999)));
    }

    #[test]
    fn delete_missing_transaction_is_idempotent() {
        let (conn, category_id) = get_test_connection();
        let kept = create_transaction(
            Transaction::build(category_id, Decimal::ONE, datetime!(2025-10-04 00:00)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            delete_transaction(kept.id + 1, &conn),
            Err(Error::DeleteMissingTransaction)
        );
        assert_eq!(
            delete_transaction(kept.id + 1, &conn),
            Err(Error::DeleteMissingTransaction)
        );
        assert_eq!(get_transaction(kept.id, &conn), Ok(kept));
    }
}
