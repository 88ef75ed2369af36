//! First-run data: default categories and a handful of sample transactions.

use std::collections::HashMap;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use time::{Duration, PrimitiveDateTime};

use crate::{
    Error,
    category::{CategoryKind, CategoryTitle, NewCategory, create_category},
    transaction::{Transaction, create_transaction},
};

const DEFAULT_CATEGORIES: [(&str, &str, CategoryKind); 15] = [
    ("Food & Dining", "🍽️", CategoryKind::Expense),
    ("Transportation", "🚗", CategoryKind::Expense),
    ("Shopping", "🛒", CategoryKind::Expense),
    ("Entertainment", "🎬", CategoryKind::Expense),
    ("Bills & Utilities", "💡", CategoryKind::Expense),
    ("Healthcare", "⚕️", CategoryKind::Expense),
    ("Education", "📚", CategoryKind::Expense),
    ("Travel", "✈️", CategoryKind::Expense),
    ("Groceries", "🥕", CategoryKind::Expense),
    ("Clothing", "👕", CategoryKind::Expense),
    ("Salary", "💼", CategoryKind::Income),
    ("Freelance", "💻", CategoryKind::Income),
    ("Investment", "📈", CategoryKind::Income),
    ("Gift", "🎁", CategoryKind::Income),
    ("Other Income", "💰", CategoryKind::Income),
];

/// (category title, amount, days before now, note)
const SAMPLE_TRANSACTIONS: [(&str, i64, i64, &str); 7] = [
    ("Salary", 5000, 25, "Monthly Salary"),
    ("Groceries", 150, 5, "Weekly Groceries"),
    ("Food & Dining", 45, 3, "Lunch with colleagues"),
    ("Transportation", 25, 2, "Gas for car"),
    ("Entertainment", 30, 1, "Movie tickets"),
    ("Bills & Utilities", 120, 10, "Electricity bill"),
    ("Freelance", 800, 7, "Website project"),
];

/// Add the default categories and sample transactions to an empty database.
///
/// Nothing is written if any category already exists. Sample transactions
/// are dated relative to `now`. Returns whether the database was seeded.
///
/// # Errors
/// Returns an [Error::SqlError] if an insert fails, in which case nothing is
/// written.
pub fn seed_database(connection: &Connection, now: PrimitiveDateTime) -> Result<bool, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let category_count: u32 =
        transaction.query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))?;

    if category_count > 0 {
        tracing::debug!("Skipping seeding, found {category_count} existing categories");
        return Ok(false);
    }

    let mut category_ids = HashMap::new();

    for (title, icon, kind) in DEFAULT_CATEGORIES {
        let category = create_category(
            NewCategory {
                title: CategoryTitle::new_unchecked(title),
                icon: icon.to_owned(),
                kind,
            },
            &transaction,
        )?;
        category_ids.insert(title, category.id);
    }

    for (title, amount, days_ago, note) in SAMPLE_TRANSACTIONS {
        let category_id = category_ids
            .get(title)
            .copied()
            .ok_or(Error::NotFound)?;

        create_transaction(
            Transaction::build(
                category_id,
                Decimal::from(amount),
                now - Duration::days(days_ago),
            )
            .note(note),
            &transaction,
        )?;
    }

    transaction.commit()?;

    tracing::info!(
        "Seeded database with {} categories and {} transactions",
        DEFAULT_CATEGORIES.len(),
        SAMPLE_TRANSACTIONS.len()
    );

    Ok(true)
}
