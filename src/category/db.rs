//! Database operations for categories.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    category::{Category, CategoryTitle, NewCategory},
    database_id::CategoryId,
};

/// Create a category and return it with its generated ID.
pub fn create_category(category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (title, icon, type) VALUES (?1, ?2, ?3);",
        (category.title.as_ref(), &category.icon, category.kind),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        title: category.title,
        icon: category.icon,
        kind: category.kind,
    })
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, title, icon, type FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories, income first, then alphabetically by title.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, title, icon, type FROM category ORDER BY type DESC, title ASC;")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Replace a category's title, icon and type.
///
/// # Errors
/// Returns:
/// - [Error::UpdateMissingCategory] if the category doesn't exist,
/// - [Error::CategoryKindLocked] if the type would change while transactions
///   refer to the category.
pub fn update_category(
    category_id: CategoryId,
    category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let current = match get_category(category_id, connection) {
        Ok(current) => current,
        Err(Error::NotFound) => return Err(Error::UpdateMissingCategory),
        Err(error) => return Err(error),
    };

    if current.kind != category.kind && count_category_transactions(category_id, connection)? > 0
    {
        return Err(Error::CategoryKindLocked);
    }

    let rows_affected = connection.execute(
        "UPDATE category SET title = ?1, icon = ?2, type = ?3 WHERE id = ?4",
        (
            category.title.as_ref(),
            &category.icon,
            category.kind,
            category_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(Category {
        id: category_id,
        title: category.title,
        icon: category.icon,
        kind: category.kind,
    })
}

/// Delete a category by ID.
///
/// Categories that transactions still refer to are never deleted.
///
/// # Errors
/// Returns:
/// - [Error::DeleteMissingCategory] if the category doesn't exist,
/// - [Error::CategoryInUse] with the number of referring transactions.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let exists = connection
        .query_row(
            "SELECT 1 FROM category WHERE id = ?1",
            [category_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if !exists {
        return Err(Error::DeleteMissingCategory);
    }

    let transaction_count = count_category_transactions(category_id, connection)?;

    if transaction_count > 0 {
        return Err(Error::CategoryInUse(transaction_count));
    }

    connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    Ok(())
}

/// Count the transactions that belong to each category.
///
/// Categories without transactions are absent from the map.
pub fn count_transactions_per_category(
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare("SELECT category_id, COUNT(1) FROM \"transaction\" GROUP BY category_id")?
        .query_map((), |row| {
            let category_id = row.get(0)?;
            let count = row.get(1)?;

            Ok((category_id, count))
        })?
        .collect();

    result.map_err(Error::from)
}

fn count_category_transactions(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM \"transaction\" WHERE category_id = ?1",
            [category_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            icon TEXT NOT NULL,
            type TEXT NOT NULL CHECK(type IN ('Income', 'Expense'))
        );

        CREATE INDEX IF NOT EXISTS idx_category_type ON category(type);",
    )?;

    Ok(())
}

/// Map a row of `id, title, icon, type` starting at column `offset`.
///
/// The offset lets queries that join the transaction table read the category
/// columns from the end of the row.
pub fn map_category_row_with_offset(row: &Row, offset: usize) -> Result<Category, rusqlite::Error> {
    let id = row.get(offset)?;
    let raw_title: String = row.get(offset + 1)?;
    let title = CategoryTitle::new_unchecked(&raw_title);
    let icon = row.get(offset + 2)?;
    let kind = row.get(offset + 3)?;

    Ok(Category {
        id,
        title,
        icon,
        kind,
    })
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    map_category_row_with_offset(row, 0)
}
