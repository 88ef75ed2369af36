//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId};

/// Whether money in a category is coming in or going out.
///
/// Every report branches on this: income categories add to the income total,
/// expense categories to the expense total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryKind {
    /// Money earned, e.g. salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl CategoryKind {
    /// The string stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "Income",
            CategoryKind::Expense => "Expense",
        }
    }
}

impl Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            _ => Err(Error::InvalidCategoryKind(s.to_owned())),
        }
    }
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A validated, non-empty category title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryTitle(String);

impl CategoryTitle {
    /// Create a category title.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryTitle] if `title` is
    /// empty or only whitespace.
    pub fn new(title: &str) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            Err(Error::EmptyCategoryTitle)
        } else {
            Ok(Self(title.to_string()))
        }
    }

    /// Create a category title without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(title: &str) -> Self {
        Self(title.to_string())
    }
}

impl AsRef<str> for CategoryTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryTitle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryTitle::new(s)
    }
}

impl Display for CategoryTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A label for grouping transactions, e.g. 'Groceries' or 'Salary'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The unique, case-insensitive name of the category.
    pub title: CategoryTitle,
    /// A display glyph, usually a single emoji.
    pub icon: String,
    /// Whether transactions in this category count as income or expense.
    pub kind: CategoryKind,
}

impl Category {
    /// The icon followed by the title, e.g. "🥕 Groceries".
    pub fn title_with_icon(&self) -> String {
        if self.icon.is_empty() {
            self.title.to_string()
        } else {
            format!("{} {}", self.icon, self.title)
        }
    }
}

/// The fields needed to create or replace a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// The name of the category.
    pub title: CategoryTitle,
    /// A display glyph, may be empty.
    pub icon: String,
    /// Income or expense.
    pub kind: CategoryKind,
}

/// Form data for category creation and editing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    /// The raw title, trimmed during validation.
    pub title: String,
    /// The raw icon, trimmed during validation.
    #[serde(default)]
    pub icon: String,
    /// Either "income" or "expense".
    #[serde(rename = "type_")]
    pub kind: String,
}

impl CategoryFormData {
    /// Validate the form.
    ///
    /// # Errors
    /// Returns [Error::EmptyCategoryTitle] or [Error::InvalidCategoryKind]
    /// if the respective field is invalid.
    pub fn validate(&self) -> Result<NewCategory, Error> {
        Ok(NewCategory {
            title: CategoryTitle::new(&self.title)?,
            icon: self.icon.trim().to_owned(),
            kind: self.kind.parse()?,
        })
    }
}
