use std::str::FromStr;

use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    Error,
    category::{Category, CategoryKind},
    database_id::CategoryId,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    transaction::{
        Transaction, TransactionBuilder,
        core::{format_form_timestamp, parse_form_timestamp},
    },
};

/// Form data for creating and editing transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFormData {
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// The raw amount, parsed during validation.
    pub amount: String,
    /// A `datetime-local` value, blank means now.
    #[serde(default)]
    pub date: String,
    /// An optional note, blank means none.
    #[serde(default)]
    pub note: String,
    /// The version of the transaction when the edit form was loaded.
    #[serde(default)]
    pub version: Option<i64>,
}

impl TransactionFormData {
    /// Validate the form, using `now` when the date was left blank.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] or [Error::InvalidTimestamp] if the
    /// respective field is invalid.
    pub fn validate(&self, now: PrimitiveDateTime) -> Result<TransactionBuilder, Error> {
        let amount = parse_amount(&self.amount)?;
        let date = if self.date.trim().is_empty() {
            now
        } else {
            parse_form_timestamp(&self.date)?
        };

        Ok(Transaction::build(self.category_id, amount, date).note(&self.note))
    }
}

/// The largest amount a single transaction can have.
const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Parse a non-negative amount of at most [MAX_AMOUNT] with whole cents.
fn parse_amount(text: &str) -> Result<Decimal, Error> {
    let text = text.trim();

    match Decimal::from_str(text) {
        Ok(amount)
            if (!amount.is_sign_negative() || amount.is_zero())
                && amount <= Decimal::from(MAX_AMOUNT)
                && amount.normalize().scale() <= 2 =>
        {
            Ok(amount)
        }
        _ => Err(Error::InvalidAmount(text.to_owned())),
    }
}

/// Values to pre-fill the transaction form with.
pub struct TransactionFormDefaults<'a> {
    /// The category to select, the first option if `None`.
    pub category_id: Option<CategoryId>,
    /// The amount to fill in, blank if `None`.
    pub amount: Option<Decimal>,
    /// The date and time to fill in.
    pub date: PrimitiveDateTime,
    /// The note to fill in, blank if `None`.
    pub note: Option<&'a str>,
}

/// The inputs of the transaction form, without the surrounding `<form>`.
///
/// Categories are grouped by type so that the select box reads
/// "Expense: 🥕 Groceries, ..." then "Income: 💼 Salary, ...".
pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    categories: &[Category],
) -> Markup {
    let amount = defaults.amount.map(|amount| format!("{:.2}", amount));
    let groups = [CategoryKind::Expense, CategoryKind::Income].map(|kind| {
        (
            kind,
            categories
                .iter()
                .filter(|category| category.kind == kind)
                .collect::<Vec<_>>(),
        )
    });

    html! {
        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select
                id="category_id"
                name="category_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for (kind, group) in &groups {
                    @if !group.is_empty() {
                        optgroup label=(kind)
                        {
                            @for category in group {
                                option
                                    value=(category.id)
                                    selected[defaults.category_id == Some(category.id)]
                                {
                                    (category.title_with_icon())
                                }
                            }
                        }
                    }
                }
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0"
                    max=(MAX_AMOUNT)
                    placeholder="0.00"
                    required
                    autofocus
                    value=[amount.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="datetime-local"
                value=(format_form_timestamp(defaults.date))
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="note" class=(FORM_LABEL_STYLE) { "Note" }

            input
                name="note"
                id="note"
                type="text"
                placeholder="What was it for?"
                value=[defaults.note]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}
