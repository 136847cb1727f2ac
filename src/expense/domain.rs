//! Core expense domain types: amounts, transaction types and dates.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    Error,
    category::{Category, CategoryId},
};

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// The maximum number of characters in an expense description.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// The label used for expenses whose category has been deleted.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Whether money left or entered the user's pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    Expense,
    Income,
}

impl ExpenseType {
    /// The lowercase form used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseType::Expense => "expense",
            ExpenseType::Income => "income",
        }
    }

    /// The capitalised form used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseType::Expense => "Expense",
            ExpenseType::Income => "Income",
        }
    }
}

impl Display for ExpenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ExpenseType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ExpenseType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "expense" => Ok(ExpenseType::Expense),
            "income" => Ok(ExpenseType::Income),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A non-negative amount of money with exactly two decimal places.
///
/// Amounts are held as whole cents so that sums are exact. The direction of
/// the money is carried by [ExpenseType], never by the sign of the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount {
    cents: i64,
}

impl Amount {
    /// Create an amount from a decimal, rounding to the nearest cent with
    /// halves rounded away from zero.
    ///
    /// # Errors
    ///
    /// Returns [Error::NegativeAmount] if `value` is below zero, or
    /// [Error::AmountOutOfRange] if the number of cents does not fit in an `i64`.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value < Decimal::ZERO {
            return Err(Error::NegativeAmount);
        }

        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Amount::from_cents)
            .ok_or(Error::AmountOutOfRange)
    }

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// The amount as a decimal with a scale of two, e.g. `20.00`.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.cents, 2)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.to_decimal()
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount::from_cents)
    }
}

/// Parse a transaction date.
///
/// Accepts an RFC 3339 date-time in any offset or a plain `YYYY-MM-DD` date,
/// which is read as midnight UTC. The result is in UTC with whole seconds.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `raw_date` is in neither format.
pub fn parse_date(raw_date: &str) -> Result<OffsetDateTime, Error> {
    let raw_date = raw_date.trim();

    let date_time = match OffsetDateTime::parse(raw_date, &Rfc3339) {
        Ok(date_time) => date_time,
        Err(_) => Date::parse(raw_date, format_description!("[year]-[month]-[day]"))
            .map(|date| date.midnight().assume_utc())
            .map_err(|_| Error::InvalidDate(raw_date.to_owned()))?,
    };

    Ok(normalize_date(date_time))
}

/// Convert `date_time` to UTC and drop any fractional seconds.
pub fn normalize_date(date_time: OffsetDateTime) -> OffsetDateTime {
    let date_time = date_time.to_offset(UtcOffset::UTC);

    date_time.replace_nanosecond(0).unwrap_or(date_time)
}

/// A single income or expense transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: Amount,
    pub description: String,
    /// When the transaction happened, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    /// `None` once the expense's category has been deleted.
    pub category: Option<Category>,
}

impl Expense {
    /// The name of the expense's category, or [UNCATEGORIZED_LABEL].
    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|category| category.name.as_ref())
            .unwrap_or(UNCATEGORIZED_LABEL)
    }
}

/// The validated fields for creating or replacing an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseData {
    pub amount: Amount,
    pub description: String,
    /// `None` stamps the current time on create and keeps the stored date on update.
    pub date: Option<OffsetDateTime>,
    pub expense_type: ExpenseType,
    pub category_id: CategoryId,
}

/// Check that `description` is not too long.
///
/// # Errors
///
/// Returns [Error::DescriptionTooLong] if it has more than [MAX_DESCRIPTION_LENGTH] characters.
pub fn validate_description(description: &str) -> Result<(), Error> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        Err(Error::DescriptionTooLong(MAX_DESCRIPTION_LENGTH))
    } else {
        Ok(())
    }
}



#[cfg(test)]
mod expense_type_tests {
    use crate::expense::ExpenseType;

    #[test]
    fn deserializes_closed_set() {
        assert_eq!(
            serde_json::from_str::<ExpenseType>("\"income\"").unwrap(),
            ExpenseType::Income
        );
        assert!(serde_json::from_str::<ExpenseType>("\"refund\"").is_err());
        assert!(serde_json::from_str::<ExpenseType>("\"Expense\"").is_err());
    }
}
