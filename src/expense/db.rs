//! Database operations for expenses.

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName},
    expense::{Expense, ExpenseData, ExpenseId, normalize_date},
};

const SELECT_EXPENSE: &str = "SELECT expense.id, expense.amount, expense.description, expense.date,
        expense.type, category.id, category.name
    FROM expense
    LEFT JOIN category ON category.id = expense.category_id";

/// Create the expense table and its indexes.
///
/// Deleting a category clears the category of its expenses rather than
/// deleting them.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            description TEXT NOT NULL,
            date INTEGER NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
            category_id INTEGER,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
    )?;

    Ok(())
}

/// Create an expense owned by `owner`.
///
/// If `data.date` is `None` the expense is dated now.
///
/// # Errors
/// Returns [Error::InvalidCategory] if `data.category_id` does not refer to one of `owner`'s categories.
pub fn create_expense(
    data: ExpenseData,
    owner: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    let transaction = connection.unchecked_transaction()?;

    ensure_category_owned(data.category_id, owner, &transaction)?;

    let date = normalize_date(data.date.unwrap_or_else(OffsetDateTime::now_utc));

    let expense_id: ExpenseId = transaction
        .prepare(
            "INSERT INTO expense (amount, description, date, type, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
        )?
        .query_row(
            (
                data.amount,
                &data.description,
                date.unix_timestamp(),
                data.expense_type,
                data.category_id,
                owner.as_i64(),
            ),
            |row| row.get(0),
        )?;

    let expense = get_expense(expense_id, owner, &transaction)?;
    transaction.commit()?;

    Ok(expense)
}

/// Retrieve one of `owner`'s expenses.
///
/// # Errors
/// Returns [Error::NotFound] if the expense does not exist or is owned by another user.
pub fn get_expense(
    expense_id: ExpenseId,
    owner: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "{SELECT_EXPENSE} WHERE expense.id = ?1 AND expense.user_id = ?2"
        ))?
        .query_row((expense_id, owner.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of `owner`'s expenses, most recent first.
pub fn get_expenses(owner: UserID, connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_EXPENSE} WHERE expense.user_id = ?1
             ORDER BY expense.date DESC, expense.id DESC"
        ))?
        .query_map([owner.as_i64()], map_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Retrieve `owner`'s expenses dated within `start..=end`, most recent first.
pub fn get_expenses_in_window(
    owner: UserID,
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_EXPENSE} WHERE expense.user_id = ?1 AND expense.date BETWEEN ?2 AND ?3
             ORDER BY expense.date DESC, expense.id DESC"
        ))?
        .query_map(
            (owner.as_i64(), start.unix_timestamp(), end.unix_timestamp()),
            map_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of one of `owner`'s expenses.
///
/// If `data.date` is `None` the stored date is kept.
///
/// # Errors
/// Returns [Error::NotFound] if the expense does not exist or is owned by
/// another user, then [Error::InvalidCategory] if the new category is not one
/// of `owner`'s categories.
pub fn update_expense(
    expense_id: ExpenseId,
    data: ExpenseData,
    owner: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    let transaction = connection.unchecked_transaction()?;

    let exists = transaction
        .query_row(
            "SELECT 1 FROM expense WHERE id = ?1 AND user_id = ?2",
            (expense_id, owner.as_i64()),
            |_| Ok(()),
        )
        .optional()?;

    if exists.is_none() {
        return Err(Error::NotFound);
    }

    ensure_category_owned(data.category_id, owner, &transaction)?;

    let date = data.date.map(|date| normalize_date(date).unix_timestamp());

    transaction.execute(
        "UPDATE expense
         SET amount = ?1, description = ?2, date = COALESCE(?3, date), type = ?4, category_id = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            data.amount,
            &data.description,
            date,
            data.expense_type,
            data.category_id,
            expense_id,
            owner.as_i64(),
        ),
    )?;

    let expense = get_expense(expense_id, owner, &transaction)?;
    transaction.commit()?;

    Ok(expense)
}

/// Delete one of `owner`'s expenses and return it as it was before deletion.
///
/// # Errors
/// Returns [Error::NotFound] if the expense does not exist or is owned by another user.
pub fn delete_expense(
    expense_id: ExpenseId,
    owner: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    let transaction = connection.unchecked_transaction()?;

    let expense = get_expense(expense_id, owner, &transaction)?;
    transaction.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (expense_id, owner.as_i64()),
    )?;

    transaction.commit()?;

    Ok(expense)
}

fn ensure_category_owned(
    category_id: CategoryId,
    owner: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let owned = connection
        .query_row(
            "SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, owner.as_i64()),
            |_| Ok(()),
        )
        .optional()?;

    match owned {
        Some(()) => Ok(()),
        None => Err(Error::InvalidCategory(category_id)),
    }
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let timestamp: i64 = row.get(3)?;
    let date = OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(error))
        })?;

    let category_id: Option<CategoryId> = row.get(5)?;
    let category_name: Option<String> = row.get(6)?;
    let category = match (category_id, category_name) {
        (Some(id), Some(name)) => Some(Category {
            id,
            name: CategoryName::new_unchecked(&name),
        }),
        _ => None,
    };

    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        date,
        expense_type: row.get(4)?,
        category,
    })
}
