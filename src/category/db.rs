//! Database operations for categories.
//!
//! Every query is scoped to the owning user, a category owned by someone else
//! is indistinguishable from one that does not exist.

use rusqlite::{Connection, Row};

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName},
};

/// Create a category owned by `owner` and return it with its generated ID.
pub fn create_category(
    name: CategoryName,
    owner: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "INSERT INTO category (name, user_id) VALUES (?1, ?2)
             RETURNING id, name",
        )?
        .query_row((name.as_ref(), owner.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or is owned by another user.
pub fn get_category(
    category_id: CategoryId,
    owner: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name FROM category WHERE id = :id AND user_id = :user_id;")?
        .query_row(
            &[(":id", &category_id), (":user_id", &owner.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of `owner`'s categories ordered alphabetically by name.
pub fn get_categories(owner: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name FROM category WHERE user_id = :user_id ORDER BY name ASC, id ASC;",
        )?
        .query_map(&[(":user_id", &owner.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete a category by ID and return the deleted category.
///
/// Expenses in the category are kept and lose their category.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or is owned by another user.
pub fn delete_category(
    category_id: CategoryId,
    owner: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2
             RETURNING id, name",
        )?
        .query_row((category_id, owner.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(Category { id, name })
}
