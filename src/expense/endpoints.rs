//! Route handlers for expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, User,
    category::CategoryId,
    db::lock_connection,
    expense::{
        Amount, Expense, ExpenseData, ExpenseId, ExpenseType, create_expense, delete_expense,
        get_expense, get_expenses, parse_date, update_expense, validate_description,
    },
};

/// The state needed by the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or replacing an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseForm {
    /// Accepts a JSON number or a numeric string.
    pub amount: Decimal,
    pub description: String,
    /// An RFC 3339 date-time or a `YYYY-MM-DD` date.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    pub category_id: CategoryId,
}

impl TryFrom<ExpenseForm> for ExpenseData {
    type Error = Error;

    fn try_from(form: ExpenseForm) -> Result<Self, Self::Error> {
        let amount = Amount::new(form.amount)?;
        validate_description(&form.description)?;
        let date = form.date.as_deref().map(parse_date).transpose()?;

        Ok(ExpenseData {
            amount,
            description: form.description,
            date,
            expense_type: form.expense_type,
            category_id: form.category_id,
        })
    }
}

/// The confirmation sent after deleting an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedExpense {
    pub message: String,
    /// The name of the category the expense was in.
    pub category: String,
    pub amount: Amount,
}

impl From<Expense> for DeletedExpense {
    fn from(expense: Expense) -> Self {
        let category = expense.category_name().to_owned();

        Self {
            message: format!(
                "Deleted {category} {} of amount {}",
                expense.expense_type, expense.amount
            ),
            category,
            amount: expense.amount,
        }
    }
}

pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<User>,
    Json(form): Json<ExpenseForm>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let data = ExpenseData::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;
    let expense = create_expense(data, user.id, &connection)?;

    tracing::debug!("user {} created expense {}", user.id, expense.id);

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Expense>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_expenses(user.id, &connection).map(Json)
}

pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<User>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_expense(expense_id, user.id, &connection).map(Json)
}

/// Replace an expense. Omitting `date` keeps the stored date.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<User>,
    Path(expense_id): Path<ExpenseId>,
    Json(form): Json<ExpenseForm>,
) -> Result<Json<Expense>, Error> {
    let data = ExpenseData::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    update_expense(expense_id, data, user.id, &connection).map(Json)
}

pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<User>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<DeletedExpense>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let expense = delete_expense(expense_id, user.id, &connection)?;

    tracing::info!("user {} deleted expense {}", user.id, expense.id);

    Ok(Json(DeletedExpense::from(expense)))
}

#[cfg(test)]
mod expense_form_tests {
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        Error,
        category::{Category, CategoryName},
        expense::{Amount, Expense, ExpenseData, ExpenseType},
    };

    use super::{DeletedExpense, ExpenseForm};

    fn form() -> ExpenseForm {
        ExpenseForm {
            amount: dec!(12.345),
            description: "lunch".to_owned(),
            date: Some("2025-03-14".to_owned()),
            expense_type: ExpenseType::Expense,
            category_id: 1,
        }
    }

    #[test]
    fn converts_valid_form() {
        let data = ExpenseData::try_from(form()).unwrap();

        assert_eq!(
            data,
            ExpenseData {
                amount: Amount::from_cents(1235),
                description: "lunch".to_owned(),
                date: Some(datetime!(2025-03-14 0:00 UTC)),
                expense_type: ExpenseType::Expense,
                category_id: 1,
            }
        );
    }

    #[test]
    fn rejects_negative_amount() {
        let result = ExpenseData::try_from(ExpenseForm {
            amount: dec!(-1),
            ..form()
        });

        assert_eq!(result, Err(Error::NegativeAmount));
    }

    #[test]
    fn rejects_long_description() {
        let result = ExpenseData::try_from(ExpenseForm {
            description: "a".repeat(201),
            ..form()
        });

        assert_eq!(result, Err(Error::DescriptionTooLong(200)));
    }

    #[test]
    fn rejects_bad_date() {
        let result = ExpenseData::try_from(ExpenseForm {
            date: Some("14/03/2025".to_owned()),
            ..form()
        });

        assert_eq!(result, Err(Error::InvalidDate("14/03/2025".to_owned())));
    }

    #[test]
    fn deserializes_without_date() {
        let form: ExpenseForm = serde_json::from_str(
            r#"{"amount": 20, "description": "lunch", "type": "income", "category_id": 3}"#,
        )
        .unwrap();

        assert_eq!(form.date, None);
        assert_eq!(form.expense_type, ExpenseType::Income);
    }

    #[test]
    fn deletion_confirmation_names_category_and_amount() {
        let expense = Expense {
            id: 1,
            amount: Amount::from_cents(2000),
            description: "lunch".to_owned(),
            date: datetime!(2025-03-14 0:00 UTC),
            expense_type: ExpenseType::Expense,
            category: Some(Category {
                id: 1,
                name: CategoryName::new_unchecked("Food"),
            }),
        };

        let confirmation = DeletedExpense::from(expense);

        assert_eq!(confirmation.message, "Deleted Food expense of amount 20.00");
        assert_eq!(confirmation.category, "Food");
        assert_eq!(confirmation.amount, Amount::from_cents(2000));
    }
}
