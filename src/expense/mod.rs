//! Income and expense transactions, each owned by a user and filed under one of their categories.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_expense, create_expense_table, delete_expense, get_expense, get_expenses,
    get_expenses_in_window, update_expense,
};
pub use domain::{
    Amount, Expense, ExpenseData, ExpenseId, ExpenseType, MAX_DESCRIPTION_LENGTH,
    UNCATEGORIZED_LABEL, normalize_date, parse_date, validate_description,
};
pub use endpoints::{
    DeletedExpense, ExpenseForm, ExpenseState, create_expense_endpoint, delete_expense_endpoint,
    get_expense_endpoint, get_expenses_endpoint, update_expense_endpoint,
};
