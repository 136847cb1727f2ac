//! User-owned categories for grouping expenses.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, get_categories, get_category,
};
pub use domain::{Category, CategoryId, CategoryName, MAX_CATEGORY_NAME_LENGTH};
pub use endpoints::{
    CategoryData, CategoryState, create_category_endpoint, delete_category_endpoint,
    get_categories_endpoint, get_category_endpoint,
};
