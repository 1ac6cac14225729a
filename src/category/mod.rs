//! Categories group transactions and debts and decide which entry types they accept.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, get_categories,
    get_category_for_entry, seed_default_categories, update_category,
};
pub use domain::{Category, CategoryForm, CategoryName, DefaultCategory, ValidCategoryForm};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
    update_category_endpoint,
};
