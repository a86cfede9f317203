//! Categories that group a user's transactions.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    create_category, create_category_table, delete_category, get_all_categories, get_category,
    get_category_owner, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryName, parse_category_payload, parse_new_category};
pub use edit::{partial_update_category_endpoint, update_category_endpoint};
pub use list::{get_category_endpoint, list_categories_endpoint};
