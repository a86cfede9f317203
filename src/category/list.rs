//! Endpoints for listing categories and retrieving a single category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, CategoryId, get_all_categories, get_category},
    db::lock_connection,
    extract::ApiPath,
};

/// The state needed for reading categories.
#[derive(Debug, Clone)]
pub struct ListCategoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListCategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the caller's categories ordered by name.
pub async fn list_categories_endpoint(
    State(state): State<ListCategoriesState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let categories = get_all_categories(user_id, &connection)?;

    Ok(Json(categories))
}

/// Retrieve one of the caller's categories.
pub async fn get_category_endpoint(
    State(state): State<ListCategoriesState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let category = get_category(category_id, user_id, &connection)?;

    Ok(Json(category))
}
