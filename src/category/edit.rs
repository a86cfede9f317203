//! Category update endpoints for full (PUT) and partial (PATCH) updates.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, CategoryId, get_category, parse_category_payload, update_category},
    db::lock_connection,
    extract::{ApiJson, ApiPath},
};

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Replace one of the caller's categories.
pub async fn update_category_endpoint(
    State(state): State<UpdateCategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Category>, Error> {
    update(state, user_id, category_id, &payload, false)
}

/// Update the fields given in the request body of one of the caller's categories.
pub async fn partial_update_category_endpoint(
    State(state): State<UpdateCategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Category>, Error> {
    update(state, user_id, category_id, &payload, true)
}

fn update(
    state: UpdateCategoryState,
    user_id: UserID,
    category_id: CategoryId,
    payload: &Map<String, Value>,
    partial: bool,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    // Missing categories are reported before invalid request bodies.
    let category = get_category(category_id, user_id, &connection)?;

    let category = match parse_category_payload(payload, partial)? {
        Some(name) => update_category(category_id, user_id, name, &connection)?,
        None => category,
    };

    Ok(Json(category))
}
