//! Category creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, create_category, parse_new_category},
    db::lock_connection,
    extract::ApiJson,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a category owned by the caller.
///
/// Any owner given in the request body is ignored.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let name = parse_new_category(&payload)?;

    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(name, user_id, &connection)?;

    tracing::debug!("user {user_id} created category {}", category.id);

    Ok((StatusCode::CREATED, Json(category)))
}
