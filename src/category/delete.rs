//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{CategoryId, delete_category},
    db::lock_connection,
    extract::ApiPath,
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete one of the caller's categories.
///
/// Responds with 204 on success, or 409 if any transactions still use the category.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match delete_category(category_id, user_id, &connection) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(Error::CategoryInUse(count)) => {
            tracing::warn!(
                "refused to delete category {category_id}, it is used by {count} transaction(s)"
            );
            Err(Error::CategoryInUse(count))
        }
        Err(error) => Err(error),
    }
}
