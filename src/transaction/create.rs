//! Transaction creation endpoint.

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
    db::lock_connection,
    extract::ApiJson,
    transaction::{Transaction, create_transaction, parse_transaction_payload},
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Record a transaction for the caller in one of the caller's categories.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let builder = parse_transaction_payload(&payload, false, user_id, &connection)?.into_builder()?;
    let transaction = create_transaction(builder, user_id, &connection)?;

    tracing::debug!("user {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}
