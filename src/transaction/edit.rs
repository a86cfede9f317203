//! Transaction update endpoints for full (PUT) and partial (PATCH) updates.

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
    db::lock_connection,
    extract::{ApiJson, ApiPath},
    transaction::{
        Transaction, TransactionBuilder, TransactionId, get_transaction,
        parse_transaction_payload, update_transaction,
    },
};

/// The state needed for updating a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Replace one of the caller's transactions.
///
/// The description may be left out, in which case it is unchanged.
pub async fn update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Transaction>, Error> {
    update(state, user_id, transaction_id, &payload, false)
}

/// Update the fields given in the request body of one of the caller's transactions.
pub async fn partial_update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Transaction>, Error> {
    update(state, user_id, transaction_id, &payload, true)
}

fn update(
    state: UpdateTransactionState,
    user_id: UserID,
    transaction_id: TransactionId,
    payload: &Map<String, Value>,
    partial: bool,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    // Missing transactions are reported before invalid request bodies.
    let existing = get_transaction(transaction_id, user_id, &connection)?;

    let builder = parse_transaction_payload(payload, partial, user_id, &connection)?
        .apply_to(TransactionBuilder::from(&existing));
    let transaction = update_transaction(transaction_id, user_id, builder, &connection)?;

    Ok(Json(transaction))
}
