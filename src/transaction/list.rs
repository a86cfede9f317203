//! Endpoints for reading transactions: the filtered list, a single
//! transaction, and the months that have transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    extract::ApiPath,
    transaction::{
        Transaction, TransactionId, TransactionQueryParams, get_transaction,
        query_transaction_months, query_transactions,
    },
};

/// The state needed for reading transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the caller's transactions, filtered and sorted by the query string.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let params: TransactionQueryParams = query.into_iter().collect();
    let (filter, sort) = params.list_query()?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = query_transactions(user_id, &filter, sort, &connection)?;

    tracing::debug!(
        "listing {} transaction(s) for user {user_id} with {filter:?}",
        transactions.len()
    );

    Ok(Json(transactions))
}

/// Retrieve one of the caller's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(transaction))
}

/// List the distinct months, newest first, of the caller's transactions.
///
/// The `type`, `category` and `q` filters apply. `month` and `sort` are ignored.
pub async fn list_transaction_months_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<String>>, Error> {
    let params: TransactionQueryParams = query.into_iter().collect();
    let filter = params.lenient_filter();

    let connection = lock_connection(&state.db_connection)?;
    let months = query_transaction_months(user_id, &filter, &connection)?;

    Ok(Json(months))
}
