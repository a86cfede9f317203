#![allow(missing_docs)]

//! Helpers for setting up databases, users and requests in tests.

use axum::{body::to_bytes, response::Response};
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::{
    AppState,
    auth::{
        PasswordHash, TokenType, User, UserID, Username, ValidatedPassword, create_user,
        encode_token,
    },
    db::initialize,
};

/// The password of every user made with [create_test_user].
pub const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// A cheap bcrypt cost so that tests that hash passwords stay fast.
const TEST_HASH_COST: u32 = 4;

/// An initialized in-memory database.
pub fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");
    connection
}

/// App state backed by an in-memory database.
pub fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    let mut state = AppState::new(connection, "42").expect("could not create app state");
    state.password_hash_cost = TEST_HASH_COST;
    state
}

/// Insert a user with a dummy password hash, for tests that never log in.
pub fn insert_test_user(username: &str, connection: &Connection) -> User {
    create_user(
        Username::new_unchecked(username),
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("could not create test user")
}

/// Insert a user whose password is [TEST_PASSWORD].
pub fn create_test_user(username: &str, state: &AppState) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        state.password_hash_cost,
    )
    .expect("could not hash password");
    let connection = state.db_connection.lock().unwrap();

    create_user(Username::new_unchecked(username), password_hash, &connection)
        .expect("could not create test user")
}

/// A valid access token for `user_id`.
pub fn access_token(user_id: UserID, state: &AppState) -> String {
    encode_token(
        user_id,
        TokenType::Access,
        state.access_token_duration,
        &state.jwt_keys,
    )
    .expect("could not create access token")
}

/// The value of an `Authorization` header for `token`.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Unwrap a JSON object built with [serde_json::json].
pub fn json_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Read the body of `response` as JSON.
pub async fn response_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    serde_json::from_slice(&body).expect("response body is not JSON")
}
