//! The endpoint for registering new users.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    AppState, Error,
    auth::{PasswordHash, Username, ValidatedPassword, create_user},
    db::lock_connection,
    extract::ApiJson,
    payload::{FieldReader, NOT_BLANK_MESSAGE},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost for hashing the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for storing the new user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response to a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    /// The name of the new user.
    pub username: Username,
}

/// Handler for registering a new user.
///
/// Responds with 201 and the new user's name on success.
///
/// # Errors
///
/// Returns an [Error::Validation] listing every problem with the username and
/// password, or [Error::DuplicateUsername] if the username is taken.
pub async fn register_user(
    State(state): State<RegistrationState>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<RegisteredUser>), Error> {
    let mut reader = FieldReader::new(&payload, false);

    let username = match reader.string("username") {
        Some(username) => reader.collect(Username::new(&username))?,
        None => None,
    };

    let password = match reader.string("password").map(|password| password.trim().to_owned()) {
        Some(password) if password.is_empty() => {
            reader.add_error("password", NOT_BLANK_MESSAGE);
            None
        }
        Some(password) => reader.collect(ValidatedPassword::new(&password))?,
        None => None,
    };

    reader.finish()?;

    let (Some(username), Some(password)) = (username, password) else {
        return Err(Error::Validation(Default::default()));
    };

    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(username, password_hash, &connection)?;

    tracing::info!("registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            username: user.username,
        }),
    ))
}
