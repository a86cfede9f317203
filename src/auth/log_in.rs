//! Endpoints for exchanging credentials for tokens and refreshing access tokens.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde_json::{Map, Value, json};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{JwtKeys, TokenPair, TokenType, decode_token, encode_token, get_user_by_username},
    db::lock_connection,
    extract::ApiJson,
    payload::{FieldReader, NOT_BLANK_MESSAGE},
};

/// The state needed to issue tokens.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The keys for signing and verifying tokens.
    pub jwt_keys: JwtKeys,
    /// How long new access tokens are valid for.
    pub access_token_duration: Duration,
    /// How long new refresh tokens are valid for.
    pub refresh_token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            access_token_duration: state.access_token_duration,
            refresh_token_duration: state.refresh_token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials sent to the token endpoint.
#[derive(Clone, Debug)]
pub struct LogInData {
    /// The name of the user logging in.
    pub username: String,
    /// The user's password in plain text.
    pub password: String,
}

impl LogInData {
    /// Read the credentials from a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if either field is missing, null or blank.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, Error> {
        let mut reader = FieldReader::new(payload, false);

        let username = reader.string("username").map(|name| name.trim().to_owned());
        let password = reader.string("password").map(|password| password.trim().to_owned());

        if username.as_deref() == Some("") {
            reader.add_error("username", NOT_BLANK_MESSAGE);
        }

        if password.as_deref() == Some("") {
            reader.add_error("password", NOT_BLANK_MESSAGE);
        }

        reader.finish()?;

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            _ => Err(Error::InvalidCredentials),
        }
    }
}

/// Handler for log-in requests via the POST method.
///
/// On success, returns an access token and a refresh token for the user.
///
/// # Errors
///
/// Returns an [Error::InvalidCredentials] if the username is not registered
/// or the password is wrong.
pub async fn post_token(
    State(state): State<LogInState>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<TokenPair>, Error> {
    let credentials = LogInData::from_payload(&payload)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_username(&credentials.username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    tracing::info!("issued tokens to user {}", user.id);

    Ok(Json(TokenPair {
        access: encode_token(
            user.id,
            TokenType::Access,
            state.access_token_duration,
            &state.jwt_keys,
        )?,
        refresh: encode_token(
            user.id,
            TokenType::Refresh,
            state.refresh_token_duration,
            &state.jwt_keys,
        )?,
    }))
}

/// Handler for exchanging a refresh token for a new access token.
///
/// # Errors
///
/// Returns an [Error::InvalidRefreshToken] if the refresh token is invalid,
/// expired or is an access token.
pub async fn post_token_refresh(
    State(state): State<LogInState>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>, Error> {
    let mut reader = FieldReader::new(&payload, false);
    let refresh = reader.string("refresh");
    reader.finish()?;

    let claims = refresh
        .and_then(|token| decode_token(&token, TokenType::Refresh, &state.jwt_keys))
        .ok_or(Error::InvalidRefreshToken)?;

    let access = encode_token(
        claims.user_id,
        TokenType::Access,
        state.access_token_duration,
        &state.jwt_keys,
    )?;

    Ok(Json(json!({ "access": access })))
}

#[cfg(test)]
mod log_in_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        auth::{TokenPair, TokenType, decode_token},
        endpoints,
        test_utils::{TEST_PASSWORD, create_test_user, get_test_app_state},
    };

    use super::{post_token, post_token_refresh};

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::TOKEN, post(post_token))
            .route(endpoints::TOKEN_REFRESH, post(post_token_refresh))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_app_state();
        let user = create_test_user("alice", &state);
        let keys = state.jwt_keys.clone();
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TOKEN)
            .json(&json!({"username": "alice", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let tokens: TokenPair = response.json();
        let access = decode_token(&tokens.access, TokenType::Access, &keys).unwrap();
        let refresh = decode_token(&tokens.refresh, TokenType::Refresh, &keys).unwrap();
        assert_eq!(access.user_id, user.id);
        assert_eq!(refresh.user_id, user.id);
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let state = get_test_app_state();
        create_test_user("alice", &state);
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TOKEN)
            .json(&json!({"username": "alice", "password": "wrongpassword"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({
            "detail": "No active account found with the given credentials"
        }));
    }

    #[tokio::test]
    async fn log_in_ignores_whitespace_around_password() {
        let state = get_test_app_state();
        create_test_user("alice", &state);
        let server = get_test_server(state);

        server
            .post(endpoints::TOKEN)
            .json(&json!({"username": "alice", "password": format!(" {TEST_PASSWORD}\n")}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_user() {
        let server = get_test_server(get_test_app_state());

        server
            .post(endpoints::TOKEN)
            .json(&json!({"username": "nobody", "password": TEST_PASSWORD}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server(get_test_app_state());

        let response = server.post(endpoints::TOKEN).json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"errors": {
            "password": ["This field is required."],
            "username": ["This field is required."],
        }}));
    }

    #[tokio::test]
    async fn refresh_issues_new_access_token() {
        let state = get_test_app_state();
        let user = create_test_user("alice", &state);
        let keys = state.jwt_keys.clone();
        let server = get_test_server(state);
        let tokens: TokenPair = server
            .post(endpoints::TOKEN)
            .json(&json!({"username": "alice", "password": TEST_PASSWORD}))
            .await
            .json();

        let response = server
            .post(endpoints::TOKEN_REFRESH)
            .json(&json!({"refresh": tokens.refresh}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let access = body["access"].as_str().expect("access token missing");
        let claims = decode_token(access, TokenType::Access, &keys).unwrap();
        assert_eq!(claims.user_id, user.id);
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let state = get_test_app_state();
        create_test_user("alice", &state);
        let server = get_test_server(state);
        let tokens: TokenPair = server
            .post(endpoints::TOKEN)
            .json(&json!({"username": "alice", "password": TEST_PASSWORD}))
            .await
            .json();

        let response = server
            .post(endpoints::TOKEN_REFRESH)
            .json(&json!({"refresh": tokens.access}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({"detail": "Token is invalid or expired"}));
    }

    #[tokio::test]
    async fn refresh_requires_token() {
        let server = get_test_server(get_test_app_state());

        let response = server.post(endpoints::TOKEN_REFRESH).json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"errors": {"refresh": ["This field is required."]}}));
    }
}
