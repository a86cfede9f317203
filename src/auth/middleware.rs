//! Authentication middleware that validates bearer tokens on protected routes.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{JwtKeys, TokenType, decode_token, get_user_by_id},
    db::lock_connection,
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys for verifying access tokens.
    pub jwt_keys: JwtKeys,
    /// The database connection for checking that the token's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid access token in the
/// `Authorization: Bearer` header.
///
/// The user ID is placed into the request extensions and the request is
/// executed normally if the token is valid, otherwise a 401 response is
/// returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>()
    else {
        return Error::MissingCredentials.into_response();
    };

    let Some(claims) = decode_token(bearer.token(), TokenType::Access, &state.jwt_keys) else {
        return Error::InvalidToken.into_response();
    };

    let user_result = match lock_connection(&state.db_connection) {
        Ok(connection) => get_user_by_id(claims.user_id, &connection),
        Err(error) => return error.into_response(),
    };

    match user_result {
        Ok(_) => {}
        Err(Error::NotFound) => {
            tracing::warn!("got a token for the unknown user {}", claims.user_id);
            return Error::InvalidToken.into_response();
        }
        Err(error) => return error.into_response(),
    }

    request.extensions_mut().insert(claims.user_id);

    next.run(request).await
}
