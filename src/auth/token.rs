//! JSON web tokens used for authenticating API requests.
//!
//! A client logs in once to receive a short-lived access token and a longer
//! lived refresh token. The access token goes in the `Authorization: Bearer`
//! header of each request, and the refresh token is exchanged for a new
//! access token when the old one expires.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The default duration for which access tokens are valid.
pub const DEFAULT_ACCESS_TOKEN_DURATION: Duration = Duration::minutes(5);
/// The default duration for which refresh tokens are valid.
pub const DEFAULT_REFRESH_TOKEN_DURATION: Duration = Duration::days(1);

/// Distinguishes access tokens from refresh tokens so that one cannot be
/// used in place of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Authorizes requests to protected routes.
    Access,
    /// Can only be exchanged for a new access token.
    Refresh,
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// What the token may be used for.
    pub token_type: TokenType,
    /// The time the token was issued as a UNIX timestamp.
    pub iat: i64,
    /// The expiry time of the token as a UNIX timestamp.
    pub exp: i64,
}

/// The keys for signing and verifying tokens, derived from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the HMAC keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

/// An access token and refresh token issued at log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// The token for authorizing requests.
    pub access: String,
    /// The token for getting new access tokens.
    pub refresh: String,
}

/// Create a signed token of `token_type` for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    token_type: TokenType,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        user_id,
        token_type,
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and check that it is a `token_type` token.
///
/// Returns `None` if the token is not valid for `token_type`.
pub fn decode_token(token: &str, token_type: TokenType, keys: &JwtKeys) -> Option<Claims> {
    let claims = match decode::<Claims>(
        token,
        &keys.decoding_key,
        &Validation::new(Algorithm::HS256),
    ) {
        Ok(token_data) => token_data.claims,
        Err(error) => {
            tracing::debug!("could not decode token: {error}");
            return None;
        }
    };

    if claims.token_type != token_type {
        tracing::debug!(
            "got a {:?} token where a {:?} token was expected",
            claims.token_type,
            token_type
        );
        return None;
    }

    Some(claims)
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::auth::UserID;

    use super::{JwtKeys, TokenType, decode_token, encode_token};

    fn get_keys() -> JwtKeys {
        JwtKeys::new("nafstenoas")
    }

    #[test]
    fn decode_gives_encoded_user() {
        let keys = get_keys();
        let token = encode_token(
            UserID::new(42),
            TokenType::Access,
            Duration::minutes(5),
            &keys,
        )
        .unwrap();

        let claims = decode_token(&token, TokenType::Access, &keys).unwrap();

        assert_eq!(claims.user_id, UserID::new(42));
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn decode_rejects_wrong_token_type() {
        let keys = get_keys();
        let token = encode_token(
            UserID::new(1),
            TokenType::Refresh,
            Duration::days(1),
            &keys,
        )
        .unwrap();

        assert!(decode_token(&token, TokenType::Access, &keys).is_none());
        assert!(decode_token(&token, TokenType::Refresh, &keys).is_some());
    }

    #[test]
    fn decode_rejects_expired_token() {
        let keys = get_keys();
        // Past the default leeway of 60 seconds.
        let token = encode_token(
            UserID::new(1),
            TokenType::Access,
            Duration::minutes(-5),
            &keys,
        )
        .unwrap();

        assert!(decode_token(&token, TokenType::Access, &keys).is_none());
    }

    #[test]
    fn decode_rejects_token_signed_with_other_secret() {
        let token = encode_token(
            UserID::new(1),
            TokenType::Access,
            Duration::minutes(5),
            &JwtKeys::new("some other secret"),
        )
        .unwrap();

        assert!(decode_token(&token, TokenType::Access, &get_keys()).is_none());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_token("FOOBAR", TokenType::Access, &get_keys()).is_none());
    }
}
