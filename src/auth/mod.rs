//! User accounts, password hashing and bearer token authentication.

mod log_in;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use log_in::{post_token, post_token_refresh};
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::register_user;
pub use token::{
    DEFAULT_ACCESS_TOKEN_DURATION, DEFAULT_REFRESH_TOKEN_DURATION, JwtKeys, TokenPair, TokenType,
    decode_token, encode_token,
};
pub use user::{
    User, UserID, Username, create_user, create_user_table, get_user_by_id, get_user_by_username,
    update_password,
};
