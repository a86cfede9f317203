//! Request extractors whose rejections are rendered with the app's error envelopes.

use axum::extract::{FromRequest, FromRequestParts};

use crate::Error;

/// Like [axum::Json], but a malformed body is rejected with [Error::MalformedJson]
/// (or [Error::UnsupportedMediaType]) instead of axum's plain text response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Like [axum::extract::Path], but a path parameter that cannot be parsed is
/// rejected with [Error::NotFound].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);
