//! Request extractors whose rejections use the API error body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body. A missing, malformed or mistyped body is reported as
/// `VALIDATION_FAILED` under the `body` field.
///
/// Role-gated handlers take `Result<JsonBody<T>, ApiError>` and unwrap it
/// after the role check, so an unauthorized caller gets 403 whatever it sent.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string, reported under the `query` field when it does not parse.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
