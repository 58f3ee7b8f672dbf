//! Bearer-token caller extractor.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Header};
use http::StatusCode;
use http::header::AUTHORIZATION;
use http::request::Parts;

use yamdb_domain::user::{Tier, UserRole};

use crate::token::validate_access_token;

/// HMAC secret used to validate access tokens. Provide it from the app state
/// with a `FromRef` impl.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }
}

/// Stored role of the account a token names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountStanding {
    pub role: UserRole,
    pub is_superuser: bool,
}

impl AccountStanding {
    /// Superusers act as admins whatever their stored role.
    pub fn effective_role(self) -> UserRole {
        if self.is_superuser {
            UserRole::Admin
        } else {
            self.role
        }
    }
}

/// Looks up token subjects. Implemented by the app state.
///
/// `Ok(None)` means the account no longer exists.
pub trait AccountDirectory: Send + Sync {
    fn standing(
        &self,
        user_id: i32,
    ) -> impl Future<Output = anyhow::Result<Option<AccountStanding>>> + Send;
}

/// Who is making the request.
///
/// No `Authorization` header yields [`Caller::Anonymous`]. A header that is
/// present but not a valid, unexpired bearer token for an existing account is
/// rejected with 401. `role` is the account's effective role at request time.
/// Tier enforcement (403) is done by use cases after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Account { user_id: i32, role: UserRole },
}

impl Caller {
    pub fn tier(&self) -> Tier {
        match self {
            Self::Anonymous => Tier::Anonymous,
            Self::Account { role, .. } => Tier::from_account(*role, false),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        match self {
            Self::Anonymous => None,
            Self::Account { user_id, .. } => Some(*user_id),
        }
    }
}

/// Rejection of the `Caller` extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRejection {
    /// Header present but not a valid bearer token.
    InvalidToken,
    /// Token is valid but its account was deleted.
    UnknownAccount,
    /// Account lookup failed.
    Unavailable,
}

impl IntoResponse for CallerRejection {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "invalid token"),
            Self::UnknownAccount => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "account no longer exists",
            ),
            Self::Unavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "internal server error",
            ),
        };
        let body = serde_json::json!({ "kind": kind, "message": message });
        (status, axum::Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    JwtSecret: FromRef<S>,
    S: AccountDirectory,
{
    type Rejection = CallerRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Caller::Anonymous);
        }

        let mut values = parts.headers.get_all(AUTHORIZATION).iter();
        let header =
            Authorization::<Bearer>::decode(&mut values).map_err(|_| CallerRejection::InvalidToken)?;
        let secret = JwtSecret::from_ref(state);
        let info = validate_access_token(header.token(), &secret.0).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            CallerRejection::InvalidToken
        })?;

        let standing = state
            .standing(info.user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, user_id = info.user_id, "account lookup failed");
                CallerRejection::Unavailable
            })?
            .ok_or_else(|| {
                tracing::debug!(user_id = info.user_id, "token subject no longer exists");
                CallerRejection::UnknownAccount
            })?;

        Ok(Caller::Account {
            user_id: info.user_id,
            role: standing.effective_role(),
        })
    }
}
