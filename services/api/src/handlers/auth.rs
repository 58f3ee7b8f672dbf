use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::extract::JsonBody;
use crate::state::AppState;
use crate::usecase::signup::{SignupInput, SignupUseCase};
use crate::usecase::token::{ObtainTokenInput, ObtainTokenUseCase};

// ── POST /auth/signup ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

pub async fn signup(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let usecase = SignupUseCase {
        users: state.user_repo(),
        codes: state.confirmation_codes.clone(),
        mailer: state.mailer.clone(),
        from_email: state.from_email.to_string(),
    };
    let user = usecase
        .execute(SignupInput {
            username: body.username,
            email: body.email,
        })
        .await?;
    Ok(Json(SignupResponse {
        username: user.username,
        email: user.email,
    }))
}

// ── POST /auth/token ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub confirmation_code: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn obtain_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let usecase = ObtainTokenUseCase {
        users: state.user_repo(),
        codes: state.confirmation_codes.clone(),
        jwt_secret: state.jwt_secret.0.clone(),
        access_token_ttl_secs: state.access_token_ttl_secs,
    };
    let token = usecase
        .execute(ObtainTokenInput {
            username: body.username,
            confirmation_code: body.confirmation_code,
        })
        .await?;
    Ok(Json(TokenResponse { token }))
}
