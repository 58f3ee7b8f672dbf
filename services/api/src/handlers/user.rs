use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::Page;
use yamdb_domain::user::UserRole;

use crate::domain::policy;
use crate::domain::types::{User, UserChanges};
use crate::error::ApiError;
use crate::handlers::extract::{JsonBody, QueryParams};
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::user::{
    CreateUserInput, CreateUserUseCase, DeleteUserUseCase, GetMeUseCase, GetUserUseCase,
    ListUsersUseCase, UpdateMeUseCase, UpdateUserUseCase,
};

#[derive(Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

#[derive(Deserialize)]
pub struct UserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

impl From<UserRequest> for UserChanges {
    fn from(body: UserRequest) -> Self {
        Self {
            username: body.username,
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
            bio: body.bio,
            role: body.role,
        }
    }
}

// ── GET /users ───────────────────────────────────────────────────────────────

pub async fn list_users(
    caller: Caller,
    State(state): State<AppState>,
    query: Result<QueryParams<ListQuery>, ApiError>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    policy::require_admin(&caller)?;
    let QueryParams(query) = query?;
    let usecase = ListUsersUseCase {
        repo: state.user_repo(),
    };
    let page = usecase
        .execute(
            &caller,
            query.search.as_deref(),
            query.page_request(state.page_size),
        )
        .await?;
    Ok(Json(page.map(UserResponse::from)))
}

// ── POST /users ──────────────────────────────────────────────────────────────

pub async fn create_user(
    caller: Caller,
    State(state): State<AppState>,
    body: Result<JsonBody<UserRequest>, ApiError>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    policy::require_admin(&caller)?;
    let JsonBody(body) = body?;
    let usecase = CreateUserUseCase {
        repo: state.user_repo(),
    };
    let user = usecase
        .execute(
            &caller,
            CreateUserInput {
                username: body.username.unwrap_or_default(),
                email: body.email.unwrap_or_default(),
                first_name: body.first_name,
                last_name: body.last_name,
                bio: body.bio,
                role: body.role,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── GET /users/{username} ────────────────────────────────────────────────────

pub async fn get_user(
    caller: Caller,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let usecase = GetUserUseCase {
        repo: state.user_repo(),
    };
    Ok(Json(usecase.execute(&caller, &username).await?.into()))
}

// ── PATCH /users/{username} ──────────────────────────────────────────────────

pub async fn update_user(
    caller: Caller,
    State(state): State<AppState>,
    Path(username): Path<String>,
    body: Result<JsonBody<UserRequest>, ApiError>,
) -> Result<Json<UserResponse>, ApiError> {
    policy::require_admin(&caller)?;
    let JsonBody(body) = body?;
    let usecase = UpdateUserUseCase {
        repo: state.user_repo(),
    };
    let user = usecase.execute(&caller, &username, body.into()).await?;
    Ok(Json(user.into()))
}

// ── DELETE /users/{username} ─────────────────────────────────────────────────

pub async fn delete_user(
    caller: Caller,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteUserUseCase {
        repo: state.user_repo(),
    };
    usecase.execute(&caller, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /users/me ────────────────────────────────────────────────────────────

pub async fn get_me(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let usecase = GetMeUseCase {
        repo: state.user_repo(),
    };
    Ok(Json(usecase.execute(&caller).await?.into()))
}

// ── PATCH /users/me ──────────────────────────────────────────────────────────

pub async fn update_me(
    caller: Caller,
    State(state): State<AppState>,
    body: Result<JsonBody<UserRequest>, ApiError>,
) -> Result<Json<UserResponse>, ApiError> {
    policy::require_account(&caller)?;
    let JsonBody(body) = body?;
    let usecase = UpdateMeUseCase {
        repo: state.user_repo(),
    };
    let user = usecase.execute(&caller, body.into()).await?;
    Ok(Json(user.into()))
}
