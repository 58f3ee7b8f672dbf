use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::Page;

use crate::domain::policy;
use crate::error::ApiError;
use crate::handlers::extract::{JsonBody, QueryParams};
use crate::handlers::{ListQuery, TermRequest, TermResponse};
use crate::state::AppState;
use crate::usecase::term::{
    CreateTermInput, CreateTermUseCase, DeleteTermUseCase, GetTermUseCase, ListTermsUseCase,
    UpdateTermInput, UpdateTermUseCase,
};

// ── GET /categories ──────────────────────────────────────────────────────────

pub async fn list_categories(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Page<TermResponse>>, ApiError> {
    let usecase = ListTermsUseCase {
        repo: state.category_repo(),
    };
    let page = usecase
        .execute(query.search.as_deref(), query.page_request(state.page_size))
        .await?;
    Ok(Json(page.map(TermResponse::from)))
}

// ── POST /categories ─────────────────────────────────────────────────────────

pub async fn create_category(
    caller: Caller,
    State(state): State<AppState>,
    body: Result<JsonBody<TermRequest>, ApiError>,
) -> Result<(StatusCode, Json<TermResponse>), ApiError> {
    policy::require_admin(&caller)?;
    let JsonBody(body) = body?;
    let usecase = CreateTermUseCase {
        repo: state.category_repo(),
    };
    let term = usecase
        .execute(
            &caller,
            CreateTermInput {
                name: body.name.unwrap_or_default(),
                slug: body.slug.unwrap_or_default(),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(term.into())))
}

// ── GET /categories/{slug} ───────────────────────────────────────────────────

pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TermResponse>, ApiError> {
    let usecase = GetTermUseCase {
        repo: state.category_repo(),
    };
    Ok(Json(usecase.execute(&slug).await?.into()))
}

// ── PATCH /categories/{slug} ─────────────────────────────────────────────────

pub async fn update_category(
    caller: Caller,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Result<JsonBody<TermRequest>, ApiError>,
) -> Result<Json<TermResponse>, ApiError> {
    policy::require_admin(&caller)?;
    let JsonBody(body) = body?;
    let usecase = UpdateTermUseCase {
        repo: state.category_repo(),
    };
    let term = usecase
        .execute(
            &caller,
            &slug,
            UpdateTermInput {
                name: body.name,
                slug: body.slug,
            },
        )
        .await?;
    Ok(Json(term.into()))
}

// ── DELETE /categories/{slug} ────────────────────────────────────────────────

pub async fn delete_category(
    caller: Caller,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteTermUseCase {
        repo: state.category_repo(),
    };
    usecase.execute(&caller, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
