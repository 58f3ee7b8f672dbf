use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::Page;

use crate::domain::policy;
use crate::domain::types::{RelationKey, Title, TitleFilter};
use crate::error::ApiError;
use crate::handlers::extract::{JsonBody, QueryParams};
use crate::handlers::{TermResponse, page_request};
use crate::state::AppState;
use crate::usecase::title::{
    CreateTitleUseCase, DeleteTitleUseCase, GetTitleUseCase, ListTitlesUseCase, TitleInput,
    UpdateTitleUseCase,
};

#[derive(Serialize)]
pub struct TitleResponse {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub rating: Option<i32>,
    pub description: Option<String>,
    pub genre: Vec<TermResponse>,
    pub category: Option<TermResponse>,
}

impl From<Title> for TitleResponse {
    fn from(title: Title) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            rating: title.rating,
            description: title.description,
            genre: title.genres.into_iter().map(TermResponse::from).collect(),
            category: title.category.map(TermResponse::from),
        }
    }
}

/// Write body. `genre` and `category` hold slugs or ids depending on the
/// configured relation lookup.
#[derive(Deserialize)]
pub struct TitleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub genre: Option<Vec<RelationKey>>,
    pub category: Option<RelationKey>,
}

impl From<TitleRequest> for TitleInput {
    fn from(body: TitleRequest) -> Self {
        Self {
            name: body.name,
            year: body.year,
            description: body.description,
            category: body.category,
            genre: body.genre,
        }
    }
}

// ── GET /titles ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TitleListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

pub async fn list_titles(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TitleListQuery>,
) -> Result<Json<Page<TitleResponse>>, ApiError> {
    let usecase = ListTitlesUseCase {
        titles: state.title_repo(),
    };
    let page = page_request(query.page, query.page_size, state.page_size);
    let filter = TitleFilter {
        category: query.category,
        genre: query.genre,
        name: query.name,
        year: query.year,
    };
    let titles = usecase.execute(filter, page).await?;
    Ok(Json(titles.map(TitleResponse::from)))
}

// ── POST /titles ─────────────────────────────────────────────────────────────

pub async fn create_title(
    caller: Caller,
    State(state): State<AppState>,
    body: Result<JsonBody<TitleRequest>, ApiError>,
) -> Result<(StatusCode, Json<TitleResponse>), ApiError> {
    policy::require_admin(&caller)?;
    let JsonBody(body) = body?;
    let usecase = CreateTitleUseCase {
        titles: state.title_repo(),
        categories: state.category_repo(),
        genres: state.genre_repo(),
        lookup: state.relation_lookup,
    };
    let title = usecase.execute(&caller, body.into()).await?;
    Ok((StatusCode::CREATED, Json(title.into())))
}

// ── GET /titles/{title_id} ───────────────────────────────────────────────────

pub async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<Json<TitleResponse>, ApiError> {
    let usecase = GetTitleUseCase {
        titles: state.title_repo(),
    };
    Ok(Json(usecase.execute(title_id).await?.into()))
}

// ── PATCH /titles/{title_id} ─────────────────────────────────────────────────

pub async fn update_title(
    caller: Caller,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    body: Result<JsonBody<TitleRequest>, ApiError>,
) -> Result<Json<TitleResponse>, ApiError> {
    policy::require_admin(&caller)?;
    let JsonBody(body) = body?;
    let usecase = UpdateTitleUseCase {
        titles: state.title_repo(),
        categories: state.category_repo(),
        genres: state.genre_repo(),
        lookup: state.relation_lookup,
    };
    let title = usecase.execute(&caller, title_id, body.into()).await?;
    Ok(Json(title.into()))
}

// ── DELETE /titles/{title_id} ────────────────────────────────────────────────

pub async fn delete_title(
    caller: Caller,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteTitleUseCase {
        titles: state.title_repo(),
    };
    usecase.execute(&caller, title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
