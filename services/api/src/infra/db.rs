use std::collections::HashMap;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
    sea_query::{Expr, Query},
};

use yamdb_api_schema::{categories, comments, genres, reviews, title_genres, titles, users};
use yamdb_core::sea_ext::DbErrExt as _;
use yamdb_domain::pagination::PageRequest;
use yamdb_domain::rating::ScoreTotals;
use yamdb_domain::user::UserRole;

use crate::domain::repository::{
    CommentRepository, ReviewRepository, TermRepository, TitleRepository, UserRepository,
};
use crate::domain::types::{
    Comment, NewComment, NewReview, NewTitle, NewUser, Review, Term, TermKind, Title,
    TitleChanges, TitleFilter, User, UserChanges,
};
use crate::error::ApiError;

fn internal(e: DbErr, what: &'static str) -> ApiError {
    ApiError::Internal(anyhow::Error::new(e).context(what))
}

fn is_missing_row(e: &DbErr) -> bool {
    matches!(e, DbErr::RecordNotUpdated | DbErr::RecordNotFound(_))
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    /// Work out which unique column a rejected write collided with.
    async fn conflict(&self, id: Option<i32>, username: Option<&str>) -> ApiError {
        let Some(username) = username else {
            return ApiError::EmailTaken;
        };
        match self.find_by_username(username).await {
            Ok(Some(other)) if Some(other.id) != id => ApiError::UsernameTaken,
            Ok(_) => ApiError::EmailTaken,
            Err(e) => e,
        }
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ApiError> {
        let mut query = users::Entity::find();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(users::Column::Username.contains(term));
        }
        let count = query
            .clone()
            .count(&self.db)
            .await
            .context("count users")?;
        let models = query
            .order_by_desc(users::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list users")?;
        let users = models
            .into_iter()
            .map(user_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, count))
    }

    async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        let inserted = users::ActiveModel {
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            bio: Set(user.bio.clone()),
            role: Set(user.role.as_str().to_owned()),
            is_superuser: Set(false),
            last_login: Set(None),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(model) => user_from_model(model),
            Err(e) if e.is_unique_violation() => {
                Err(self.conflict(None, Some(&user.username)).await)
            }
            Err(e) => Err(internal(e, "create user")),
        }
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<User, ApiError> {
        let mut am = users::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(username) = &changes.username {
            am.username = Set(username.clone());
        }
        if let Some(email) = &changes.email {
            am.email = Set(email.clone());
        }
        if let Some(first_name) = &changes.first_name {
            am.first_name = Set(first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            am.last_name = Set(last_name.clone());
        }
        if let Some(bio) = &changes.bio {
            am.bio = Set(Some(bio.clone()));
        }
        if let Some(role) = changes.role {
            am.role = Set(role.as_str().to_owned());
        }
        if !am.is_changed() {
            return self.find_by_id(id).await?.ok_or(ApiError::UserNotFound);
        }

        match am.update(&self.db).await {
            Ok(model) => user_from_model(model),
            Err(e) if is_missing_row(&e) => Err(ApiError::UserNotFound),
            Err(e) if e.is_unique_violation() => {
                Err(self.conflict(Some(id), changes.username.as_deref()).await)
            }
            Err(e) => Err(internal(e, "update user")),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }

    async fn record_login(
        &self,
        id: i32,
        previous: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<bool, ApiError> {
        let unchanged = match previous {
            Some(previous) => users::Column::LastLogin.eq(previous),
            None => users::Column::LastLogin.is_null(),
        };
        let result = users::Entity::update_many()
            .col_expr(users::Column::LastLogin, Expr::value(Some(at)))
            .filter(users::Column::Id.eq(id))
            .filter(unchanged)
            .exec(&self.db)
            .await
            .context("record user login")?;
        Ok(result.rows_affected > 0)
    }
}

fn user_from_model(model: users::Model) -> Result<User, ApiError> {
    let role = model
        .role
        .parse::<UserRole>()
        .with_context(|| format!("stored role of user {}", model.id))?;
    Ok(User {
        id: model.id,
        username: model.username,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        bio: model.bio,
        role,
        is_superuser: model.is_superuser,
        last_login: model.last_login,
        date_joined: model.date_joined,
    })
}

// ── Category repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCategoryRepository {
    pub db: DatabaseConnection,
}

impl TermRepository for DbCategoryRepository {
    const KIND: TermKind = TermKind::Category;

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Term>, u64), ApiError> {
        let mut query = categories::Entity::find();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(categories::Column::Name.contains(term));
        }
        let count = query
            .clone()
            .count(&self.db)
            .await
            .context("count categories")?;
        let models = query
            .order_by_asc(categories::Column::Name)
            .order_by_asc(categories::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list categories")?;
        Ok((models.into_iter().map(category_from_model).collect(), count))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Term>, ApiError> {
        let model = categories::Entity::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find category by slug")?;
        Ok(model.map(category_from_model))
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Term>, ApiError> {
        if slugs.is_empty() {
            return Ok(vec![]);
        }
        let models = categories::Entity::find()
            .filter(categories::Column::Slug.is_in(slugs.iter().map(String::as_str)))
            .all(&self.db)
            .await
            .context("find categories by slugs")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Term>, ApiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let models = categories::Entity::find()
            .filter(categories::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("find categories by ids")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn create(&self, name: &str, slug: &str) -> Result<Term, ApiError> {
        let inserted = categories::ActiveModel {
            name: Set(name.to_owned()),
            slug: Set(slug.to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;
        match inserted {
            Ok(model) => Ok(category_from_model(model)),
            Err(e) if e.is_unique_violation() => Err(ApiError::SlugTaken),
            Err(e) => Err(internal(e, "create category")),
        }
    }

    async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        slug: Option<&str>,
    ) -> Result<Term, ApiError> {
        let mut am = categories::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = name {
            am.name = Set(name.to_owned());
        }
        if let Some(slug) = slug {
            am.slug = Set(slug.to_owned());
        }
        if !am.is_changed() {
            let model = categories::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .context("find category by id")?;
            return model
                .map(category_from_model)
                .ok_or(ApiError::CategoryNotFound);
        }
        match am.update(&self.db).await {
            Ok(model) => Ok(category_from_model(model)),
            Err(e) if is_missing_row(&e) => Err(ApiError::CategoryNotFound),
            Err(e) if e.is_unique_violation() => Err(ApiError::SlugTaken),
            Err(e) => Err(internal(e, "update category")),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = categories::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete category")?;
        Ok(result.rows_affected > 0)
    }
}

fn category_from_model(model: categories::Model) -> Term {
    Term {
        id: model.id,
        name: model.name,
        slug: model.slug,
    }
}

// ── Genre repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbGenreRepository {
    pub db: DatabaseConnection,
}

impl TermRepository for DbGenreRepository {
    const KIND: TermKind = TermKind::Genre;

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Term>, u64), ApiError> {
        let mut query = genres::Entity::find();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(genres::Column::Name.contains(term));
        }
        let count = query
            .clone()
            .count(&self.db)
            .await
            .context("count genres")?;
        let models = query
            .order_by_asc(genres::Column::Name)
            .order_by_asc(genres::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list genres")?;
        Ok((models.into_iter().map(genre_from_model).collect(), count))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Term>, ApiError> {
        let model = genres::Entity::find()
            .filter(genres::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find genre by slug")?;
        Ok(model.map(genre_from_model))
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Term>, ApiError> {
        if slugs.is_empty() {
            return Ok(vec![]);
        }
        let models = genres::Entity::find()
            .filter(genres::Column::Slug.is_in(slugs.iter().map(String::as_str)))
            .all(&self.db)
            .await
            .context("find genres by slugs")?;
        Ok(models.into_iter().map(genre_from_model).collect())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Term>, ApiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let models = genres::Entity::find()
            .filter(genres::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("find genres by ids")?;
        Ok(models.into_iter().map(genre_from_model).collect())
    }

    async fn create(&self, name: &str, slug: &str) -> Result<Term, ApiError> {
        let inserted = genres::ActiveModel {
            name: Set(name.to_owned()),
            slug: Set(slug.to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;
        match inserted {
            Ok(model) => Ok(genre_from_model(model)),
            Err(e) if e.is_unique_violation() => Err(ApiError::SlugTaken),
            Err(e) => Err(internal(e, "create genre")),
        }
    }

    async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        slug: Option<&str>,
    ) -> Result<Term, ApiError> {
        let mut am = genres::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = name {
            am.name = Set(name.to_owned());
        }
        if let Some(slug) = slug {
            am.slug = Set(slug.to_owned());
        }
        if !am.is_changed() {
            let model = genres::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .context("find genre by id")?;
            return model.map(genre_from_model).ok_or(ApiError::GenreNotFound);
        }
        match am.update(&self.db).await {
            Ok(model) => Ok(genre_from_model(model)),
            Err(e) if is_missing_row(&e) => Err(ApiError::GenreNotFound),
            Err(e) if e.is_unique_violation() => Err(ApiError::SlugTaken),
            Err(e) => Err(internal(e, "update genre")),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = genres::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete genre")?;
        Ok(result.rows_affected > 0)
    }
}

fn genre_from_model(model: genres::Model) -> Term {
    Term {
        id: model.id,
        name: model.name,
        slug: model.slug,
    }
}

// ── Title repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTitleRepository {
    pub db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct ScoreRow {
    title_id: i32,
    score_sum: i64,
    score_count: i64,
}

fn filtered_titles(filter: &TitleFilter) -> Select<titles::Entity> {
    let mut query = titles::Entity::find();
    if let Some(slug) = &filter.category {
        query = query.filter(
            titles::Column::CategoryId.in_subquery(
                Query::select()
                    .column(categories::Column::Id)
                    .from(categories::Entity)
                    .and_where(categories::Column::Slug.eq(slug.as_str()))
                    .to_owned(),
            ),
        );
    }
    if let Some(slug) = &filter.genre {
        query = query.filter(
            titles::Column::Id.in_subquery(
                Query::select()
                    .column((title_genres::Entity, title_genres::Column::TitleId))
                    .from(title_genres::Entity)
                    .inner_join(
                        genres::Entity,
                        Expr::col((genres::Entity, genres::Column::Id))
                            .equals((title_genres::Entity, title_genres::Column::GenreId)),
                    )
                    .and_where(Expr::col((genres::Entity, genres::Column::Slug)).eq(slug.as_str()))
                    .to_owned(),
            ),
        );
    }
    if let Some(name) = &filter.name {
        query = query.filter(titles::Column::Name.eq(name.as_str()));
    }
    if let Some(year) = filter.year {
        query = query.filter(titles::Column::Year.eq(year));
    }
    query
}

/// Attach category, genres and rating to a batch of title rows.
///
/// Three queries per batch regardless of its size. Ratings come from one
/// grouped SUM/COUNT and are finished by [`ScoreTotals::rating`], so single
/// reads and list pages agree.
async fn hydrate<C: ConnectionTrait>(
    db: &C,
    models: Vec<titles::Model>,
) -> Result<Vec<Title>, ApiError> {
    if models.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let mut category_ids: Vec<i32> = models.iter().filter_map(|m| m.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();
    let categories: HashMap<i32, Term> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(db)
            .await
            .context("load title categories")?
            .into_iter()
            .map(|m| (m.id, category_from_model(m)))
            .collect()
    };

    let links = title_genres::Entity::find()
        .filter(title_genres::Column::TitleId.is_in(ids.clone()))
        .find_also_related(genres::Entity)
        .order_by_asc(genres::Column::Name)
        .all(db)
        .await
        .context("load title genres")?;
    let mut genres_by_title: HashMap<i32, Vec<Term>> = HashMap::new();
    for (link, genre) in links {
        if let Some(genre) = genre {
            genres_by_title
                .entry(link.title_id)
                .or_default()
                .push(genre_from_model(genre));
        }
    }

    let scores: HashMap<i32, ScoreTotals> = reviews::Entity::find()
        .select_only()
        .column(reviews::Column::TitleId)
        .column_as(Expr::col(reviews::Column::Score).sum(), "score_sum")
        .column_as(Expr::col(reviews::Column::Score).count(), "score_count")
        .filter(reviews::Column::TitleId.is_in(ids))
        .group_by(reviews::Column::TitleId)
        .into_model::<ScoreRow>()
        .all(db)
        .await
        .context("aggregate title scores")?
        .into_iter()
        .map(|row| (row.title_id, ScoreTotals::new(row.score_sum, row.score_count)))
        .collect();

    Ok(models
        .into_iter()
        .map(|m| Title {
            category: m.category_id.and_then(|id| categories.get(&id).cloned()),
            genres: genres_by_title.remove(&m.id).unwrap_or_default(),
            rating: scores.get(&m.id).copied().unwrap_or_default().rating(),
            id: m.id,
            name: m.name,
            year: m.year,
            description: m.description,
        })
        .collect())
}

async fn replace_genre_links<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    genre_ids: &[i32],
) -> Result<(), ApiError> {
    title_genres::Entity::delete_many()
        .filter(title_genres::Column::TitleId.eq(title_id))
        .exec(db)
        .await
        .context("clear title genres")?;
    if genre_ids.is_empty() {
        return Ok(());
    }
    title_genres::Entity::insert_many(genre_ids.iter().map(|&genre_id| {
        title_genres::ActiveModel {
            title_id: Set(title_id),
            genre_id: Set(genre_id),
            ..Default::default()
        }
    }))
    .exec(db)
    .await
    .context("link title genres")?;
    Ok(())
}

impl DbTitleRepository {
    async fn load(&self, id: i32) -> Result<Title, ApiError> {
        self.find_by_id(id).await?.ok_or(ApiError::TitleNotFound)
    }
}

impl TitleRepository for DbTitleRepository {
    async fn list(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> Result<(Vec<Title>, u64), ApiError> {
        let query = filtered_titles(filter);
        let count = query
            .clone()
            .count(&self.db)
            .await
            .context("count titles")?;
        let models = query
            .order_by_asc(titles::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list titles")?;
        Ok((hydrate(&self.db, models).await?, count))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Title>, ApiError> {
        let model = titles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find title by id")?;
        let Some(model) = model else {
            return Ok(None);
        };
        Ok(hydrate(&self.db, vec![model]).await?.pop())
    }

    async fn exists(&self, id: i32) -> Result<bool, ApiError> {
        let count = titles::Entity::find_by_id(id)
            .count(&self.db)
            .await
            .context("check title exists")?;
        Ok(count > 0)
    }

    async fn create(&self, title: &NewTitle) -> Result<Title, ApiError> {
        let txn = self.db.begin().await.context("begin create title")?;
        let model = titles::ActiveModel {
            name: Set(title.name.clone()),
            year: Set(title.year),
            description: Set(title.description.clone()),
            category_id: Set(title.category_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("insert title")?;
        replace_genre_links(&txn, model.id, &title.genre_ids).await?;
        txn.commit().await.context("commit create title")?;

        self.load(model.id).await
    }

    async fn update(&self, id: i32, changes: &TitleChanges) -> Result<Title, ApiError> {
        let txn = self.db.begin().await.context("begin update title")?;
        let exists = titles::Entity::find_by_id(id)
            .count(&txn)
            .await
            .context("check title exists")?
            > 0;
        if !exists {
            return Err(ApiError::TitleNotFound);
        }

        let mut am = titles::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = &changes.name {
            am.name = Set(name.clone());
        }
        if let Some(year) = changes.year {
            am.year = Set(year);
        }
        if let Some(description) = &changes.description {
            am.description = Set(Some(description.clone()));
        }
        if let Some(category_id) = changes.category_id {
            am.category_id = Set(Some(category_id));
        }
        if am.is_changed() {
            am.update(&txn).await.context("update title")?;
        }
        if let Some(genre_ids) = &changes.genre_ids {
            replace_genre_links(&txn, id, genre_ids).await?;
        }
        txn.commit().await.context("commit update title")?;

        self.load(id).await
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = titles::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete title")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Review repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbReviewRepository {
    pub db: DatabaseConnection,
}

impl DbReviewRepository {
    async fn load(&self, id: i32) -> Result<Review, ApiError> {
        let row = reviews::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
            .context("load review")?;
        row.map(review_from_row).ok_or(ApiError::ReviewNotFound)
    }
}

impl ReviewRepository for DbReviewRepository {
    async fn list(
        &self,
        title_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<Review>, u64), ApiError> {
        let query = reviews::Entity::find().filter(reviews::Column::TitleId.eq(title_id));
        let count = query
            .clone()
            .count(&self.db)
            .await
            .context("count reviews")?;
        let rows = query
            .find_also_related(users::Entity)
            .order_by_asc(reviews::Column::PubDate)
            .order_by_asc(reviews::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list reviews")?;
        Ok((rows.into_iter().map(review_from_row).collect(), count))
    }

    async fn find(&self, title_id: i32, review_id: i32) -> Result<Option<Review>, ApiError> {
        let row = reviews::Entity::find_by_id(review_id)
            .filter(reviews::Column::TitleId.eq(title_id))
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
            .context("find review")?;
        Ok(row.map(review_from_row))
    }

    async fn exists_for_author(&self, title_id: i32, author_id: i32) -> Result<bool, ApiError> {
        let count = reviews::Entity::find()
            .filter(reviews::Column::TitleId.eq(title_id))
            .filter(reviews::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .context("check existing review")?;
        Ok(count > 0)
    }

    async fn create(&self, review: &NewReview) -> Result<Review, ApiError> {
        let inserted = reviews::ActiveModel {
            title_id: Set(review.title_id),
            author_id: Set(review.author_id),
            text: Set(review.text.clone()),
            score: Set(review.score),
            pub_date: Set(review.pub_date),
            ..Default::default()
        }
        .insert(&self.db)
        .await;
        match inserted {
            Ok(model) => self.load(model.id).await,
            // Two concurrent creations for the same pair race to the unique index.
            Err(e) if e.is_unique_violation() => Err(ApiError::ReviewAlreadyExists),
            Err(e) => Err(internal(e, "create review")),
        }
    }

    async fn update(
        &self,
        id: i32,
        text: Option<&str>,
        score: Option<i32>,
    ) -> Result<Review, ApiError> {
        let mut am = reviews::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(text) = text {
            am.text = Set(text.to_owned());
        }
        if let Some(score) = score {
            am.score = Set(score);
        }
        if am.is_changed() {
            match am.update(&self.db).await {
                Ok(_) => {}
                Err(e) if is_missing_row(&e) => return Err(ApiError::ReviewNotFound),
                Err(e) => return Err(internal(e, "update review")),
            }
        }
        self.load(id).await
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = reviews::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete review")?;
        Ok(result.rows_affected > 0)
    }
}

fn review_from_row((model, author): (reviews::Model, Option<users::Model>)) -> Review {
    Review {
        id: model.id,
        title_id: model.title_id,
        author_id: model.author_id,
        author: author.map(|u| u.username).unwrap_or_default(),
        text: model.text,
        score: model.score,
        pub_date: model.pub_date,
    }
}

// ── Comment repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCommentRepository {
    pub db: DatabaseConnection,
}

impl DbCommentRepository {
    async fn load(&self, id: i32) -> Result<Comment, ApiError> {
        let row = comments::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
            .context("load comment")?;
        row.map(comment_from_row).ok_or(ApiError::CommentNotFound)
    }
}

impl CommentRepository for DbCommentRepository {
    async fn list(
        &self,
        review_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<Comment>, u64), ApiError> {
        let query = comments::Entity::find().filter(comments::Column::ReviewId.eq(review_id));
        let count = query
            .clone()
            .count(&self.db)
            .await
            .context("count comments")?;
        let rows = query
            .find_also_related(users::Entity)
            .order_by_asc(comments::Column::PubDate)
            .order_by_asc(comments::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list comments")?;
        Ok((rows.into_iter().map(comment_from_row).collect(), count))
    }

    async fn find(&self, review_id: i32, comment_id: i32) -> Result<Option<Comment>, ApiError> {
        let row = comments::Entity::find_by_id(comment_id)
            .filter(comments::Column::ReviewId.eq(review_id))
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
            .context("find comment")?;
        Ok(row.map(comment_from_row))
    }

    async fn create(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        let inserted = comments::ActiveModel {
            review_id: Set(comment.review_id),
            author_id: Set(comment.author_id),
            text: Set(comment.text.clone()),
            pub_date: Set(comment.pub_date),
            ..Default::default()
        }
        .insert(&self.db)
        .await;
        match inserted {
            Ok(model) => self.load(model.id).await,
            Err(e) => Err(internal(e, "create comment")),
        }
    }

    async fn update(&self, id: i32, text: &str) -> Result<Comment, ApiError> {
        let am = comments::ActiveModel {
            id: Unchanged(id),
            text: Set(text.to_owned()),
            ..Default::default()
        };
        match am.update(&self.db).await {
            Ok(_) => self.load(id).await,
            Err(e) if is_missing_row(&e) => Err(ApiError::CommentNotFound),
            Err(e) => Err(internal(e, "update comment")),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = comments::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete comment")?;
        Ok(result.rows_affected > 0)
    }
}

fn comment_from_row((model, author): (comments::Model, Option<users::Model>)) -> Comment {
    Comment {
        id: model.id,
        review_id: model.review_id,
        author_id: model.author_id,
        author: author.map(|u| u.username).unwrap_or_default(),
        text: model.text,
        pub_date: model.pub_date,
    }
}
