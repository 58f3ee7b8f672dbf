//! One record type per CSV fixture file.
//!
//! Column names follow the fixture files, so titles carry `category` and
//! feedback carries `author` where the tables store `category_id` and
//! `author_id`.

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use yamdb_api_schema::{categories, comments, genres, reviews, title_genres, titles, users};
use yamdb_domain::rating::is_valid_score;
use yamdb_domain::user::UserRole;

/// A CSV record that becomes exactly one row of `ActiveModel`'s table.
pub trait CsvRow: DeserializeOwned {
    /// File name inside the import directory.
    const FILE: &'static str;

    type ActiveModel: ActiveModelTrait + Send;

    fn into_active_model(self) -> anyhow::Result<Self::ActiveModel>;
}

// ── users.csv ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl CsvRow for UserRow {
    const FILE: &'static str = "users.csv";
    type ActiveModel = users::ActiveModel;

    fn into_active_model(self) -> anyhow::Result<users::ActiveModel> {
        let role = match self.role.as_deref() {
            Some(role) => role
                .parse::<UserRole>()
                .with_context(|| format!("user {}", self.id))?,
            None => UserRole::default(),
        };
        Ok(users::ActiveModel {
            id: Set(self.id),
            username: Set(self.username),
            email: Set(self.email),
            first_name: Set(self.first_name.unwrap_or_default()),
            last_name: Set(self.last_name.unwrap_or_default()),
            bio: Set(self.bio),
            role: Set(role.as_str().to_owned()),
            is_superuser: Set(false),
            last_login: Set(None),
            date_joined: Set(Utc::now()),
        })
    }
}

// ── category.csv / genre.csv ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl CsvRow for CategoryRow {
    const FILE: &'static str = "category.csv";
    type ActiveModel = categories::ActiveModel;

    fn into_active_model(self) -> anyhow::Result<categories::ActiveModel> {
        Ok(categories::ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            slug: Set(self.slug),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GenreRow {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl CsvRow for GenreRow {
    const FILE: &'static str = "genre.csv";
    type ActiveModel = genres::ActiveModel;

    fn into_active_model(self) -> anyhow::Result<genres::ActiveModel> {
        Ok(genres::ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            slug: Set(self.slug),
        })
    }
}

// ── titles.csv / genre_title.csv ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TitleRow {
    pub id: i32,
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<i32>,
}

impl CsvRow for TitleRow {
    const FILE: &'static str = "titles.csv";
    type ActiveModel = titles::ActiveModel;

    fn into_active_model(self) -> anyhow::Result<titles::ActiveModel> {
        Ok(titles::ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            year: Set(self.year),
            description: Set(self.description),
            category_id: Set(self.category),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GenreTitleRow {
    pub id: i32,
    pub title_id: i32,
    pub genre_id: i32,
}

impl CsvRow for GenreTitleRow {
    const FILE: &'static str = "genre_title.csv";
    type ActiveModel = title_genres::ActiveModel;

    fn into_active_model(self) -> anyhow::Result<title_genres::ActiveModel> {
        Ok(title_genres::ActiveModel {
            id: Set(self.id),
            title_id: Set(self.title_id),
            genre_id: Set(self.genre_id),
        })
    }
}

// ── review.csv / comments.csv ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewRow {
    pub id: i32,
    pub title_id: i32,
    pub text: String,
    pub author: i32,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

impl CsvRow for ReviewRow {
    const FILE: &'static str = "review.csv";
    type ActiveModel = reviews::ActiveModel;

    fn into_active_model(self) -> anyhow::Result<reviews::ActiveModel> {
        anyhow::ensure!(
            is_valid_score(self.score),
            "review {}: score {} out of range",
            self.id,
            self.score
        );
        Ok(reviews::ActiveModel {
            id: Set(self.id),
            title_id: Set(self.title_id),
            author_id: Set(self.author),
            text: Set(self.text),
            score: Set(self.score),
            pub_date: Set(self.pub_date),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRow {
    pub id: i32,
    pub review_id: i32,
    pub text: String,
    pub author: i32,
    pub pub_date: DateTime<Utc>,
}

impl CsvRow for CommentRow {
    const FILE: &'static str = "comments.csv";
    type ActiveModel = comments::ActiveModel;

    fn into_active_model(self) -> anyhow::Result<comments::ActiveModel> {
        Ok(comments::ActiveModel {
            id: Set(self.id),
            review_id: Set(self.review_id),
            author_id: Set(self.author),
            text: Set(self.text),
            pub_date: Set(self.pub_date),
        })
    }
}
