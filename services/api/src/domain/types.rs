use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use yamdb_domain::rating::is_valid_score;
use yamdb_domain::user::UserRole;

use crate::error::ApiError;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 256;
pub const SLUG_MAX_LEN: usize = 50;

/// Path segment that addresses the caller's own profile; never a valid username.
pub const RESERVED_USERNAME: &str = "me";

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

// ── Catalog ──────────────────────────────────────────────────────────────────

/// Which catalog vocabulary a [`Term`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Category,
    Genre,
}

impl TermKind {
    pub fn not_found(self) -> ApiError {
        match self {
            Self::Category => ApiError::CategoryNotFound,
            Self::Genre => ApiError::GenreNotFound,
        }
    }
}

/// A category or genre: a named catalog entry addressed by its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category: Option<Term>,
    pub genres: Vec<Term>,
    /// Rounded mean review score; `None` without reviews.
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub genre_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    /// Replaces the whole genre set when present.
    pub genre_ids: Option<Vec<i32>>,
}

/// Equality filters for title listings. Category and genre match by slug.
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

/// How title write bodies reference genres and categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationLookup {
    #[default]
    Slug,
    Id,
}

impl FromStr for RelationLookup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slug" => Ok(Self::Slug),
            "id" => Ok(Self::Id),
            other => Err(format!("unknown relation lookup: {other}")),
        }
    }
}

/// A genre or category reference as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RelationKey {
    Id(i32),
    Text(String),
}

// ── Feedback ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: i32,
    pub title_id: i32,
    pub author_id: i32,
    pub author: String,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub title_id: i32,
    pub author_id: i32,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i32,
    pub review_id: i32,
    pub author_id: i32,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub review_id: i32,
    pub author_id: i32,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

// ── Mail ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Letters, digits and `_ . @ + -`, at most 150 characters, never `me`.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("this field may not be blank");
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err("ensure this field has no more than 150 characters");
    }
    if username == RESERVED_USERNAME {
        return Err("username \"me\" is reserved");
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if !username.chars().all(allowed) {
        return Err("may contain only letters, digits and @/./+/-/_ characters");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("this field may not be blank");
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err("ensure this field has no more than 254 characters");
    }
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !well_formed || email.chars().any(char::is_whitespace) {
        return Err("enter a valid email address");
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), &'static str> {
    if slug.is_empty() {
        return Err("this field may not be blank");
    }
    if slug.len() > SLUG_MAX_LEN {
        return Err("ensure this field has no more than 50 characters");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("may contain only latin letters, digits, hyphens and underscores");
    }
    Ok(())
}

/// Non-blank and at most `max` characters.
pub fn validate_text(value: &str, max: Option<usize>) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("this field may not be blank");
    }
    if max.is_some_and(|max| value.chars().count() > max) {
        return Err("value is too long");
    }
    Ok(())
}

pub fn validate_person_name(value: &str) -> Result<(), &'static str> {
    if value.chars().count() > PERSON_NAME_MAX_LEN {
        return Err("ensure this field has no more than 150 characters");
    }
    Ok(())
}

/// Release years in the future are rejected.
pub fn validate_year(year: i32, current_year: i32) -> Result<(), &'static str> {
    if year > current_year {
        return Err("year cannot be in the future");
    }
    Ok(())
}

pub fn validate_score(score: i32) -> Result<(), &'static str> {
    if !is_valid_score(score) {
        return Err("score must be between 1 and 10");
    }
    Ok(())
}
