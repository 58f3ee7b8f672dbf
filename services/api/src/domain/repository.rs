#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use yamdb_domain::pagination::PageRequest;

use crate::domain::types::{
    Comment, Email, NewComment, NewReview, NewTitle, NewUser, Review, Term, TermKind, Title,
    TitleChanges, TitleFilter, User, UserChanges,
};
use crate::error::ApiError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    /// Newest accounts first, optionally filtered by username substring.
    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ApiError>;

    /// Fails with `UsernameTaken` or `EmailTaken` on a uniqueness violation.
    async fn create(&self, user: &NewUser) -> Result<User, ApiError>;
    async fn update(&self, id: i32, changes: &UserChanges) -> Result<User, ApiError>;

    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;

    /// Move `last_login` from `previous` to `at`. Returns `false` when another
    /// login moved it first.
    async fn record_login(
        &self,
        id: i32,
        previous: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<bool, ApiError>;
}

/// Repository for one catalog vocabulary (categories or genres).
pub trait TermRepository: Send + Sync {
    const KIND: TermKind;

    /// Ordered by name, optionally filtered by name substring.
    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Term>, u64), ApiError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Term>, ApiError>;
    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Term>, ApiError>;
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Term>, ApiError>;

    /// Fails with `SlugTaken` on a uniqueness violation.
    async fn create(&self, name: &str, slug: &str) -> Result<Term, ApiError>;
    async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        slug: Option<&str>,
    ) -> Result<Term, ApiError>;
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}

/// Repository for titles. Every returned [`Title`] carries its category,
/// genres and rating.
pub trait TitleRepository: Send + Sync {
    async fn list(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> Result<(Vec<Title>, u64), ApiError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Title>, ApiError>;
    async fn exists(&self, id: i32) -> Result<bool, ApiError>;
    async fn create(&self, title: &NewTitle) -> Result<Title, ApiError>;
    async fn update(&self, id: i32, changes: &TitleChanges) -> Result<Title, ApiError>;
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}

/// Repository for reviews, always scoped by title.
pub trait ReviewRepository: Send + Sync {
    /// Ordered by publication date.
    async fn list(
        &self,
        title_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<Review>, u64), ApiError>;
    async fn find(&self, title_id: i32, review_id: i32) -> Result<Option<Review>, ApiError>;
    async fn exists_for_author(&self, title_id: i32, author_id: i32) -> Result<bool, ApiError>;

    /// Fails with `ReviewAlreadyExists` when the author already reviewed the title.
    async fn create(&self, review: &NewReview) -> Result<Review, ApiError>;
    async fn update(
        &self,
        id: i32,
        text: Option<&str>,
        score: Option<i32>,
    ) -> Result<Review, ApiError>;
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}

/// Repository for comments, always scoped by review.
pub trait CommentRepository: Send + Sync {
    async fn list(
        &self,
        review_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<Comment>, u64), ApiError>;
    async fn find(&self, review_id: i32, comment_id: i32) -> Result<Option<Comment>, ApiError>;
    async fn create(&self, comment: &NewComment) -> Result<Comment, ApiError>;
    async fn update(&self, id: i32, text: &str) -> Result<Comment, ApiError>;
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}

/// Issues and verifies confirmation codes derived from account state.
pub trait ConfirmationCodes: Send + Sync {
    fn issue(&self, user: &User, now: DateTime<Utc>) -> String;
    fn verify(&self, user: &User, code: &str, now: DateTime<Utc>) -> bool;
}

/// Outbound email delivery.
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), ApiError>;
}
