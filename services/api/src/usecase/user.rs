use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::{Page, PageRequest};
use yamdb_domain::user::UserRole;

use crate::domain::policy::{require_account, require_admin};
use crate::domain::repository::UserRepository;
use crate::domain::types::{
    NewUser, User, UserChanges, validate_email, validate_person_name, validate_username,
};
use crate::error::{ApiError, FieldErrors};

fn check_profile(
    errors: &mut FieldErrors,
    username: Option<&str>,
    email: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) {
    if let Some(Err(msg)) = username.map(validate_username) {
        errors.add("username", msg);
    }
    if let Some(Err(msg)) = email.map(validate_email) {
        errors.add("email", msg);
    }
    if let Some(Err(msg)) = first_name.map(validate_person_name) {
        errors.add("first_name", msg);
    }
    if let Some(Err(msg)) = last_name.map(validate_person_name) {
        errors.add("last_name", msg);
    }
}

/// Reject usernames or emails already held by an account other than `id`.
async fn ensure_unique<R: UserRepository>(
    repo: &R,
    id: Option<i32>,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(username) = username {
        if let Some(other) = repo.find_by_username(username).await? {
            if Some(other.id) != id {
                return Err(ApiError::UsernameTaken);
            }
        }
    }
    if let Some(email) = email {
        if let Some(other) = repo.find_by_email(email).await? {
            if Some(other.id) != id {
                return Err(ApiError::EmailTaken);
            }
        }
    }
    Ok(())
}

async fn apply_changes<R: UserRepository>(
    repo: &R,
    user: &User,
    changes: UserChanges,
) -> Result<User, ApiError> {
    let mut errors = FieldErrors::new();
    check_profile(
        &mut errors,
        changes.username.as_deref(),
        changes.email.as_deref(),
        changes.first_name.as_deref(),
        changes.last_name.as_deref(),
    );
    errors.into_result()?;

    ensure_unique(
        repo,
        Some(user.id),
        changes.username.as_deref(),
        changes.email.as_deref(),
    )
    .await?;
    repo.update(user.id, &changes).await
}

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> ListUsersUseCase<R> {
    pub async fn execute(
        &self,
        caller: &Caller,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, ApiError> {
        require_admin(caller)?;
        let (items, count) = self.repo.list(search, page).await?;
        Ok(Page::new(items, count, page))
    }
}

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

pub struct CreateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> CreateUserUseCase<R> {
    pub async fn execute(&self, caller: &Caller, input: CreateUserInput) -> Result<User, ApiError> {
        require_admin(caller)?;

        let mut errors = FieldErrors::new();
        check_profile(
            &mut errors,
            Some(&input.username),
            Some(&input.email),
            input.first_name.as_deref(),
            input.last_name.as_deref(),
        );
        errors.into_result()?;

        ensure_unique(&self.repo, None, Some(&input.username), Some(&input.email)).await?;
        let user = self
            .repo
            .create(&NewUser {
                username: input.username,
                email: input.email,
                first_name: input.first_name.unwrap_or_default(),
                last_name: input.last_name.unwrap_or_default(),
                bio: input.bio,
                role: input.role.unwrap_or_default(),
            })
            .await?;
        tracing::info!(user_id = user.id, role = %user.role, "account created by admin");
        Ok(user)
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> GetUserUseCase<R> {
    pub async fn execute(&self, caller: &Caller, username: &str) -> Result<User, ApiError> {
        require_admin(caller)?;
        self.repo
            .find_by_username(username)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

pub struct UpdateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UpdateUserUseCase<R> {
    pub async fn execute(
        &self,
        caller: &Caller,
        username: &str,
        changes: UserChanges,
    ) -> Result<User, ApiError> {
        require_admin(caller)?;
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        apply_changes(&self.repo, &user, changes).await
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> DeleteUserUseCase<R> {
    pub async fn execute(&self, caller: &Caller, username: &str) -> Result<(), ApiError> {
        require_admin(caller)?;
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !self.repo.delete(user.id).await? {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(user_id = user.id, "account deleted");
        Ok(())
    }
}

// ── GetMe ────────────────────────────────────────────────────────────────────

pub struct GetMeUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> GetMeUseCase<R> {
    pub async fn execute(&self, caller: &Caller) -> Result<User, ApiError> {
        let user_id = require_account(caller)?;
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── UpdateMe ─────────────────────────────────────────────────────────────────

pub struct UpdateMeUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UpdateMeUseCase<R> {
    /// Role changes are ignored: accounts cannot promote themselves.
    pub async fn execute(&self, caller: &Caller, changes: UserChanges) -> Result<User, ApiError> {
        let user_id = require_account(caller)?;
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let changes = UserChanges {
            role: None,
            ..changes
        };
        apply_changes(&self.repo, &user, changes).await
    }
}
