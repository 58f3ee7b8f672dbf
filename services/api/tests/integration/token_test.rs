use std::sync::Arc;

use chrono::{DateTime, Utc};

use yamdb_api::domain::repository::{ConfirmationCodes, UserRepository};
use yamdb_api::domain::types::{NewUser, User, UserChanges};
use yamdb_api::error::ApiError;
use yamdb_api::usecase::token::{ObtainTokenInput, ObtainTokenUseCase};
use yamdb_auth_types::token::validate_access_token;
use yamdb_domain::pagination::PageRequest;
use yamdb_domain::user::UserRole;
use yamdb_testing::auth::TEST_JWT_SECRET;

use crate::helpers::{MockCodes, MockUserRepo, user};

fn usecase<U: UserRepository>(users: U) -> ObtainTokenUseCase<U, MockCodes> {
    ObtainTokenUseCase {
        users,
        codes: MockCodes,
        jwt_secret: Arc::from(TEST_JWT_SECRET),
        access_token_ttl_secs: 3600,
    }
}

fn input(username: &str, code: &str) -> ObtainTokenInput {
    ObtainTokenInput {
        username: username.to_owned(),
        confirmation_code: code.to_owned(),
    }
}

#[tokio::test]
async fn should_issue_token_for_valid_code_and_record_login() {
    let alice = user(3, "alice", UserRole::Moderator);
    let code = MockCodes.issue(&alice, Utc::now());
    let users = MockUserRepo::new(vec![alice]);
    let logins = users.logins_handle();

    let token = usecase(users).execute(input("alice", &code)).await.unwrap();

    let info = validate_access_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, 3);
    let logins = logins.lock().unwrap();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].0, 3);
}

#[tokio::test]
async fn should_reject_code_once_it_has_been_exchanged() {
    let alice = user(3, "alice", UserRole::User);
    let code = MockCodes.issue(&alice, Utc::now());
    let usecase = usecase(MockUserRepo::new(vec![alice]));

    usecase.execute(input("alice", &code)).await.unwrap();
    let result = usecase.execute(input("alice", &code)).await;

    assert!(
        matches!(result, Err(ApiError::InvalidConfirmationCode)),
        "expected InvalidConfirmationCode, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_wrong_code_without_recording_login() {
    let users = MockUserRepo::new(vec![user(3, "alice", UserRole::User)]);
    let logins = users.logins_handle();

    let result = usecase(users).execute(input("alice", "code-3-999")).await;

    assert!(
        matches!(result, Err(ApiError::InvalidConfirmationCode)),
        "expected InvalidConfirmationCode, got {result:?}"
    );
    assert!(logins.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_return_not_found_for_unknown_username() {
    let result = usecase(MockUserRepo::empty())
        .execute(input("ghost", "code-1-0"))
        .await;

    assert!(
        matches!(result, Err(ApiError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_blank_fields() {
    let result = usecase(MockUserRepo::empty()).execute(input("", " ")).await;

    let Err(ApiError::Validation(fields)) = result else {
        panic!("expected Validation, got {result:?}");
    };
    assert!(fields.get("username").is_some());
    assert!(fields.get("confirmation_code").is_some());
}

/// Lets a competing exchange of the same code land between reading the
/// account and recording the login.
struct RacingUserRepo(MockUserRepo);

impl UserRepository for RacingUserRepo {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError> {
        self.0.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let found = self.0.find_by_username(username).await?;
        if let Some(user) = &found {
            assert!(
                self.0
                    .record_login(user.id, user.last_login, Utc::now())
                    .await?
            );
        }
        Ok(found)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        self.0.find_by_email(email).await
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ApiError> {
        self.0.list(search, page).await
    }

    async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        self.0.create(user).await
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<User, ApiError> {
        self.0.update(id, changes).await
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        self.0.delete(id).await
    }

    async fn record_login(
        &self,
        id: i32,
        previous: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<bool, ApiError> {
        self.0.record_login(id, previous, at).await
    }
}

#[tokio::test]
async fn should_reject_code_spent_by_concurrent_exchange() {
    let alice = user(3, "alice", UserRole::User);
    let code = MockCodes.issue(&alice, Utc::now());
    let users = MockUserRepo::new(vec![alice]);
    let logins = users.logins_handle();

    let result = usecase(RacingUserRepo(users))
        .execute(input("alice", &code))
        .await;

    assert!(
        matches!(result, Err(ApiError::InvalidConfirmationCode)),
        "expected InvalidConfirmationCode, got {result:?}"
    );
    // Only the competing exchange got through.
    assert_eq!(logins.lock().unwrap().len(), 1);
}
