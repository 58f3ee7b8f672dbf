use chrono::Utc;

use yamdb_api::domain::repository::ConfirmationCodes;
use yamdb_api::error::ApiError;
use yamdb_api::usecase::signup::{CONFIRMATION_SUBJECT, SignupInput, SignupUseCase};
use yamdb_domain::user::UserRole;

use crate::helpers::{MockCodes, MockMailer, MockUserRepo, user};

fn usecase(users: MockUserRepo, mailer: MockMailer) -> SignupUseCase<MockUserRepo, MockCodes, MockMailer> {
    SignupUseCase {
        users,
        codes: MockCodes,
        mailer,
        from_email: "noreply@yamdb.local".to_owned(),
    }
}

fn input(username: &str, email: &str) -> SignupInput {
    SignupInput {
        username: username.to_owned(),
        email: email.to_owned(),
    }
}

#[tokio::test]
async fn should_register_account_and_mail_confirmation_code() {
    let users = MockUserRepo::empty();
    let handle = users.users_handle();
    let mailer = MockMailer::default();
    let sent = mailer.sent_handle();

    let created = usecase(users, mailer)
        .execute(input("alice", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(created.username, "alice");
    assert_eq!(created.role, UserRole::User);
    assert_eq!(handle.lock().unwrap().len(), 1);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(sent[0].from, "noreply@yamdb.local");
    assert_eq!(sent[0].subject, CONFIRMATION_SUBJECT);
    let code = MockCodes.issue(&created, Utc::now());
    assert!(sent[0].body.contains(&code), "body: {}", sent[0].body);
}

#[tokio::test]
async fn should_resend_code_for_matching_existing_account() {
    let existing = user(7, "alice", UserRole::Moderator);
    let users = MockUserRepo::new(vec![existing.clone()]);
    let handle = users.users_handle();
    let mailer = MockMailer::default();
    let sent = mailer.sent_handle();

    let found = usecase(users, mailer)
        .execute(input("alice", &existing.email))
        .await
        .unwrap();

    assert_eq!(found.id, 7);
    assert_eq!(found.role, UserRole::Moderator);
    assert_eq!(handle.lock().unwrap().len(), 1);
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_known_username_with_other_email() {
    let users = MockUserRepo::new(vec![user(1, "alice", UserRole::User)]);
    let mailer = MockMailer::default();
    let sent = mailer.sent_handle();

    let result = usecase(users, mailer)
        .execute(input("alice", "other@example.com"))
        .await;

    assert!(
        matches!(result, Err(ApiError::UsernameTaken)),
        "expected UsernameTaken, got {result:?}"
    );
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_email_held_by_other_username() {
    let users = MockUserRepo::new(vec![user(1, "alice", UserRole::User)]);

    let result = usecase(users, MockMailer::default())
        .execute(input("bob", "alice@example.com"))
        .await;

    assert!(
        matches!(result, Err(ApiError::EmailTaken)),
        "expected EmailTaken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_reserved_username_before_uniqueness_checks() {
    let users = MockUserRepo::new(vec![user(1, "alice", UserRole::User)]);

    let result = usecase(users, MockMailer::default())
        .execute(input("me", "alice@example.com"))
        .await;

    let Err(ApiError::Validation(fields)) = result else {
        panic!("expected Validation, got {result:?}");
    };
    assert!(fields.get("username").is_some());
    assert!(fields.get("email").is_none());
}

#[tokio::test]
async fn should_report_every_invalid_field() {
    let result = usecase(MockUserRepo::empty(), MockMailer::default())
        .execute(input("bad name!", "not-an-email"))
        .await;

    let Err(ApiError::Validation(fields)) = result else {
        panic!("expected Validation, got {result:?}");
    };
    assert!(fields.get("username").is_some());
    assert!(fields.get("email").is_some());
}
