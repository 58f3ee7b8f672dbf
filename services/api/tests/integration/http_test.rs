use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};

use yamdb_api::config::{ApiConfig, DEFAULT_CONFIRMATION_CODE_TTL_SECS};
use yamdb_api::domain::repository::{ConfirmationCodes, UserRepository};
use yamdb_api::domain::types::{NewUser, RelationLookup};
use yamdb_api::infra::confirmation::HmacConfirmationCodes;
use yamdb_api::infra::db::DbUserRepository;
use yamdb_api::router::build_router;
use yamdb_api::state::AppState;
use yamdb_api_migration::Migrator;
use yamdb_api_schema::{comments, reviews};
use yamdb_domain::user::UserRole;
use yamdb_testing::auth::{TEST_JWT_SECRET, TestAuth};

const CONFIRMATION_SECRET: &str = "test-confirmation-secret";

struct TestApp {
    server: TestServer,
    db: DatabaseConnection,
}

async fn spawn_app() -> TestApp {
    // A single connection keeps every query on the same in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let config = ApiConfig {
        database_url: "sqlite::memory:".to_owned(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
        confirmation_secret: CONFIRMATION_SECRET.to_owned(),
        api_port: 0,
        access_token_ttl_secs: 3600,
        confirmation_code_ttl_secs: DEFAULT_CONFIRMATION_CODE_TTL_SECS,
        page_size: 10,
        relation_lookup: RelationLookup::Slug,
        default_from_email: "noreply@yamdb.local".to_owned(),
    };
    let state = AppState::new(db.clone(), &config).unwrap();
    let server = TestServer::new(build_router(state)).unwrap();
    TestApp { server, db }
}

async fn seed_user(db: &DatabaseConnection, username: &str, role: UserRole) -> i32 {
    let repo = DbUserRepository { db: db.clone() };
    repo.create(&NewUser {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        role,
        ..Default::default()
    })
    .await
    .unwrap()
    .id
}

fn auth(user_id: i32) -> (HeaderName, HeaderValue) {
    TestAuth::new(user_id).header()
}

/// Admin creates `films`, `drama` and a 1979 title filed under both.
async fn seed_catalog(app: &TestApp, admin: i32) -> i64 {
    let (name, value) = auth(admin);
    app.server
        .post("/api/v1/categories")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "Films", "slug": "films" }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post("/api/v1/genres")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "Drama", "slug": "drama" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .post("/api/v1/titles")
        .add_header(name, value)
        .json(&json!({
            "name": "Stalker",
            "year": 1979,
            "category": "films",
            "genre": ["drama"],
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["category"]["slug"], "films");
    assert_eq!(body["genre"][0]["slug"], "drama");
    assert_eq!(body["rating"], Value::Null);
    body["id"].as_i64().unwrap()
}

async fn post_review(app: &TestApp, user_id: i32, title_id: i64, score: i32) -> axum_test::TestResponse {
    let (name, value) = auth(user_id);
    app.server
        .post(&format!("/api/v1/titles/{title_id}/reviews"))
        .add_header(name, value)
        .json(&json!({ "text": "worth a watch", "score": score }))
        .await
}

// ── Access rules ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_serve_catalog_reads_to_anonymous_callers() {
    let app = spawn_app().await;

    let response = app.server.get("/api/v1/titles").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 0);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn should_forbid_anonymous_catalog_writes() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/v1/categories")
        .json(&json!({ "name": "Films", "slug": "films" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn should_reject_malformed_bearer_token() {
    let app = spawn_app().await;

    let response = app
        .server
        .get("/api/v1/titles")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static("Bearer not-a-jwt"),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ── Titles and ratings ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_same_rounded_rating_in_list_and_detail() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;

    for (username, score) in [("ann", 7), ("ben", 8), ("cid", 8)] {
        let user_id = seed_user(&app.db, username, UserRole::User).await;
        post_review(&app, user_id, title_id, score)
            .await
            .assert_status(StatusCode::CREATED);
    }

    let detail: Value = app
        .server
        .get(&format!("/api/v1/titles/{title_id}"))
        .await
        .json();
    let list: Value = app.server.get("/api/v1/titles").await.json();

    assert_eq!(detail["rating"], 8);
    assert_eq!(list["results"][0]["rating"], detail["rating"]);
}

#[tokio::test]
async fn should_filter_titles_by_genre_and_year() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    seed_catalog(&app, admin).await;

    let hit: Value = app
        .server
        .get("/api/v1/titles")
        .add_query_param("genre", "drama")
        .add_query_param("year", 1979)
        .await
        .json();
    let miss: Value = app
        .server
        .get("/api/v1/titles")
        .add_query_param("category", "music")
        .await
        .json();

    assert_eq!(hit["count"], 1);
    assert_eq!(miss["count"], 0);
}

#[tokio::test]
async fn should_reject_title_from_the_future() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let (name, value) = auth(admin);

    let response = app
        .server
        .post("/api/v1/titles")
        .add_header(name, value)
        .json(&json!({ "name": "Tomorrow", "year": 9999 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "VALIDATION_FAILED");
    assert!(body["fields"]["year"].is_array());
}

#[tokio::test]
async fn should_keep_title_when_its_category_is_deleted() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;
    let (name, value) = auth(admin);

    app.server
        .delete("/api/v1/categories/films")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = app.server.get(&format!("/api/v1/titles/{title_id}")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["category"], Value::Null);
    assert_eq!(body["genre"][0]["slug"], "drama");
}

// ── Reviews and comments ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_conflict_on_second_review_by_same_author() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;
    let ann = seed_user(&app.db, "ann", UserRole::User).await;

    post_review(&app, ann, title_id, 6)
        .await
        .assert_status(StatusCode::CREATED);
    let response = post_review(&app, ann, title_id, 9).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["kind"], "REVIEW_ALREADY_EXISTS");
}

#[tokio::test]
async fn should_cascade_deletes_through_feedback() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;
    let ann = seed_user(&app.db, "ann", UserRole::User).await;
    let ben = seed_user(&app.db, "ben", UserRole::User).await;

    let review: Value = post_review(&app, ann, title_id, 6).await.json();
    let review_id = review["id"].as_i64().unwrap();
    assert_eq!(review["author"], "ann");

    let (name, value) = auth(ben);
    app.server
        .post(&format!(
            "/api/v1/titles/{title_id}/reviews/{review_id}/comments"
        ))
        .add_header(name, value)
        .json(&json!({ "text": "agreed" }))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(comments::Entity::find().count(&app.db).await.unwrap(), 1);

    // Deleting the review takes its comments with it.
    let (name, value) = auth(ann);
    app.server
        .delete(&format!("/api/v1/titles/{title_id}/reviews/{review_id}"))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(comments::Entity::find().count(&app.db).await.unwrap(), 0);

    // Deleting the title takes its reviews with it.
    post_review(&app, ben, title_id, 9)
        .await
        .assert_status(StatusCode::CREATED);
    let (name, value) = auth(admin);
    app.server
        .delete(&format!("/api/v1/titles/{title_id}"))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(reviews::Entity::find().count(&app.db).await.unwrap(), 0);

    let response = app
        .server
        .get(&format!("/api/v1/titles/{title_id}/reviews"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["kind"], "TITLE_NOT_FOUND");
}

#[tokio::test]
async fn should_forbid_editing_someone_elses_review() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;
    let ann = seed_user(&app.db, "ann", UserRole::User).await;
    let ben = seed_user(&app.db, "ben", UserRole::User).await;
    let mod_id = seed_user(&app.db, "mod", UserRole::Moderator).await;

    let review: Value = post_review(&app, ann, title_id, 6).await.json();
    let path = format!("/api/v1/titles/{title_id}/reviews/{}", review["id"]);

    let (name, value) = auth(ben);
    app.server
        .patch(&path)
        .add_header(name, value)
        .json(&json!({ "score": 1 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let (name, value) = auth(mod_id);
    let response = app
        .server
        .patch(&path)
        .add_header(name, value)
        .json(&json!({ "text": "moderated" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["text"], "moderated");
    assert_eq!(body["score"], 6);
}

// ── Accounts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_exchange_mailed_code_for_token_exactly_once() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "alice", "email": "alice@example.com" }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "username": "alice", "email": "alice@example.com" })
    );

    let repo = DbUserRepository { db: app.db.clone() };
    let alice = repo.find_by_username("alice").await.unwrap().unwrap();
    let codes =
        HmacConfirmationCodes::new(CONFIRMATION_SECRET.as_bytes(), DEFAULT_CONFIRMATION_CODE_TTL_SECS)
            .unwrap();
    let code = codes.issue(&alice, Utc::now());
    let body = json!({ "username": "alice", "confirmation_code": code });

    let response = app.server.post("/api/v1/auth/token").json(&body).await;
    response.assert_status_ok();
    let token = response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_owned();

    let me = app
        .server
        .get("/api/v1/users/me")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["role"], "user");

    let reused = app.server.post("/api/v1/auth/token").json(&body).await;
    reused.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(reused.json::<Value>()["kind"], "INVALID_CONFIRMATION_CODE");
}

#[tokio::test]
async fn should_reject_reserved_username_at_signup() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "me", "email": "me@example.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["username"].is_array());
}

#[tokio::test]
async fn should_ignore_role_in_own_profile_patch() {
    let app = spawn_app().await;
    let ann = seed_user(&app.db, "ann", UserRole::User).await;
    let (name, value) = auth(ann);

    let response = app
        .server
        .patch("/api/v1/users/me")
        .add_header(name, value)
        .json(&json!({ "bio": "film buff", "role": "admin" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["bio"], "film buff");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn should_limit_user_management_to_admins() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let mod_id = seed_user(&app.db, "mod", UserRole::Moderator).await;

    let (name, value) = auth(mod_id);
    app.server
        .get("/api/v1/users")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let (name, value) = auth(admin);
    let response = app
        .server
        .get("/api/v1/users/mod")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "moderator");
}

#[tokio::test]
async fn should_apply_demotion_to_tokens_already_issued() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;
    let ann = seed_user(&app.db, "ann", UserRole::User).await;
    let mod_id = seed_user(&app.db, "mod", UserRole::Moderator).await;
    let review: Value = post_review(&app, ann, title_id, 6).await.json();
    let path = format!("/api/v1/titles/{title_id}/reviews/{}", review["id"]);
    let (mod_name, mod_value) = auth(mod_id);

    let (name, value) = auth(admin);
    app.server
        .patch("/api/v1/users/mod")
        .add_header(name, value)
        .json(&json!({ "role": "user" }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .delete(&path)
        .add_header(mod_name, mod_value)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    app.server.get(&path).await.assert_status_ok();
}

#[tokio::test]
async fn should_reject_token_of_deleted_account() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;
    let ann = seed_user(&app.db, "ann", UserRole::User).await;

    let (name, value) = auth(admin);
    app.server
        .delete("/api/v1/users/ann")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = post_review(&app, ann, title_id, 7).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["kind"], "UNAUTHORIZED");
    assert_eq!(reviews::Entity::find().count(&app.db).await.unwrap(), 0);
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_forbid_anonymous_write_without_body() {
    let app = spawn_app().await;

    let response = app.server.post("/api/v1/categories").await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn should_report_missing_body_as_validation_error() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let (name, value) = auth(admin);

    let response = app
        .server
        .post("/api/v1/categories")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "VALIDATION_FAILED");
    assert!(body["fields"]["body"].is_array());
}

#[tokio::test]
async fn should_report_mistyped_field_as_validation_error() {
    let app = spawn_app().await;
    let admin = seed_user(&app.db, "root", UserRole::Admin).await;
    let title_id = seed_catalog(&app, admin).await;
    let ann = seed_user(&app.db, "ann", UserRole::User).await;
    let (name, value) = auth(ann);

    let response = app
        .server
        .post(&format!("/api/v1/titles/{title_id}/reviews"))
        .add_header(name, value)
        .json(&json!({ "text": "great", "score": "ten" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "VALIDATION_FAILED");
    assert!(body["fields"]["body"].is_array());
}

#[tokio::test]
async fn should_report_malformed_query_as_validation_error() {
    let app = spawn_app().await;

    let response = app
        .server
        .get("/api/v1/titles")
        .add_query_param("year", "soon")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "VALIDATION_FAILED");
    assert!(body["fields"]["query"].is_array());
}
