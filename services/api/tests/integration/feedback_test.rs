use yamdb_api::error::ApiError;
use yamdb_api::usecase::comment::{
    CreateCommentUseCase, DeleteCommentUseCase, GetCommentUseCase, UpdateCommentUseCase,
};
use yamdb_api::usecase::review::{
    CreateReviewInput, CreateReviewUseCase, DeleteReviewUseCase, UpdateReviewInput,
    UpdateReviewUseCase,
};
use yamdb_auth_types::identity::Caller;
use yamdb_domain::user::UserRole;

use crate::helpers::{MockCommentRepo, MockReviewRepo, MockTitleRepo, comment, review, title};

fn caller(user_id: i32, role: UserRole) -> Caller {
    Caller::Account { user_id, role }
}

fn review_input(score: i32) -> CreateReviewInput {
    CreateReviewInput {
        text: Some("Slow but rewarding".to_owned()),
        score: Some(score),
    }
}

// ── Reviews ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_review_for_signed_in_user() {
    let reviews = MockReviewRepo::default();
    let handle = reviews.reviews_handle();
    let usecase = CreateReviewUseCase {
        titles: MockTitleRepo::new(vec![title(1)]),
        reviews,
    };

    let created = usecase
        .execute(&caller(4, UserRole::User), 1, review_input(8))
        .await
        .unwrap();

    assert_eq!(created.author_id, 4);
    assert_eq!(created.title_id, 1);
    assert_eq!(handle.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_forbid_anonymous_review_before_title_lookup() {
    let usecase = CreateReviewUseCase {
        titles: MockTitleRepo::default(),
        reviews: MockReviewRepo::default(),
    };

    let result = usecase.execute(&Caller::Anonymous, 99, review_input(8)).await;

    assert!(matches!(result, Err(ApiError::Forbidden)), "got {result:?}");
}

#[tokio::test]
async fn should_return_not_found_for_review_on_missing_title() {
    let usecase = CreateReviewUseCase {
        titles: MockTitleRepo::default(),
        reviews: MockReviewRepo::default(),
    };

    let result = usecase
        .execute(&caller(4, UserRole::User), 99, review_input(8))
        .await;

    assert!(matches!(result, Err(ApiError::TitleNotFound)), "got {result:?}");
}

#[tokio::test]
async fn should_reject_second_review_by_same_author() {
    let usecase = CreateReviewUseCase {
        titles: MockTitleRepo::new(vec![title(1)]),
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
    };

    let result = usecase
        .execute(&caller(4, UserRole::User), 1, review_input(5))
        .await;

    assert!(
        matches!(result, Err(ApiError::ReviewAlreadyExists)),
        "got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_score_outside_one_to_ten() {
    let usecase = CreateReviewUseCase {
        titles: MockTitleRepo::new(vec![title(1)]),
        reviews: MockReviewRepo::default(),
    };

    for score in [0, 11] {
        let result = usecase
            .execute(&caller(4, UserRole::User), 1, review_input(score))
            .await;
        let Err(ApiError::Validation(fields)) = result else {
            panic!("expected Validation for {score}, got {result:?}");
        };
        assert!(fields.get("score").is_some());
    }
}

#[tokio::test]
async fn should_let_only_author_or_staff_edit_review() {
    let usecase = UpdateReviewUseCase {
        titles: MockTitleRepo::new(vec![title(1)]),
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
    };
    let input = || UpdateReviewInput {
        score: Some(3),
        ..Default::default()
    };

    let stranger = usecase
        .execute(&caller(5, UserRole::User), 1, 1, input())
        .await;
    assert!(matches!(stranger, Err(ApiError::Forbidden)), "got {stranger:?}");

    let by_author = usecase
        .execute(&caller(4, UserRole::User), 1, 1, input())
        .await
        .unwrap();
    assert_eq!(by_author.score, 3);

    let by_moderator = usecase
        .execute(
            &caller(6, UserRole::Moderator),
            1,
            1,
            UpdateReviewInput {
                text: Some("edited".to_owned()),
                score: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(by_moderator.text, "edited");
    assert_eq!(by_moderator.score, 3);
}

#[tokio::test]
async fn should_not_find_review_under_another_title() {
    let usecase = DeleteReviewUseCase {
        titles: MockTitleRepo::new(vec![title(1), title(2)]),
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
    };

    let result = usecase.execute(&caller(1, UserRole::Admin), 2, 1).await;

    assert!(matches!(result, Err(ApiError::ReviewNotFound)), "got {result:?}");
}

// ── Comments ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_comment_on_existing_review() {
    let comments = MockCommentRepo::default();
    let handle = comments.comments_handle();
    let usecase = CreateCommentUseCase {
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
        comments,
    };

    let created = usecase
        .execute(&caller(5, UserRole::User), 1, 1, Some("agreed".to_owned()))
        .await
        .unwrap();

    assert_eq!(created.review_id, 1);
    assert_eq!(created.author_id, 5);
    assert_eq!(handle.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_blank_comment() {
    let usecase = CreateCommentUseCase {
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
        comments: MockCommentRepo::default(),
    };

    for text in [None, Some("   ".to_owned())] {
        let result = usecase
            .execute(&caller(5, UserRole::User), 1, 1, text)
            .await;
        let Err(ApiError::Validation(fields)) = result else {
            panic!("expected Validation, got {result:?}");
        };
        assert!(fields.get("text").is_some());
    }
}

#[tokio::test]
async fn should_not_find_comment_when_review_belongs_to_other_title() {
    let usecase = GetCommentUseCase {
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
        comments: MockCommentRepo::new(vec![comment(1, 1, 5)]),
    };

    let result = usecase.execute(2, 1, 1).await;

    assert!(matches!(result, Err(ApiError::ReviewNotFound)), "got {result:?}");
}

#[tokio::test]
async fn should_return_unchanged_comment_for_empty_patch() {
    let usecase = UpdateCommentUseCase {
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
        comments: MockCommentRepo::new(vec![comment(1, 1, 5)]),
    };

    let unchanged = usecase
        .execute(&caller(5, UserRole::User), 1, 1, 1, None)
        .await
        .unwrap();

    assert_eq!(unchanged.text, "agreed");
}

#[tokio::test]
async fn should_let_moderator_delete_any_comment() {
    let comments = MockCommentRepo::new(vec![comment(1, 1, 5)]);
    let handle = comments.comments_handle();
    let usecase = DeleteCommentUseCase {
        reviews: MockReviewRepo::new(vec![review(1, 1, 4)]),
        comments,
    };

    let stranger = usecase.execute(&caller(4, UserRole::User), 1, 1, 1).await;
    assert!(matches!(stranger, Err(ApiError::Forbidden)), "got {stranger:?}");

    usecase
        .execute(&caller(6, UserRole::Moderator), 1, 1, 1)
        .await
        .unwrap();
    assert!(handle.lock().unwrap().is_empty());
}
