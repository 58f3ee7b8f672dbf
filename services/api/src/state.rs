use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use yamdb_auth_types::identity::{AccountDirectory, AccountStanding, JwtSecret};

use crate::config::ApiConfig;
use crate::domain::repository::UserRepository;
use crate::domain::types::RelationLookup;
use crate::infra::confirmation::HmacConfirmationCodes;
use crate::infra::db::{
    DbCategoryRepository, DbCommentRepository, DbGenreRepository, DbReviewRepository,
    DbTitleRepository, DbUserRepository,
};
use crate::infra::mailer::LogMailer;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: JwtSecret,
    pub confirmation_codes: HmacConfirmationCodes,
    pub mailer: LogMailer,
    pub access_token_ttl_secs: u64,
    pub page_size: u32,
    pub relation_lookup: RelationLookup,
    pub from_email: Arc<str>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &ApiConfig) -> anyhow::Result<Self> {
        let confirmation_codes = HmacConfirmationCodes::new(
            config.confirmation_secret.as_bytes(),
            config.confirmation_code_ttl_secs,
        )
        .map_err(|e| anyhow::anyhow!("confirmation secret: {e}"))?;
        Ok(Self {
            db,
            jwt_secret: JwtSecret::new(config.jwt_secret.as_str()),
            confirmation_codes,
            mailer: LogMailer,
            access_token_ttl_secs: config.access_token_ttl_secs,
            page_size: config.page_size,
            relation_lookup: config.relation_lookup,
            from_email: Arc::from(config.default_from_email.as_str()),
        })
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn category_repo(&self) -> DbCategoryRepository {
        DbCategoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn genre_repo(&self) -> DbGenreRepository {
        DbGenreRepository {
            db: self.db.clone(),
        }
    }

    pub fn title_repo(&self) -> DbTitleRepository {
        DbTitleRepository {
            db: self.db.clone(),
        }
    }

    pub fn review_repo(&self) -> DbReviewRepository {
        DbReviewRepository {
            db: self.db.clone(),
        }
    }

    pub fn comment_repo(&self) -> DbCommentRepository {
        DbCommentRepository {
            db: self.db.clone(),
        }
    }
}

impl AccountDirectory for AppState {
    async fn standing(&self, user_id: i32) -> anyhow::Result<Option<AccountStanding>> {
        let user = self.user_repo().find_by_id(user_id).await?;
        Ok(user.map(|user| AccountStanding {
            role: user.role,
            is_superuser: user.is_superuser,
        }))
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
