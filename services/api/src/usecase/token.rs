use std::sync::Arc;

use chrono::Utc;

use yamdb_auth_types::token::issue_access_token;

use crate::domain::repository::{ConfirmationCodes, UserRepository};
use crate::domain::types::validate_username;
use crate::error::{ApiError, FieldErrors};

pub struct ObtainTokenInput {
    pub username: String,
    pub confirmation_code: String,
}

/// Exchanges a confirmation code for an access token.
pub struct ObtainTokenUseCase<U: UserRepository, C: ConfirmationCodes> {
    pub users: U,
    pub codes: C,
    pub jwt_secret: Arc<str>,
    pub access_token_ttl_secs: u64,
}

impl<U: UserRepository, C: ConfirmationCodes> ObtainTokenUseCase<U, C> {
    pub async fn execute(&self, input: ObtainTokenInput) -> Result<String, ApiError> {
        let mut errors = FieldErrors::new();
        if let Err(msg) = validate_username(&input.username) {
            errors.add("username", msg);
        }
        if input.confirmation_code.trim().is_empty() {
            errors.add("confirmation_code", "this field may not be blank");
        }
        errors.into_result()?;

        let user = self
            .users
            .find_by_username(&input.username)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let now = Utc::now();
        if !self.codes.verify(&user, &input.confirmation_code, now) {
            tracing::debug!(user_id = user.id, "confirmation code rejected");
            return Err(ApiError::InvalidConfirmationCode);
        }
        // Moving last_login retires the code just used. Losing the race to a
        // concurrent exchange of the same code counts as a spent code.
        if !self.users.record_login(user.id, user.last_login, now).await? {
            tracing::debug!(user_id = user.id, "confirmation code spent concurrently");
            return Err(ApiError::InvalidConfirmationCode);
        }

        let (token, _exp) = issue_access_token(user.id, &self.jwt_secret, self.access_token_ttl_secs)
            .map_err(|e| anyhow::Error::new(e).context("sign access token"))?;
        tracing::info!(user_id = user.id, "access token issued");
        Ok(token)
    }
}
