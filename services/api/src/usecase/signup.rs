use chrono::Utc;

use yamdb_domain::user::UserRole;

use crate::domain::repository::{ConfirmationCodes, Mailer, UserRepository};
use crate::domain::types::{Email, NewUser, User, validate_email, validate_username};
use crate::error::{ApiError, FieldErrors};

pub const CONFIRMATION_SUBJECT: &str = "YaMDb confirmation code";

pub struct SignupInput {
    pub username: String,
    pub email: String,
}

/// Registers an account (or finds the matching one) and mails it a fresh
/// confirmation code.
pub struct SignupUseCase<U: UserRepository, C: ConfirmationCodes, M: Mailer> {
    pub users: U,
    pub codes: C,
    pub mailer: M,
    pub from_email: String,
}

impl<U: UserRepository, C: ConfirmationCodes, M: Mailer> SignupUseCase<U, C, M> {
    pub async fn execute(&self, input: SignupInput) -> Result<User, ApiError> {
        let mut errors = FieldErrors::new();
        if let Err(msg) = validate_username(&input.username) {
            errors.add("username", msg);
        }
        if let Err(msg) = validate_email(&input.email) {
            errors.add("email", msg);
        }
        errors.into_result()?;

        let user = match self.users.find_by_username(&input.username).await? {
            Some(existing) if existing.email == input.email => existing,
            Some(_) => return Err(ApiError::UsernameTaken),
            None => {
                if self.users.find_by_email(&input.email).await?.is_some() {
                    return Err(ApiError::EmailTaken);
                }
                let created = self
                    .users
                    .create(&NewUser {
                        username: input.username,
                        email: input.email,
                        role: UserRole::User,
                        ..Default::default()
                    })
                    .await?;
                tracing::info!(user_id = created.id, "account registered");
                created
            }
        };

        let code = self.codes.issue(&user, Utc::now());
        self.mailer
            .send(&Email {
                from: self.from_email.clone(),
                to: user.email.clone(),
                subject: CONFIRMATION_SUBJECT.to_owned(),
                body: format!("Your confirmation code: {code}"),
            })
            .await?;
        Ok(user)
    }
}
