use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::{Page, PageRequest};

use crate::domain::policy::require_admin;
use crate::domain::repository::TermRepository;
use crate::domain::types::{NAME_MAX_LEN, Term, validate_slug, validate_text};
use crate::error::{ApiError, FieldErrors};

fn check_name(errors: &mut FieldErrors, name: &str) {
    if let Err(msg) = validate_text(name, Some(NAME_MAX_LEN)) {
        errors.add("name", msg);
    }
}

fn check_slug(errors: &mut FieldErrors, slug: &str) {
    if let Err(msg) = validate_slug(slug) {
        errors.add("slug", msg);
    }
}

// ── ListTerms ────────────────────────────────────────────────────────────────

pub struct ListTermsUseCase<R: TermRepository> {
    pub repo: R,
}

impl<R: TermRepository> ListTermsUseCase<R> {
    pub async fn execute(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Term>, ApiError> {
        let (items, count) = self.repo.list(search, page).await?;
        Ok(Page::new(items, count, page))
    }
}

// ── GetTerm ──────────────────────────────────────────────────────────────────

pub struct GetTermUseCase<R: TermRepository> {
    pub repo: R,
}

impl<R: TermRepository> GetTermUseCase<R> {
    pub async fn execute(&self, slug: &str) -> Result<Term, ApiError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| R::KIND.not_found())
    }
}

// ── CreateTerm ───────────────────────────────────────────────────────────────

pub struct CreateTermInput {
    pub name: String,
    pub slug: String,
}

pub struct CreateTermUseCase<R: TermRepository> {
    pub repo: R,
}

impl<R: TermRepository> CreateTermUseCase<R> {
    pub async fn execute(&self, caller: &Caller, input: CreateTermInput) -> Result<Term, ApiError> {
        require_admin(caller)?;

        let mut errors = FieldErrors::new();
        check_name(&mut errors, &input.name);
        check_slug(&mut errors, &input.slug);
        errors.into_result()?;

        if self.repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(ApiError::SlugTaken);
        }
        self.repo.create(&input.name, &input.slug).await
    }
}

// ── UpdateTerm ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateTermInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

pub struct UpdateTermUseCase<R: TermRepository> {
    pub repo: R,
}

impl<R: TermRepository> UpdateTermUseCase<R> {
    pub async fn execute(
        &self,
        caller: &Caller,
        slug: &str,
        input: UpdateTermInput,
    ) -> Result<Term, ApiError> {
        require_admin(caller)?;
        let current = self
            .repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| R::KIND.not_found())?;

        let mut errors = FieldErrors::new();
        if let Some(name) = &input.name {
            check_name(&mut errors, name);
        }
        if let Some(new_slug) = &input.slug {
            check_slug(&mut errors, new_slug);
        }
        errors.into_result()?;

        if let Some(new_slug) = input.slug.as_deref().filter(|s| *s != current.slug) {
            if self.repo.find_by_slug(new_slug).await?.is_some() {
                return Err(ApiError::SlugTaken);
            }
        }
        self.repo
            .update(current.id, input.name.as_deref(), input.slug.as_deref())
            .await
    }
}

// ── DeleteTerm ───────────────────────────────────────────────────────────────

pub struct DeleteTermUseCase<R: TermRepository> {
    pub repo: R,
}

impl<R: TermRepository> DeleteTermUseCase<R> {
    pub async fn execute(&self, caller: &Caller, slug: &str) -> Result<(), ApiError> {
        require_admin(caller)?;
        let term = self
            .repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| R::KIND.not_found())?;
        if !self.repo.delete(term.id).await? {
            return Err(R::KIND.not_found());
        }
        Ok(())
    }
}
