use std::collections::HashMap;

use chrono::{Datelike as _, Utc};

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::{Page, PageRequest};

use crate::domain::policy::require_admin;
use crate::domain::repository::{TermRepository, TitleRepository};
use crate::domain::types::{
    NAME_MAX_LEN, NewTitle, RelationKey, RelationLookup, Title, TitleChanges, TitleFilter,
    validate_text, validate_year,
};
use crate::error::{ApiError, FieldErrors};

/// Title fields as sent by the client. Every field is optional at this level;
/// creation enforces the required ones.
#[derive(Debug, Clone, Default)]
pub struct TitleInput {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category: Option<RelationKey>,
    pub genre: Option<Vec<RelationKey>>,
}

/// Turn client references into ids, reporting unknown ones against `field`.
async fn resolve<R: TermRepository>(
    repo: &R,
    lookup: RelationLookup,
    keys: &[RelationKey],
    field: &'static str,
    errors: &mut FieldErrors,
) -> Result<Vec<i32>, ApiError> {
    let mut ids = Vec::with_capacity(keys.len());
    match lookup {
        RelationLookup::Slug => {
            let slugs: Vec<String> = keys
                .iter()
                .map(|key| match key {
                    RelationKey::Text(slug) => slug.clone(),
                    RelationKey::Id(id) => id.to_string(),
                })
                .collect();
            let known: HashMap<String, i32> = repo
                .find_by_slugs(&slugs)
                .await?
                .into_iter()
                .map(|t| (t.slug, t.id))
                .collect();
            for slug in &slugs {
                match known.get(slug) {
                    Some(&id) => ids.push(id),
                    None => errors.add(field, format!("object with slug \"{slug}\" does not exist")),
                }
            }
        }
        RelationLookup::Id => {
            let mut wanted = Vec::with_capacity(keys.len());
            for key in keys {
                match key {
                    RelationKey::Id(id) => wanted.push(*id),
                    RelationKey::Text(text) => match text.parse::<i32>() {
                        Ok(id) => wanted.push(id),
                        Err(_) => errors.add(field, "incorrect type, expected a primary key"),
                    },
                }
            }
            let known: Vec<i32> = repo
                .find_by_ids(&wanted)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            for id in wanted {
                if known.contains(&id) {
                    ids.push(id);
                } else {
                    errors.add(field, format!("invalid pk \"{id}\", object does not exist"));
                }
            }
        }
    }
    let mut seen = Vec::with_capacity(ids.len());
    ids.retain(|id| {
        let fresh = !seen.contains(id);
        seen.push(*id);
        fresh
    });
    Ok(ids)
}

fn check_scalars(errors: &mut FieldErrors, input: &TitleInput) {
    if let Some(name) = &input.name {
        if let Err(msg) = validate_text(name, Some(NAME_MAX_LEN)) {
            errors.add("name", msg);
        }
    }
    if let Some(year) = input.year {
        if let Err(msg) = validate_year(year, Utc::now().year()) {
            errors.add("year", msg);
        }
    }
}

// ── ListTitles ───────────────────────────────────────────────────────────────

pub struct ListTitlesUseCase<T: TitleRepository> {
    pub titles: T,
}

impl<T: TitleRepository> ListTitlesUseCase<T> {
    pub async fn execute(
        &self,
        filter: TitleFilter,
        page: PageRequest,
    ) -> Result<Page<Title>, ApiError> {
        let (items, count) = self.titles.list(&filter, page).await?;
        Ok(Page::new(items, count, page))
    }
}

// ── GetTitle ─────────────────────────────────────────────────────────────────

pub struct GetTitleUseCase<T: TitleRepository> {
    pub titles: T,
}

impl<T: TitleRepository> GetTitleUseCase<T> {
    pub async fn execute(&self, title_id: i32) -> Result<Title, ApiError> {
        self.titles
            .find_by_id(title_id)
            .await?
            .ok_or(ApiError::TitleNotFound)
    }
}

// ── CreateTitle ──────────────────────────────────────────────────────────────

pub struct CreateTitleUseCase<T: TitleRepository, C: TermRepository, G: TermRepository> {
    pub titles: T,
    pub categories: C,
    pub genres: G,
    pub lookup: RelationLookup,
}

impl<T: TitleRepository, C: TermRepository, G: TermRepository> CreateTitleUseCase<T, C, G> {
    pub async fn execute(&self, caller: &Caller, input: TitleInput) -> Result<Title, ApiError> {
        require_admin(caller)?;

        let mut errors = FieldErrors::new();
        if input.name.is_none() {
            errors.add("name", "this field is required");
        }
        if input.year.is_none() {
            errors.add("year", "this field is required");
        }
        check_scalars(&mut errors, &input);

        let category_id = match &input.category {
            Some(key) => resolve(
                &self.categories,
                self.lookup,
                std::slice::from_ref(key),
                "category",
                &mut errors,
            )
            .await?
            .first()
            .copied(),
            None => None,
        };
        let genre_ids = match &input.genre {
            Some(keys) => resolve(&self.genres, self.lookup, keys, "genre", &mut errors).await?,
            None => vec![],
        };
        errors.into_result()?;

        let title = NewTitle {
            name: input.name.unwrap_or_default(),
            year: input.year.unwrap_or_default(),
            description: input.description,
            category_id,
            genre_ids,
        };
        let created = self.titles.create(&title).await?;
        tracing::info!(title_id = created.id, "title created");
        Ok(created)
    }
}

// ── UpdateTitle ──────────────────────────────────────────────────────────────

pub struct UpdateTitleUseCase<T: TitleRepository, C: TermRepository, G: TermRepository> {
    pub titles: T,
    pub categories: C,
    pub genres: G,
    pub lookup: RelationLookup,
}

impl<T: TitleRepository, C: TermRepository, G: TermRepository> UpdateTitleUseCase<T, C, G> {
    pub async fn execute(
        &self,
        caller: &Caller,
        title_id: i32,
        input: TitleInput,
    ) -> Result<Title, ApiError> {
        require_admin(caller)?;
        if !self.titles.exists(title_id).await? {
            return Err(ApiError::TitleNotFound);
        }

        let mut errors = FieldErrors::new();
        check_scalars(&mut errors, &input);
        let category_id = match &input.category {
            Some(key) => resolve(
                &self.categories,
                self.lookup,
                std::slice::from_ref(key),
                "category",
                &mut errors,
            )
            .await?
            .first()
            .copied(),
            None => None,
        };
        let genre_ids = match &input.genre {
            Some(keys) => {
                Some(resolve(&self.genres, self.lookup, keys, "genre", &mut errors).await?)
            }
            None => None,
        };
        errors.into_result()?;

        let changes = TitleChanges {
            name: input.name,
            year: input.year,
            description: input.description,
            category_id,
            genre_ids,
        };
        self.titles.update(title_id, &changes).await
    }
}

// ── DeleteTitle ──────────────────────────────────────────────────────────────

pub struct DeleteTitleUseCase<T: TitleRepository> {
    pub titles: T,
}

impl<T: TitleRepository> DeleteTitleUseCase<T> {
    pub async fn execute(&self, caller: &Caller, title_id: i32) -> Result<(), ApiError> {
        require_admin(caller)?;
        if !self.titles.delete(title_id).await? {
            return Err(ApiError::TitleNotFound);
        }
        tracing::info!(title_id, "title deleted");
        Ok(())
    }
}
