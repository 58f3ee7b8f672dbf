pub mod auth;
pub mod category;
pub mod comment;
pub mod extract;
pub mod genre;
pub mod review;
pub mod title;
pub mod user;

use serde::{Deserialize, Serialize};

use yamdb_domain::pagination::PageRequest;

use crate::domain::types::Term;

/// Query string shared by paginated list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Substring filter, where the endpoint supports one.
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self, default_size: u32) -> PageRequest {
        page_request(self.page, self.page_size, default_size)
    }
}

pub fn page_request(page: Option<u32>, page_size: Option<u32>, default_size: u32) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(default_size))
}

/// Category or genre as rendered on the wire.
#[derive(Debug, Serialize)]
pub struct TermResponse {
    pub name: String,
    pub slug: String,
}

impl From<Term> for TermResponse {
    fn from(term: Term) -> Self {
        Self {
            name: term.name,
            slug: term.slug,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TermRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}
