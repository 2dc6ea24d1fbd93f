//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Book as returned by the book service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
    #[serde(default)]
    pub lost_copies: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn borrowed_copies(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Body for create and full update
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub total_copies: u32,
}

/// Book list filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub available_only: bool,
    pub page: u32,
    pub size: u32,
}

impl BookQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.trim().to_string()));
        }
        if let Some(genre) = self.genre.as_deref().filter(|g| !g.is_empty()) {
            params.push(("genre", genre.to_string()));
        }
        if self.available_only {
            params.push(("available", "true".to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CopiesRequest {
    pub count: u32,
}
