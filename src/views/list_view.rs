//! List-view state shared by every list screen

use std::future::Future;

use indexmap::IndexMap;

use crate::error::AppResult;
use crate::models::envelope::Page;

/// Everything that determines which rows a list shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub search: String,
    pub filters: IndexMap<String, String>,
    /// Zero-based
    pub page: u32,
    pub size: u32,
}

impl ListFilters {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Trimmed search text, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Proof of which fetch a response belongs to
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    pub filters: ListFilters,
}

#[derive(Debug)]
pub struct ListView<T> {
    items: Vec<T>,
    page: u32,
    total_pages: u32,
    total_elements: u64,
    filters: ListFilters,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl<T> ListView<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            total_pages: 0,
            total_elements: 0,
            filters: ListFilters::new(page_size),
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn filters(&self) -> &ListFilters {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Zero results without an error: a soft empty state
    pub fn is_empty_state(&self) -> bool {
        !self.loading && self.error.is_none() && self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Start a fetch; any ticket issued earlier becomes stale
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket {
            generation: self.generation,
            filters: self.filters.clone(),
        }
    }

    /// Apply a response. Returns `false` when the ticket is stale and the
    /// response was dropped.
    pub fn apply(&mut self, ticket: FetchTicket, result: AppResult<Page<T>>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Dropping stale list response"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.items = page.items;
                self.page = page.page;
                self.total_pages = page.total_pages;
                self.total_elements = page.total_elements;
                self.error = None;
            }
            Err(e) => {
                self.items.clear();
                self.total_pages = 0;
                self.total_elements = 0;
                self.error = Some(e.user_message());
            }
        }
        true
    }

    /// Fetch with the current filters and apply the result
    pub async fn load<F, Fut>(&mut self, fetch: F) -> bool
    where
        F: FnOnce(ListFilters) -> Fut,
        Fut: Future<Output = AppResult<Page<T>>>,
    {
        let ticket = self.begin_fetch();
        let result = fetch(ticket.filters.clone()).await;
        self.apply(ticket, result)
    }

    /// Returns whether the filters changed (and a refetch is due)
    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let search = search.into();
        if self.filters.search == search {
            return false;
        }
        self.filters.search = search;
        self.filters.page = 0;
        true
    }

    /// Set or, with `None` or a blank value, remove a filter
    pub fn set_filter(&mut self, key: &str, value: Option<String>) -> bool {
        let value = value.filter(|v| !v.trim().is_empty());
        let changed = match &value {
            Some(v) => self.filters.filters.get(key) != Some(v),
            None => self.filters.filters.contains_key(key),
        };
        if !changed {
            return false;
        }
        match value {
            Some(v) => {
                self.filters.filters.insert(key.to_string(), v);
            }
            None => {
                self.filters.filters.shift_remove(key);
            }
        }
        self.filters.page = 0;
        true
    }

    /// Clamped to the known page range
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = if self.total_pages > 0 {
            page.min(self.total_pages - 1)
        } else {
            page
        };
        if self.filters.page == page {
            return false;
        }
        self.filters.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.has_next() && self.set_page(self.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.has_previous() && self.set_page(self.page - 1)
    }
}
