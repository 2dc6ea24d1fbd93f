//! Response envelopes and page shapes returned by the backend services
//!
//! The services answer in three shapes: the `{success, data, message}`
//! envelope, Spring page objects (`{content, totalPages, totalElements}`),
//! and bare JSON. Each shape gets exactly one normalization here so call
//! sites never probe the JSON themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{success, data, message}` wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Spring-style page object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    /// Zero-based page index
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// Either a page object or a bare array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Paged(PagedResult<T>),
    Plain(Vec<T>),
}

/// Normalized list result handed to list views
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index
    pub page: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            total_pages: 0,
            total_elements: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}

impl<T> From<ListPayload<T>> for Page<T> {
    fn from(payload: ListPayload<T>) -> Self {
        match payload {
            ListPayload::Paged(paged) => Page {
                items: paged.content,
                page: paged.number,
                total_pages: paged.total_pages,
                total_elements: paged.total_elements,
            },
            ListPayload::Plain(items) => {
                let total = items.len() as u64;
                Page {
                    items,
                    page: 0,
                    total_pages: if total == 0 { 0 } else { 1 },
                    total_elements: total,
                }
            }
        }
    }
}

/// Outcome of stripping the envelope from a response body
#[derive(Debug, Clone, PartialEq)]
pub enum Unwrapped {
    /// Payload (or the whole body when no envelope was present) and the
    /// optional success message
    Ok { data: Value, message: Option<String> },
    /// `success: false`
    Failed { message: Option<String> },
}

/// Strip the `{success, data, message}` envelope when present.
///
/// A body is treated as an envelope only when it is an object carrying a
/// boolean `success` field; anything else is returned unchanged.
pub fn unwrap_envelope(body: Value) -> Unwrapped {
    let Value::Object(mut map) = body else {
        return Unwrapped::Ok {
            data: body,
            message: None,
        };
    };

    let Some(success) = map.get("success").and_then(Value::as_bool) else {
        return Unwrapped::Ok {
            data: Value::Object(map),
            message: None,
        };
    };

    let message = map
        .remove("message")
        .and_then(|m| m.as_str().map(str::to_string));

    if success {
        Unwrapped::Ok {
            data: map.remove("data").unwrap_or(Value::Null),
            message,
        }
    } else {
        Unwrapped::Failed { message }
    }
}

/// Best-effort message extraction from an error body
pub fn error_message(body: &Value) -> Option<String> {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
