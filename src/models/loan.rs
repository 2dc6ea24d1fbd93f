//! Loan (borrow) and reservation models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{LoanStatus, ReservationStatus};

/// Borrow record from the borrow service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[serde(default)]
    pub renew_count: u32,
    #[serde(default)]
    pub fine_amount: Option<Decimal>,
}

impl BorrowRecord {
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Overdue || (self.status.is_open() && self.due_date < now)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub user_id: i64,
    pub book_id: i64,
}

/// Librarian checkout of several books for one patron
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: i64,
    pub book_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub search: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl LoanQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(status) = self.status {
            if let Ok(serde_json::Value::String(s)) = serde_json::to_value(status) {
                params.push(("status", s));
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.trim().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    #[serde(default)]
    pub book_title: Option<String>,
    pub status: ReservationStatus,
    pub reserved_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub user_id: i64,
    pub book_id: i64,
}
