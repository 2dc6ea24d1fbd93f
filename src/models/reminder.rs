//! Reminder service models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ReminderStatus, ReminderType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderHealth {
    pub status: String,
    #[serde(default)]
    pub scheduler_running: Option<bool>,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

impl ReminderHealth {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("up") || self.status.eq_ignore_ascii_case("healthy")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderStatistics {
    #[serde(default)]
    pub total_sent: u64,
    #[serde(default)]
    pub total_failed: u64,
    #[serde(default)]
    pub total_pending: u64,
    #[serde(default)]
    pub sent_today: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderLog {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub borrow_record_id: Option<i64>,
    pub reminder_type: ReminderType,
    pub status: ReminderStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderConfig {
    pub enabled: bool,
    /// Days before the due date the "due soon" reminder goes out
    pub days_before_due: u32,
    /// Days between two overdue reminders
    pub overdue_interval_days: u32,
    pub max_overdue_reminders: u32,
    #[serde(default)]
    pub send_time: Option<String>,
}

/// Result of a manual trigger or retry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRunResult {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub failed: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderLogQuery {
    pub user_id: Option<i64>,
    pub status: Option<ReminderStatus>,
    pub page: u32,
    pub size: u32,
}

impl ReminderLogQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(user_id) = self.user_id {
            params.push(("userId", user_id.to_string()));
        }
        if let Some(status) = self.status {
            if let Ok(serde_json::Value::String(s)) = serde_json::to_value(status) {
                params.push(("status", s));
            }
        }
        params
    }
}
