//! Reminder service administration

use crate::{
    api::ApiClient,
    error::AppResult,
    models::{
        envelope::Page,
        reminder::{
            ReminderConfig, ReminderHealth, ReminderLog, ReminderLogQuery, ReminderRunResult,
            ReminderStatistics,
        },
    },
};

#[derive(Clone)]
pub struct RemindersService {
    client: ApiClient,
}

impl RemindersService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn health(&self) -> AppResult<ReminderHealth> {
        self.client.get("/api/reminders/health", &[]).await
    }

    pub async fn statistics(&self) -> AppResult<ReminderStatistics> {
        self.client.get("/api/reminders/statistics", &[]).await
    }

    pub async fn logs(&self, query: &ReminderLogQuery) -> AppResult<Page<ReminderLog>> {
        self.client
            .get_list("/api/reminders/logs", &query.to_params())
            .await
    }

    /// Run the reminder job now instead of waiting for the schedule
    #[tracing::instrument(skip(self))]
    pub async fn trigger(&self) -> AppResult<ReminderRunResult> {
        let response = self.client.post_empty("/api/reminders/trigger").await?;
        Ok(response.data)
    }

    /// Resend reminders that failed; the only retry anywhere in the client
    #[tracing::instrument(skip(self))]
    pub async fn retry_failed(&self) -> AppResult<ReminderRunResult> {
        let response = self.client.post_empty("/api/reminders/retry").await?;
        Ok(response.data)
    }

    pub async fn config(&self) -> AppResult<ReminderConfig> {
        self.client.get("/api/reminders/config", &[]).await
    }

    #[tracing::instrument(skip(self, config))]
    pub async fn update_config(&self, config: &ReminderConfig) -> AppResult<ReminderConfig> {
        let response = self.client.put("/api/reminders/config", config).await?;
        Ok(response.data)
    }
}
