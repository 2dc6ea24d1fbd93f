//! Fine payment service

use crate::{
    api::ApiClient,
    error::AppResult,
    models::{
        envelope::Page,
        payment::{Fine, FineSummary, PayFineRequest, WaiveFineRequest},
    },
};

#[derive(Clone)]
pub struct PaymentsService {
    client: ApiClient,
}

impl PaymentsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn fines(&self, page: u32, size: u32) -> AppResult<Page<Fine>> {
        self.client
            .get_list(
                "/api/payments/fines",
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await
    }

    pub async fn fines_for_user(&self, user_id: i64) -> AppResult<Page<Fine>> {
        self.client
            .get_list(&format!("/api/payments/fines/user/{}", user_id), &[])
            .await
    }

    #[tracing::instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn pay(&self, fine_id: i64, request: &PayFineRequest) -> AppResult<Fine> {
        let response = self
            .client
            .post(&format!("/api/payments/fines/{}/pay", fine_id), request)
            .await?;
        Ok(response.data)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn waive(&self, fine_id: i64, request: &WaiveFineRequest) -> AppResult<Fine> {
        let response = self
            .client
            .post(&format!("/api/payments/fines/{}/waive", fine_id), request)
            .await?;
        Ok(response.data)
    }

    pub async fn summary(&self) -> AppResult<FineSummary> {
        self.client.get("/api/payments/fines/summary", &[]).await
    }
}
