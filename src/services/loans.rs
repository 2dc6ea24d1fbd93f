//! Loan and reservation service (borrow service)

use reqwest::Method;

use crate::{
    api::{ApiClient, ApiResponse},
    error::AppResult,
    models::{
        envelope::Page,
        loan::{BorrowRecord, BorrowRequest, CheckoutRequest, LoanQuery, Reservation, ReservationRequest},
    },
};

#[derive(Clone)]
pub struct LoansService {
    client: ApiClient,
}

impl LoansService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All loans, filtered and paged
    pub async fn list(&self, query: &LoanQuery) -> AppResult<Page<BorrowRecord>> {
        self.client.get_list("/api/loans", &query.to_params()).await
    }

    /// Loans of one patron
    pub async fn for_user(&self, user_id: i64) -> AppResult<Page<BorrowRecord>> {
        self.client
            .get_list(&format!("/api/loans/user/{}", user_id), &[])
            .await
    }

    pub async fn overdue(&self) -> AppResult<Page<BorrowRecord>> {
        self.client.get_list("/api/loans/overdue", &[]).await
    }

    /// Borrow a single book
    #[tracing::instrument(skip(self))]
    pub async fn borrow(&self, user_id: i64, book_id: i64) -> AppResult<BorrowRecord> {
        let response = self
            .client
            .post("/api/loans/borrow", &BorrowRequest { user_id, book_id })
            .await?;
        Ok(response.data)
    }

    /// Librarian checkout of several books at once
    #[tracing::instrument(skip(self, request), fields(user_id = request.user_id, books = request.book_ids.len()))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> AppResult<Vec<BorrowRecord>> {
        let response: ApiResponse<Vec<BorrowRecord>> =
            self.client.post("/api/loans/checkout", request).await?;
        tracing::info!(created = response.data.len(), "Checkout completed");
        Ok(response.data)
    }

    #[tracing::instrument(skip(self))]
    pub async fn return_loan(&self, loan_id: i64) -> AppResult<BorrowRecord> {
        let response = self
            .client
            .put_empty(&format!("/api/loans/{}/return", loan_id))
            .await?;
        Ok(response.data)
    }

    #[tracing::instrument(skip(self))]
    pub async fn renew(&self, loan_id: i64) -> AppResult<BorrowRecord> {
        let response = self
            .client
            .put_empty(&format!("/api/loans/{}/renew", loan_id))
            .await?;
        Ok(response.data)
    }

    // Reservations

    pub async fn reservations(&self) -> AppResult<Page<Reservation>> {
        self.client.get_list("/api/reservations", &[]).await
    }

    pub async fn reservations_for_user(&self, user_id: i64) -> AppResult<Page<Reservation>> {
        self.client
            .get_list(&format!("/api/reservations/user/{}", user_id), &[])
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn reserve(&self, user_id: i64, book_id: i64) -> AppResult<Reservation> {
        let response = self
            .client
            .post("/api/reservations", &ReservationRequest { user_id, book_id })
            .await?;
        Ok(response.data)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_reservation(&self, reservation_id: i64) -> AppResult<Option<String>> {
        self.client
            .send(Method::DELETE, &format!("/api/reservations/{}", reservation_id))
            .await
    }
}
