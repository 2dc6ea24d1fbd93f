//! Book catalog service

use crate::{
    api::{ApiClient, ApiResponse},
    error::AppResult,
    models::{
        book::{Book, BookPayload, BookQuery, CopiesRequest},
        envelope::Page,
    },
};

#[derive(Clone)]
pub struct BooksService {
    client: ApiClient,
}

impl BooksService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List books with paging and filters
    pub async fn list(&self, query: &BookQuery) -> AppResult<Page<Book>> {
        self.client.get_list("/api/books", &query.to_params()).await
    }

    /// Free-text search across title, author and ISBN
    pub async fn search(&self, text: &str) -> AppResult<Page<Book>> {
        self.client
            .get_list("/api/books/search", &[("query", text.trim().to_string())])
            .await
    }

    pub async fn get(&self, book_id: i64) -> AppResult<Book> {
        self.client.get(&format!("/api/books/{}", book_id), &[]).await
    }

    #[tracing::instrument(skip(self, book), fields(title = %book.title))]
    pub async fn create(&self, book: &BookPayload) -> AppResult<Book> {
        let response: ApiResponse<Book> = self.client.post("/api/books", book).await?;
        tracing::info!(book_id = response.data.id, "Book created");
        Ok(response.data)
    }

    #[tracing::instrument(skip(self, book))]
    pub async fn update(&self, book_id: i64, book: &BookPayload) -> AppResult<Book> {
        let response = self.client.put(&format!("/api/books/{}", book_id), book).await?;
        Ok(response.data)
    }

    /// Delete a book. The service refuses when copies are still out.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, book_id: i64) -> AppResult<Option<String>> {
        self.client.delete(&format!("/api/books/{}", book_id)).await
    }

    pub async fn genres(&self) -> AppResult<Vec<String>> {
        self.client.get("/api/books/genres", &[]).await
    }

    /// Write off copies as lost
    #[tracing::instrument(skip(self))]
    pub async fn mark_lost(&self, book_id: i64, count: u32) -> AppResult<Book> {
        let response = self
            .client
            .post(&format!("/api/books/{}/lost", book_id), &CopiesRequest { count })
            .await?;
        Ok(response.data)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_copies(&self, book_id: i64, count: u32) -> AppResult<Book> {
        let response = self
            .client
            .post(&format!("/api/books/{}/add-copies", book_id), &CopiesRequest { count })
            .await?;
        Ok(response.data)
    }
}
