//! User management service

use reqwest::Method;

use crate::{
    api::ApiClient,
    error::AppResult,
    models::{
        enums::Role,
        envelope::Page,
        user::{ChangePasswordRequest, CreateUser, UpdateUser, User},
    },
};

#[derive(Clone)]
pub struct UsersService {
    client: ApiClient,
}

impl UsersService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, search: Option<&str>, page: u32, size: u32) -> AppResult<Page<User>> {
        let mut params = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        self.client.get_list("/api/users", &params).await
    }

    pub async fn by_role(&self, role: &Role) -> AppResult<Page<User>> {
        self.client
            .get_list(&format!("/api/users/role/{}", role.as_str()), &[])
            .await
    }

    pub async fn get(&self, user_id: i64) -> AppResult<User> {
        self.client.get(&format!("/api/users/{}", user_id), &[]).await
    }

    #[tracing::instrument(skip(self, user), fields(username = %user.username, role = %user.role))]
    pub async fn create(&self, user: &CreateUser) -> AppResult<User> {
        let response = self.client.post("/api/users", user).await?;
        Ok(response.data)
    }

    #[tracing::instrument(skip(self, user))]
    pub async fn update(&self, user_id: i64, user: &UpdateUser) -> AppResult<User> {
        let response = self.client.put(&format!("/api/users/{}", user_id), user).await?;
        Ok(response.data)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: i64) -> AppResult<Option<String>> {
        self.client.delete(&format!("/api/users/{}", user_id)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn activate(&self, user_id: i64) -> AppResult<Option<String>> {
        self.client
            .send(Method::PUT, &format!("/api/users/{}/activate", user_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn deactivate(&self, user_id: i64) -> AppResult<Option<String>> {
        self.client
            .send(Method::PUT, &format!("/api/users/{}/deactivate", user_id))
            .await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn change_password(&self, user_id: i64, request: &ChangePasswordRequest) -> AppResult<Option<String>> {
        let response: crate::api::ApiResponse<serde::de::IgnoredAny> = self
            .client
            .put(&format!("/api/users/{}/change-password", user_id), request)
            .await?;
        Ok(response.message)
    }
}
