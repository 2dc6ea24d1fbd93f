//! Authentication calls against the user service

use crate::{
    api::ApiClient,
    error::AppResult,
    models::user::{LoginRequest, LoginResponse, User},
};

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token and the user profile
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.client.post("/api/auth/login", &request).await?;
        Ok(response.data)
    }

    /// Profile of the token holder; fails with `Authentication` on a dead token
    pub async fn me(&self) -> AppResult<User> {
        self.client.get("/api/auth/me", &[]).await
    }
}
