//! HTTP client shared by every service module

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, de::IgnoredAny, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::HttpConfig,
    error::{AppError, AppResult},
    models::envelope::{error_message, unwrap_envelope, ListPayload, Page, Unwrapped},
};

pub type Query<'a> = &'a [(&'static str, String)];

/// Bearer token slot shared by all service clients and the session store
#[derive(Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}

/// Decoded body plus the envelope's message, when one was sent
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub message: Option<String>,
}

/// Client bound to one backend service
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    service: &'static str,
    credentials: Credentials,
}

impl ApiClient {
    /// Build the underlying connection pool
    pub fn build_http(config: &HttpConfig) -> AppResult<Client> {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(AppError::Network)
    }

    pub fn new(service: &'static str, base_url: &str, http: Client, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
            credentials,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> AppResult<T> {
        self.execute::<T, ()>(Method::GET, path, query, None)
            .await
            .map(|r| r.data)
    }

    /// GET a list endpoint, accepting page objects, bare arrays or an empty body
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> AppResult<Page<T>> {
        let body: Value = self.get(path, query).await?;
        if body.is_null() {
            return Ok(Page::empty());
        }
        let payload: ListPayload<T> = serde_json::from_value(body)?;
        Ok(payload.into())
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    /// POST without a request body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<ApiResponse<T>> {
        self.execute::<T, ()>(Method::POST, path, &[], None).await
    }

    /// PUT without a request body
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<ApiResponse<T>> {
        self.execute::<T, ()>(Method::PUT, path, &[], None).await
    }

    /// Body-less mutation whose payload is not needed
    pub async fn send(&self, method: Method, path: &str) -> AppResult<Option<String>> {
        self.execute::<IgnoredAny, ()>(method, path, &[], None)
            .await
            .map(|r| r.message)
    }

    pub async fn delete(&self, path: &str) -> AppResult<Option<String>> {
        self.send(Method::DELETE, path).await
    }

    /// Issue one request and normalize the response.
    ///
    /// Non-2xx statuses and `success: false` envelopes both become errors
    /// carrying the backend's message. Nothing is retried.
    pub async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<&B>,
    ) -> AppResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let request_id = Uuid::new_v4();

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("X-Request-Id", request_id.to_string());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.credentials.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            tracing::error!(
                service = self.service,
                %method,
                path,
                %request_id,
                error = %e,
                "Request could not be sent"
            );
            AppError::Network(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        if !status.is_success() {
            let message = error_message(&body)
                .or_else(|| body.as_str().filter(|s| !s.is_empty()).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
            tracing::warn!(
                service = self.service,
                %method,
                path,
                %request_id,
                status = status.as_u16(),
                duration_ms,
                "Request failed"
            );
            return Err(AppError::from_status(status, message));
        }

        tracing::debug!(
            service = self.service,
            %method,
            path,
            %request_id,
            status = status.as_u16(),
            duration_ms,
            "Request completed"
        );

        match unwrap_envelope(body) {
            Unwrapped::Ok { data, message } => Ok(ApiResponse {
                data: serde_json::from_value(data)?,
                message,
            }),
            Unwrapped::Failed { message } => Err(AppError::Request {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| "Request failed".to_string()),
            }),
        }
    }
}
