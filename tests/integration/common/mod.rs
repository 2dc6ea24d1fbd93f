//! In-process mock of the library microservices

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use library_portal::{
    config::{AppConfig, ServicesConfig},
    models::{enums::Role, user::TokenClaims},
    session::{MemoryTokenStore, TokenStore},
    Portal,
};

pub const ADMIN_PASSWORD: &str = "Admin#2024";
pub const STUDENT_PASSWORD: &str = "Welcome#2024";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    pub requests: Mutex<Vec<Recorded>>,
    /// token -> user id
    pub sessions: Mutex<HashMap<String, i64>>,
    pub books: Mutex<Vec<Value>>,
}

impl MockState {
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Everything except login and session checks
    pub fn service_requests(&self) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.path.starts_with("/api/auth/"))
            .cloned()
            .collect()
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        *state.books.lock().unwrap() = vec![
            book(1, "Dune", "Frank Herbert", 3, 2),
            book(2, "Clean Code", "Robert C. Martin", 2, 2),
        ];

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/books", get(list_books).post(create_book))
            .route("/api/books/search", get(search_books))
            .route("/api/loans", get(list_loans))
            .route("/api/loans/overdue", get(overdue_loans))
            .route("/api/reservations", get(empty_list))
            .route("/api/payments/fines/summary", get(fine_summary))
            .route("/api/users/:id/change-password", put(change_password))
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.services = ServicesConfig::all_at(&self.base_url);
        config
    }

    pub fn portal(&self) -> Portal {
        self.portal_with(Arc::new(MemoryTokenStore::new()))
    }

    pub fn portal_with(&self, tokens: Arc<dyn TokenStore>) -> Portal {
        Portal::new(self.config(), tokens).unwrap()
    }
}

pub fn book(id: i64, title: &str, author: &str, total: u32, available: u32) -> Value {
    json!({
        "id": id,
        "title": title,
        "author": author,
        "totalCopies": total,
        "availableCopies": available
    })
}

fn user(id: i64) -> Option<Value> {
    let (username, role, must_change) = match id {
        1 => ("admin", "ADMIN", false),
        2 => ("librarian", "LIBRARIAN", false),
        3 => ("newbie", "STUDENT", true),
        4 => ("auditor", "AUDITOR", false),
        5 => ("reader", "STUDENT", false),
        _ => return None,
    };
    Some(json!({
        "id": id,
        "username": username,
        "email": format!("{}@library.test", username),
        "firstName": username,
        "role": role,
        "active": true,
        "mustChangePassword": must_change
    }))
}

pub fn token_for(user_id: i64, role: Role, expires_in_secs: i64) -> String {
    let claims = TokenClaims {
        sub: format!("user-{}", user_id),
        role: Some(role),
        user_id: Some(user_id),
        exp: Utc::now().timestamp() + expires_in_secs,
        iat: Some(Utc::now().timestamp()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    // Nothing borrowed from the request may live across the await below
    let recorded = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Recorded {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            authorization: header("authorization"),
            request_id: header("x-request-id"),
        }
    };
    state.requests.lock().unwrap().push(recorded);
    next.run(request).await
}

fn bearer_user(state: &MockState, headers: &HeaderMap) -> Option<i64> {
    let token = headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    state.sessions.lock().unwrap().get(token).copied()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"success": false, "message": "No such endpoint"})),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": "Token is invalid or expired"})),
    )
        .into_response()
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let (id, role) = match (username, password) {
        ("admin", ADMIN_PASSWORD) => (1, Role::Admin),
        ("librarian", ADMIN_PASSWORD) => (2, Role::Librarian),
        ("newbie", STUDENT_PASSWORD) => (3, Role::Student),
        ("auditor", ADMIN_PASSWORD) => (4, Role::Unknown("AUDITOR".to_string())),
        ("reader", STUDENT_PASSWORD) => (5, Role::Student),
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "message": "Invalid username or password"})),
            )
                .into_response()
        }
    };
    let token = token_for(id, role, 3600);
    state.sessions.lock().unwrap().insert(token.clone(), id);
    Json(json!({
        "success": true,
        "data": { "token": token, "user": user(id) },
        "message": "Login successful"
    }))
    .into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    match bearer_user(&state, &headers).and_then(user) {
        Some(profile) => Json(json!({"success": true, "data": profile})).into_response(),
        None => unauthorized(),
    }
}

/// Spring page inside the envelope
async fn list_books(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if bearer_user(&state, &headers).is_none() {
        return unauthorized();
    }
    let books = state.books.lock().unwrap().clone();
    Json(json!({
        "success": true,
        "data": {
            "content": books,
            "totalPages": 2,
            "totalElements": 12,
            "number": 0,
            "size": 10
        }
    }))
    .into_response()
}

/// Bare array, no envelope
async fn search_books(State(state): State<Arc<MockState>>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let term = params.get("query").cloned().unwrap_or_default().to_lowercase();
    let books: Vec<Value> = state
        .books
        .lock()
        .unwrap()
        .iter()
        .filter(|b| b["title"].as_str().unwrap_or_default().to_lowercase().contains(&term))
        .cloned()
        .collect();
    Json(Value::Array(books))
}

async fn create_book(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer_user(&state, &headers).is_none() {
        return unauthorized();
    }
    let title = body["title"].as_str().unwrap_or_default().to_string();
    let mut books = state.books.lock().unwrap();
    if books.iter().any(|b| b["title"] == title.as_str()) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"success": false, "message": "A book with this title already exists"})),
        )
            .into_response();
    }
    let copies = body["totalCopies"].as_u64().unwrap_or(1) as u32;
    let created = book(
        books.len() as i64 + 1,
        &title,
        body["author"].as_str().unwrap_or_default(),
        copies,
        copies,
    );
    books.push(created.clone());
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "data": created, "message": "Book created"})),
    )
        .into_response()
}

async fn list_loans() -> Json<Value> {
    Json(json!({"success": true, "data": []}))
}

/// The service answers 200 but reports failure in the envelope
async fn overdue_loans() -> Json<Value> {
    Json(json!({"success": false, "message": "Borrow service is degraded"}))
}

async fn empty_list() -> Json<Value> {
    Json(json!([]))
}

async fn fine_summary() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "totalOutstanding": 12.5,
            "totalPaid": 40,
            "totalWaived": 0,
            "outstandingCount": 3
        }
    }))
}

async fn change_password(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if bearer_user(&state, &headers) != Some(id) {
        return unauthorized();
    }
    if body["currentPassword"] != STUDENT_PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Current password is incorrect"})),
        )
            .into_response();
    }
    Json(json!({"success": true, "message": "Password updated"})).into_response()
}
