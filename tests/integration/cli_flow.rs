//! Commands run end to end through `cli::run`

use std::sync::Arc;

use clap::Parser;
use pretty_assertions::assert_eq;

use library_portal::{
    cli::{self, Cli},
    config::{AppConfig, ServicesConfig},
    models::enums::Role,
    session::{MemoryTokenStore, TokenStore},
    AppError, AppResult, Portal,
};

use crate::common::{token_for, MockBackend, ADMIN_PASSWORD, STUDENT_PASSWORD};

async fn run(portal: &Portal, args: &[&str]) -> AppResult<()> {
    let mut argv = vec!["library-portal"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap(), portal).await
}

/// Portal whose stored token belongs to `username`
async fn signed_in(backend: &MockBackend, username: &str, password: &str) -> Portal {
    let tokens = Arc::new(MemoryTokenStore::new());
    backend
        .portal_with(tokens.clone())
        .session
        .login(username, password)
        .await
        .unwrap();

    let mut config = backend.config();
    config.ui.toast_close_ms = 10;
    Portal::new(config, tokens).unwrap()
}

#[tokio::test]
async fn test_student_cannot_add_books() {
    let backend = MockBackend::start().await;
    let portal = signed_in(&backend, "reader", STUDENT_PASSWORD).await;

    let err = run(&portal, &["book", "add", "--title", "Refactoring", "--author", "Martin Fowler"])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)), "{:?}", err);
    assert!(backend.state.service_requests().is_empty());
}

#[tokio::test]
async fn test_student_cannot_manage_users_or_reminders() {
    let backend = MockBackend::start().await;
    let portal = signed_in(&backend, "reader", STUDENT_PASSWORD).await;

    let err = run(
        &portal,
        &[
            "user",
            "add",
            "--username",
            "mallory",
            "--email",
            "mallory@library.test",
            "--password",
            "Sneaky#2024",
            "--first-name",
            "Mallory",
            "--last-name",
            "Doe",
            "--role",
            "ADMIN",
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)), "{:?}", err);

    let err = run(&portal, &["reminder", "trigger"]).await.unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)), "{:?}", err);

    assert!(backend.state.service_requests().is_empty());
}

#[tokio::test]
async fn test_pending_password_change_blocks_screens_and_actions() {
    let backend = MockBackend::start().await;
    let portal = signed_in(&backend, "newbie", STUDENT_PASSWORD).await;

    // The screen redirects to the password change instead of loading
    run(&portal, &["open", "books"]).await.unwrap();

    let err = run(&portal, &["reserve", "add", "--book", "1"]).await.unwrap_err();
    assert!(err.user_message().contains("change your password"), "{}", err.user_message());

    assert!(backend.state.service_requests().is_empty());
}

#[tokio::test]
async fn test_signed_out_action_asks_for_login() {
    let backend = MockBackend::start().await;
    let portal = backend.portal();

    let err = run(&portal, &["book", "add", "--title", "Refactoring", "--author", "Martin Fowler"])
        .await
        .unwrap_err();
    assert!(err.is_unauthenticated());
    // No token, so not even a session check was made
    assert!(backend.state.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_librarian_adds_book() {
    let backend = MockBackend::start().await;
    let portal = signed_in(&backend, "librarian", ADMIN_PASSWORD).await;

    run(&portal, &["book", "add", "--title", "Refactoring", "--author", "Martin Fowler", "--copies", "2"])
        .await
        .unwrap();

    let calls = backend.state.requests_to("/api/books");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "POST");
}

fn unreachable_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.services = ServicesConfig::all_at("http://127.0.0.1:1");
    config
}

#[tokio::test]
async fn test_logout_works_without_backend() {
    let tokens = Arc::new(MemoryTokenStore::with_token(&token_for(1, Role::Admin, 3600)));
    let portal = Portal::new(unreachable_config(), tokens.clone()).unwrap();

    run(&portal, &["logout"]).await.unwrap();
    assert_eq!(tokens.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_whoami_reports_unreachable_backend() {
    let token = token_for(1, Role::Admin, 3600);
    let tokens = Arc::new(MemoryTokenStore::with_token(&token));
    let portal = Portal::new(unreachable_config(), tokens.clone()).unwrap();

    run(&portal, &["whoami"]).await.unwrap();
    // The token is kept for the next attempt
    assert_eq!(tokens.load().await.unwrap(), Some(token));

    // Commands that need the backend still fail
    let err = run(&portal, &["open", "books"]).await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)), "{:?}", err);
}
