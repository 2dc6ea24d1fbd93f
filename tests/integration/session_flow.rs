//! Login, restore, logout and password change against the mock backend

use std::sync::Arc;

use pretty_assertions::assert_eq;

use library_portal::{
    dashboard::{load_dashboard, Dashboard},
    models::enums::Role,
    session::{guard_route, landing, GuardDecision, MemoryTokenStore, Route, SessionState, TokenStore},
    views::{forms::ChangePasswordForm, Viewer},
    AppError,
};

use crate::common::{token_for, MockBackend, ADMIN_PASSWORD, STUDENT_PASSWORD};

#[tokio::test]
async fn test_admin_login_lands_on_users() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let portal = backend.portal_with(tokens.clone());

    let state = portal.session.login("admin", ADMIN_PASSWORD).await.unwrap();
    assert!(matches!(state, SessionState::Active(_)));
    assert_eq!(state.role(), Some(&Role::Admin));

    assert_eq!(landing(&state), GuardDecision::Redirect(Route::Users));
    assert_eq!(guard_route(Route::Users, &state), GuardDecision::Render);
    assert_eq!(guard_route(Route::Login, &state), GuardDecision::Redirect(Route::Users));

    // Token persisted for the next run
    let stored = tokens.load().await.unwrap();
    assert_eq!(stored.as_deref(), state.session().map(|s| s.token.as_str()));

    let login = backend.state.requests_to("/api/auth/login");
    assert_eq!(login.len(), 1);
    assert_eq!(login[0].method, "POST");
    assert!(login[0].request_id.is_some());
}

#[tokio::test]
async fn test_bad_credentials_surface_backend_message() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let portal = backend.portal_with(tokens.clone());

    let err = portal.session.login("admin", "wrong").await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(err.user_message(), "Invalid username or password");
    assert_eq!(tokens.load().await.unwrap(), None);
    assert!(!portal.session.get_session().await.is_authenticated());
}

#[tokio::test]
async fn test_restore_reuses_a_valid_token() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());

    backend
        .portal_with(tokens.clone())
        .session
        .login("librarian", ADMIN_PASSWORD)
        .await
        .unwrap();

    // A fresh process with the same token store
    let portal = backend.portal_with(tokens.clone());
    assert_eq!(portal.session.get_session().await, SessionState::Loading);
    let state = portal.session.restore().await.unwrap();
    assert!(matches!(state, SessionState::Active(_)));
    assert_eq!(state.user().map(|u| u.username.as_str()), Some("librarian"));

    let me = backend.state.requests_to("/api/auth/me");
    assert_eq!(me.len(), 1);
    assert!(me[0].authorization.as_deref().unwrap_or_default().starts_with("Bearer "));
}

#[tokio::test]
async fn test_restore_drops_a_rejected_token() {
    let backend = MockBackend::start().await;
    // Well-formed and unexpired, but unknown to the backend
    let token = token_for(1, Role::Admin, 3600);
    let tokens = Arc::new(MemoryTokenStore::with_token(&token));
    let portal = backend.portal_with(tokens.clone());

    let state = portal.session.restore().await.unwrap();
    assert_eq!(state, SessionState::Anonymous);
    assert_eq!(tokens.load().await.unwrap(), None);
    assert_eq!(guard_route(Route::Books, &state), GuardDecision::Redirect(Route::Login));
}

#[tokio::test]
async fn test_restore_skips_the_backend_for_an_expired_token() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(&token_for(1, Role::Admin, -60)));
    let portal = backend.portal_with(tokens.clone());

    assert_eq!(portal.session.restore().await.unwrap(), SessionState::Anonymous);
    assert!(backend.state.requests_to("/api/auth/me").is_empty());
    assert_eq!(tokens.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_forced_password_change_flow() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let portal = backend.portal_with(tokens.clone());

    let state = portal.session.login("newbie", STUDENT_PASSWORD).await.unwrap();
    assert!(matches!(state, SessionState::MustChangePassword(_)));
    assert_eq!(
        guard_route(Route::Dashboard, &state),
        GuardDecision::Redirect(Route::ChangePassword)
    );
    assert_eq!(guard_route(Route::ChangePassword, &state), GuardDecision::Render);

    // Reusing the current password never reaches the backend
    let same = ChangePasswordForm {
        current_password: STUDENT_PASSWORD.to_string(),
        new_password: STUDENT_PASSWORD.to_string(),
        confirm_password: STUDENT_PASSWORD.to_string(),
    };
    let err = portal.session.change_password(&same).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.user_message().contains("must be different"));
    assert_eq!(portal.session.get_session().await, state);
    assert!(backend.state.requests_to("/api/users/3/change-password").is_empty());

    let form = ChangePasswordForm {
        current_password: STUDENT_PASSWORD.to_string(),
        new_password: "Fresh#Start9".to_string(),
        confirm_password: "Fresh#Start9".to_string(),
    };
    let (next, message) = portal.session.change_password(&form).await.unwrap();
    assert_eq!(next, SessionState::Anonymous);
    assert_eq!(message.as_deref(), Some("Password updated"));
    assert_eq!(tokens.load().await.unwrap(), None);

    let calls = backend.state.requests_to("/api/users/3/change-password");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "PUT");
}

#[tokio::test]
async fn test_wrong_current_password_keeps_the_session() {
    let backend = MockBackend::start().await;
    let portal = backend.portal();

    let state = portal.session.login("newbie", STUDENT_PASSWORD).await.unwrap();
    let form = ChangePasswordForm {
        current_password: "Not#Mine1".to_string(),
        new_password: "Fresh#Start9".to_string(),
        confirm_password: "Fresh#Start9".to_string(),
    };
    let err = portal.session.change_password(&form).await.unwrap_err();
    assert_eq!(err.user_message(), "Current password is incorrect");
    assert_eq!(portal.session.get_session().await, state);
}

#[tokio::test]
async fn test_unknown_role_gets_placeholder() {
    let backend = MockBackend::start().await;
    let portal = backend.portal();

    let state = portal.session.login("auditor", ADMIN_PASSWORD).await.unwrap();
    assert_eq!(landing(&state), GuardDecision::UnknownRole("AUDITOR".to_string()));

    let session = state.session().unwrap();
    let dashboard = load_dashboard(&portal.services, &Viewer::from_session(session)).await;
    assert!(matches!(dashboard, Dashboard::UnknownRole(raw) if raw == "AUDITOR"));
}

#[tokio::test]
async fn test_logout_clears_token_and_header() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let portal = backend.portal_with(tokens.clone());

    portal.session.login("admin", ADMIN_PASSWORD).await.unwrap();
    assert_eq!(portal.session.logout().await, SessionState::Anonymous);
    assert_eq!(tokens.load().await.unwrap(), None);

    // Requests after logout carry no bearer token
    let err = portal.services.auth.me().await.unwrap_err();
    assert!(err.is_unauthenticated());
    let me = backend.state.requests_to("/api/auth/me");
    assert_eq!(me.last().and_then(|r| r.authorization.clone()), None);
}
