//! Session store: the single owner of the current session

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::state::SessionState;
use super::token_store::TokenStore;
use crate::{
    api::Credentials,
    config::SessionConfig,
    error::{AppError, AppResult},
    models::user::{ChangePasswordRequest, TokenClaims},
    services::{auth::AuthService, users::UsersService, Services},
    views::forms::{ChangePasswordForm, FormModel},
};

/// Holds the session and performs every transition on it.
///
/// Cloning shares the same state; consumers receive it explicitly.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    auth: AuthService,
    users: UsersService,
    credentials: Credentials,
    tokens: Arc<dyn TokenStore>,
    relogin_after_password_change: bool,
}

impl SessionStore {
    pub fn new(
        services: &Services,
        credentials: Credentials,
        tokens: Arc<dyn TokenStore>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::Loading)),
            auth: services.auth.clone(),
            users: services.users.clone(),
            credentials,
            tokens,
            relogin_after_password_change: config.relogin_after_password_change,
        }
    }

    pub async fn get_session(&self) -> SessionState {
        self.state.read().await.clone()
    }

    async fn set_state(&self, next: SessionState) -> SessionState {
        let mut state = self.state.write().await;
        if state.label() != next.label() {
            tracing::debug!(from = state.label(), to = next.label(), "Session transition");
        }
        *state = next.clone();
        next
    }

    /// Resolve the stored token at boot.
    ///
    /// Missing, unreadable and expired tokens end in `Anonymous`. A token the
    /// backend rejects is deleted. When the backend cannot be reached the
    /// token is kept for the next attempt and the error is returned.
    pub async fn restore(&self) -> AppResult<SessionState> {
        self.set_state(SessionState::Loading).await;

        let Some(token) = self.tokens.load().await? else {
            return Ok(self.set_state(SessionState::Anonymous).await);
        };

        match TokenClaims::decode_unverified(&token) {
            Ok(claims) if !claims.is_expired_at(Utc::now()) => {}
            Ok(_) => {
                tracing::info!("Stored token expired");
                return self.drop_token().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored token unreadable");
                return self.drop_token().await;
            }
        }

        self.credentials.set(token.clone()).await;
        match self.auth.me().await {
            Ok(user) => {
                tracing::info!(user_id = user.id, role = %user.role, "Session restored");
                Ok(self.set_state(SessionState::authenticated(user, token)).await)
            }
            Err(e) if e.is_unauthenticated() => {
                tracing::info!("Stored token rejected by the server");
                self.drop_token().await
            }
            Err(e) => {
                self.credentials.clear().await;
                self.set_state(SessionState::Anonymous).await;
                Err(e)
            }
        }
    }

    async fn drop_token(&self) -> AppResult<SessionState> {
        self.credentials.clear().await;
        self.tokens.clear().await?;
        Ok(self.set_state(SessionState::Anonymous).await)
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AppResult<SessionState> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("Username and password are required".to_string()));
        }

        let response = self.auth.login(username.trim(), password).await?;
        self.credentials.set(response.token.clone()).await;
        self.tokens.save(&response.token).await?;

        let state = SessionState::authenticated(response.user, response.token);
        tracing::info!(state = state.label(), "Logged in");
        Ok(self.set_state(state).await)
    }

    /// Back to `Anonymous` from any state
    pub async fn logout(&self) -> SessionState {
        self.credentials.clear().await;
        if let Err(e) = self.tokens.clear().await {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }
        tracing::info!("Logged out");
        self.set_state(SessionState::Anonymous).await
    }

    /// Change the password of the session's user.
    ///
    /// Validation failures leave the session untouched. On success the
    /// session ends (re-login required) unless configured otherwise.
    pub async fn change_password(&self, form: &ChangePasswordForm) -> AppResult<(SessionState, Option<String>)> {
        let current = self.get_session().await;
        let Some(session) = current.session() else {
            return Err(AppError::Authentication("Not signed in".to_string()));
        };

        form.check().map_err(|errors| {
            AppError::Validation(
                errors
                    .into_values()
                    .next()
                    .unwrap_or_else(|| "Invalid input".to_string()),
            )
        })?;

        let request = ChangePasswordRequest {
            current_password: form.current_password.clone(),
            new_password: form.new_password.clone(),
        };
        let message = self.users.change_password(session.user.id, &request).await?;
        tracing::info!(user_id = session.user.id, "Password changed");

        let next = if self.relogin_after_password_change {
            self.logout().await
        } else {
            let mut refreshed = session.clone();
            refreshed.user.must_change_password = false;
            self.set_state(SessionState::Active(refreshed)).await
        };
        Ok((next, message))
    }
}
