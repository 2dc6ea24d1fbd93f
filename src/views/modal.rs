//! Modal lifecycle: open → validate → submit → success/failure → close/retain

use std::future::Future;
use std::time::Duration;

use super::forms::{FieldErrors, FormModel, FORM_ERROR};
use crate::config::UiConfig;
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Transient notification shown after a submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

/// State of one modal. The form only exists while the modal is open.
#[derive(Debug)]
pub struct Modal<F: FormModel> {
    form: Option<F>,
    errors: FieldErrors,
    loading: bool,
    outcome: Option<Toast>,
    close_delay: Duration,
}

impl<F: FormModel> Modal<F> {
    pub fn new(ui: &UiConfig) -> Self {
        Self::with_close_delay(ui.toast_close())
    }

    pub fn with_close_delay(close_delay: Duration) -> Self {
        Self {
            form: None,
            errors: FieldErrors::new(),
            loading: false,
            outcome: None,
            close_delay,
        }
    }

    /// Open seeded with an entity's values (edit) or a blank form (create)
    pub fn open(&mut self, form: F) {
        self.form = Some(form);
        self.errors.clear();
        self.loading = false;
        self.outcome = None;
    }

    pub fn open_default(&mut self)
    where
        F: Default,
    {
        self.open(F::default());
    }

    pub fn close(&mut self) {
        self.form = None;
        self.errors.clear();
        self.loading = false;
    }

    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        self.is_open() && !self.loading
    }

    pub fn form(&self) -> Option<&F> {
        self.form.as_ref()
    }

    /// Editing is locked while a submit is in flight
    pub fn form_mut(&mut self) -> Option<&mut F> {
        if self.loading {
            return None;
        }
        self.form.as_mut()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn outcome(&self) -> Option<&Toast> {
        self.outcome.as_ref()
    }

    pub fn close_delay(&self) -> Duration {
        self.close_delay
    }

    /// Validate and lock the modal for submission.
    ///
    /// Returns the form to send, or `None` when the modal is closed, already
    /// submitting, or the form is invalid (errors are then populated).
    pub fn begin_submit(&mut self) -> Option<F> {
        if !self.can_submit() {
            return None;
        }
        let form = self.form.as_ref()?;
        match form.check() {
            Ok(()) => {
                let snapshot = form.clone();
                self.errors.clear();
                self.outcome = None;
                self.loading = true;
                Some(snapshot)
            }
            Err(errors) => {
                tracing::debug!(fields = errors.len(), "Form rejected before submit");
                self.errors = errors;
                None
            }
        }
    }

    /// Record the service's answer and pass it on. Failures stay inline and
    /// keep the modal open.
    pub fn complete<T>(&mut self, result: AppResult<T>, success_message: &str) -> AppResult<T> {
        self.loading = false;
        match &result {
            Ok(_) => {
                self.errors.clear();
                self.outcome = Some(Toast::success(success_message));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Modal submit failed");
                let message = e.user_message();
                self.errors.insert(FORM_ERROR.to_string(), message.clone());
                self.outcome = Some(Toast::error(message));
            }
        }
        result
    }

    /// Run the whole submit: validate, call `action` once, then on success
    /// hand the result to `on_success` (the parent's refresh).
    ///
    /// `Ok(None)` means nothing was sent: the modal is closed, busy, or the
    /// form failed validation.
    pub async fn submit<T, A, Fut, S>(
        &mut self,
        action: A,
        success_message: &str,
        on_success: S,
    ) -> AppResult<Option<T>>
    where
        A: FnOnce(F) -> Fut,
        Fut: Future<Output = AppResult<T>>,
        S: FnOnce(&T),
    {
        let Some(form) = self.begin_submit() else {
            return Ok(None);
        };
        let value = self.complete(action(form).await, success_message)?;
        on_success(&value);
        Ok(Some(value))
    }

    /// Wait out the toast, then close if the last submit succeeded
    pub async fn auto_close(&mut self) {
        if !self.succeeded() {
            return;
        }
        tokio::time::sleep(self.close_delay).await;
        if self.succeeded() {
            self.close();
        }
    }

    fn succeeded(&self) -> bool {
        matches!(&self.outcome, Some(Toast { kind: ToastKind::Success, .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::views::forms::WaiveFineForm;
    use std::cell::Cell;

    fn modal() -> Modal<WaiveFineForm> {
        Modal::with_close_delay(Duration::from_millis(1500))
    }

    fn valid() -> WaiveFineForm {
        WaiveFineForm {
            reason: "Returned damaged by flood".to_string(),
        }
    }

    #[test]
    fn test_closed_modal_rejects_submit() {
        let mut m = modal();
        assert!(!m.is_open());
        assert!(m.begin_submit().is_none());
    }

    #[test]
    fn test_invalid_form_populates_errors() {
        let mut m = modal();
        m.open_default();
        assert!(m.begin_submit().is_none());
        assert!(m.error("reason").is_some());
        assert!(!m.is_loading());

        m.form_mut().unwrap().reason = "Returned damaged".to_string();
        assert!(m.begin_submit().is_some());
        assert!(m.errors().is_empty());
    }

    #[test]
    fn test_double_submit_is_rejected() {
        let mut m = modal();
        m.open(valid());
        assert!(m.begin_submit().is_some());
        assert!(m.is_loading());
        assert!(!m.can_submit());
        assert!(m.begin_submit().is_none());
        assert!(m.form_mut().is_none());
    }

    #[test]
    fn test_failure_keeps_modal_open() {
        let mut m = modal();
        m.open(valid());
        m.begin_submit().unwrap();
        let result: AppResult<()> = Err(AppError::Conflict("Fine already paid".to_string()));
        assert!(m.complete(result, "Fine waived").is_err());

        assert!(m.is_open());
        assert!(!m.is_loading());
        assert_eq!(m.error(FORM_ERROR), Some("Fine already paid"));
        assert_eq!(m.outcome(), Some(&Toast::error("Fine already paid")));
        // Retry is allowed
        assert!(m.can_submit());
    }

    #[tokio::test]
    async fn test_submit_calls_action_once_and_refreshes_parent() {
        let mut m = modal();
        m.open(valid());
        let calls = Cell::new(0);
        let refreshed = Cell::new(false);

        let result = m
            .submit(
                |form| {
                    calls.set(calls.get() + 1);
                    async move { Ok::<_, AppError>(form.reason.len()) }
                },
                "Fine waived",
                |_| refreshed.set(true),
            )
            .await;

        assert_eq!(result.unwrap(), Some(25));
        assert_eq!(calls.get(), 1);
        assert!(refreshed.get());
        assert_eq!(m.outcome(), Some(&Toast::success("Fine waived")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_close_after_success_only() {
        let mut m = modal();
        m.open(valid());
        m.begin_submit().unwrap();
        m.complete(Err::<(), _>(AppError::Internal("boom".into())), "done")
            .unwrap_err();
        m.auto_close().await;
        assert!(m.is_open());

        m.begin_submit().unwrap();
        m.complete(Ok(()), "done").unwrap();
        let started = tokio::time::Instant::now();
        m.auto_close().await;
        assert!(!m.is_open());
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }
}
