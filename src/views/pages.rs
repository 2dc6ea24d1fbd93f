//! List screens: which service call backs each screen, for whom
//!
//! Staff see the whole collection; students only ever see their own rows.

use serde::{de::DeserializeOwned, Serialize};

use super::list_view::ListFilters;
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery},
        envelope::Page,
        enums::{LoanStatus, ReminderStatus, Role},
        loan::{BorrowRecord, LoanQuery, Reservation},
        payment::Fine,
        reminder::{ReminderLog, ReminderLogQuery},
        room::RoomBooking,
        user::User,
    },
    services::Services,
    session::Session,
};

/// Who is looking at a screen
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub user_id: i64,
    pub role: Role,
}

impl Viewer {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn from_session(session: &Session) -> Self {
        Self::new(session.user.id, session.user.role.clone())
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Librarian)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Parse an enum filter value as the backend spells it (`OVERDUE`).
/// Values that only match a catch-all variant are rejected.
fn parse_filter<T: DeserializeOwned + Serialize>(key: &str, value: &str) -> AppResult<T> {
    let normalized = serde_json::Value::String(value.trim().to_ascii_uppercase().replace('-', "_"));
    let unknown = || AppError::Validation(format!("Unknown {} filter: {}", key, value.trim()));
    let parsed: T = serde_json::from_value(normalized.clone()).map_err(|_| unknown())?;
    if serde_json::to_value(&parsed).ok() != Some(normalized) {
        return Err(unknown());
    }
    Ok(parsed)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}

/// Keep rows whose text contains the search term, for endpoints without
/// server-side search
fn search_locally<T>(mut page: Page<T>, filters: &ListFilters, text: impl Fn(&T) -> String) -> Page<T> {
    if let Some(term) = filters.search_text() {
        let term = term.to_lowercase();
        page.items.retain(|item| text(item).to_lowercase().contains(&term));
        page.total_elements = page.items.len() as u64;
    }
    page
}

/// Books: filters `genre`, `available`
pub async fn fetch_books(services: &Services, filters: &ListFilters) -> AppResult<Page<Book>> {
    let genre = filters.filter("genre").map(str::to_string);
    let available_only = filters.filter("available").map(parse_flag).unwrap_or(false);

    if let (Some(text), None, false) = (filters.search_text(), &genre, available_only) {
        return services.books.search(text).await;
    }

    let query = BookQuery {
        search: filters.search_text().map(str::to_string),
        genre,
        available_only,
        page: filters.page,
        size: filters.size,
    };
    services.books.list(&query).await
}

/// Users, admin only: filter `role`
pub async fn fetch_users(services: &Services, viewer: &Viewer, filters: &ListFilters) -> AppResult<Page<User>> {
    if !viewer.is_admin() {
        return Err(AppError::Authorization("Only administrators can list users".to_string()));
    }
    match filters.filter("role") {
        Some(role) => {
            let role: Role = role.parse().map_err(AppError::Validation)?;
            let page = services.users.by_role(&role).await?;
            Ok(search_locally(page, filters, |u| {
                format!("{} {} {}", u.username, u.display_name(), u.email.as_deref().unwrap_or(""))
            }))
        }
        None => {
            services
                .users
                .list(filters.search_text(), filters.page, filters.size)
                .await
        }
    }
}

/// Loans: filter `status` (`overdue` goes to the dedicated endpoint)
pub async fn fetch_loans(
    services: &Services,
    viewer: &Viewer,
    filters: &ListFilters,
) -> AppResult<Page<BorrowRecord>> {
    let status = filters
        .filter("status")
        .map(|s| parse_filter::<LoanStatus>("status", s))
        .transpose()?;

    if !viewer.is_staff() {
        let mut page = services.loans.for_user(viewer.user_id).await?;
        if let Some(status) = status {
            page.items.retain(|loan| loan.status == status);
            page.total_elements = page.items.len() as u64;
        }
        return Ok(search_locally(page, filters, |l| l.book_title.clone().unwrap_or_default()));
    }

    if status == Some(LoanStatus::Overdue) {
        let page = services.loans.overdue().await?;
        return Ok(search_locally(page, filters, |l| {
            format!("{} {}", l.book_title.as_deref().unwrap_or(""), l.username.as_deref().unwrap_or(""))
        }));
    }

    let query = LoanQuery {
        status,
        search: filters.search_text().map(str::to_string),
        page: filters.page,
        size: filters.size,
    };
    services.loans.list(&query).await
}

pub async fn fetch_reservations(
    services: &Services,
    viewer: &Viewer,
    filters: &ListFilters,
) -> AppResult<Page<Reservation>> {
    let page = if viewer.is_staff() {
        services.loans.reservations().await?
    } else {
        services.loans.reservations_for_user(viewer.user_id).await?
    };
    Ok(search_locally(page, filters, |r| r.book_title.clone().unwrap_or_default()))
}

pub async fn fetch_fines(services: &Services, viewer: &Viewer, filters: &ListFilters) -> AppResult<Page<Fine>> {
    let page = if viewer.is_staff() {
        services.payments.fines(filters.page, filters.size).await?
    } else {
        services.payments.fines_for_user(viewer.user_id).await?
    };
    Ok(search_locally(page, filters, |f| f.reason.clone().unwrap_or_default()))
}

/// Reminder logs, admin only: filter `status`
pub async fn fetch_reminder_logs(
    services: &Services,
    viewer: &Viewer,
    filters: &ListFilters,
) -> AppResult<Page<ReminderLog>> {
    if !viewer.is_admin() {
        return Err(AppError::Authorization("Only administrators can view reminder logs".to_string()));
    }
    let query = ReminderLogQuery {
        user_id: None,
        status: filters
            .filter("status")
            .map(|s| parse_filter::<ReminderStatus>("status", s))
            .transpose()?,
        page: filters.page,
        size: filters.size,
    };
    services.reminders.logs(&query).await
}

/// The viewer's own reminders
pub async fn fetch_notifications(
    services: &Services,
    viewer: &Viewer,
    filters: &ListFilters,
) -> AppResult<Page<ReminderLog>> {
    let query = ReminderLogQuery {
        user_id: Some(viewer.user_id),
        status: None,
        page: filters.page,
        size: filters.size,
    };
    let page = services.reminders.logs(&query).await?;
    Ok(search_locally(page, filters, |r| r.message.clone().unwrap_or_default()))
}

pub async fn fetch_room_bookings(
    services: &Services,
    viewer: &Viewer,
    filters: &ListFilters,
) -> AppResult<Page<RoomBooking>> {
    let page = if viewer.is_staff() {
        services.rooms.bookings(filters.page, filters.size).await?
    } else {
        services.rooms.bookings_for_user(viewer.user_id).await?
    };
    Ok(search_locally(page, filters, |b| {
        format!("{} {}", b.room_name.as_deref().unwrap_or(""), b.purpose.as_deref().unwrap_or(""))
    }))
}

/// Settings screen: the signed-in profile and where each service lives
#[derive(Debug, Clone)]
pub struct SettingsView {
    pub profile: User,
    pub endpoints: Vec<(&'static str, String)>,
}

impl SettingsView {
    pub fn new(config: &AppConfig, session: &Session) -> Self {
        let urls = &config.services;
        Self {
            profile: session.user.clone(),
            endpoints: vec![
                ("book", urls.book_url.clone()),
                ("user", urls.user_url.clone()),
                ("borrow", urls.borrow_url.clone()),
                ("payment", urls.payment_url.clone()),
                ("reminder", urls.reminder_url.clone()),
                ("room", urls.room_url.clone()),
            ],
        }
    }
}
