//! Role dashboards and the reports screen
//!
//! Each panel is fetched concurrently and fails on its own: one service being
//! down blanks its panel, not the whole dashboard.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookQuery,
        enums::{BookingStatus, LoanStatus, ReservationStatus, Role},
        loan::{BorrowRecord, LoanQuery, Reservation},
        payment::{Fine, FineSummary},
        reminder::{ReminderHealth, ReminderLog, ReminderLogQuery, ReminderStatistics},
        room::RoomBooking,
    },
    services::Services,
    views::Viewer,
};

/// A panel's content, or the message to show in its place
pub type Panel<T> = Result<T, String>;

fn panel<T>(result: AppResult<T>) -> Panel<T> {
    result.map_err(|e| {
        tracing::warn!(error = %e, "Dashboard panel failed");
        e.user_message()
    })
}

const RECENT: usize = 5;

#[derive(Debug, Clone)]
pub struct AdminDashboard {
    pub total_users: Panel<u64>,
    pub total_books: Panel<u64>,
    pub active_loans: Panel<u64>,
    pub overdue_loans: Panel<u64>,
    pub fines: Panel<FineSummary>,
    pub reminder_health: Panel<ReminderHealth>,
    pub reminder_stats: Panel<ReminderStatistics>,
}

#[derive(Debug, Clone)]
pub struct LibrarianDashboard {
    pub total_books: Panel<u64>,
    pub active_loans: Panel<u64>,
    /// Oldest first, at most a handful
    pub overdue: Panel<Vec<BorrowRecord>>,
    pub open_reservations: Panel<u64>,
    pub fines: Panel<FineSummary>,
}

#[derive(Debug, Clone)]
pub struct StudentDashboard {
    pub loans: Panel<Vec<BorrowRecord>>,
    pub reservations: Panel<Vec<Reservation>>,
    pub fines: Panel<Vec<Fine>>,
    pub bookings: Panel<Vec<RoomBooking>>,
    pub notifications: Panel<Vec<ReminderLog>>,
}

impl StudentDashboard {
    /// Sum of unpaid fines, when the fines panel loaded
    pub fn outstanding_total(&self) -> Option<Decimal> {
        self.fines
            .as_ref()
            .ok()
            .map(|fines| fines.iter().filter(|f| f.is_outstanding()).map(|f| f.amount).sum())
    }

    pub fn overdue_count(&self) -> usize {
        let now = Utc::now();
        self.loans
            .as_ref()
            .map(|loans| loans.iter().filter(|l| l.is_overdue_at(now)).count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub enum Dashboard {
    Admin(AdminDashboard),
    Librarian(LibrarianDashboard),
    Student(StudentDashboard),
    /// Role outside the known set; rendered as a placeholder
    UnknownRole(String),
}

pub async fn load_dashboard(services: &Services, viewer: &Viewer) -> Dashboard {
    tracing::debug!(user_id = viewer.user_id, role = %viewer.role, "Loading dashboard");
    match &viewer.role {
        Role::Admin => Dashboard::Admin(load_admin(services).await),
        Role::Librarian => Dashboard::Librarian(load_librarian(services).await),
        Role::Student => Dashboard::Student(load_student(services, viewer.user_id).await),
        Role::Unknown(raw) => Dashboard::UnknownRole(raw.clone()),
    }
}

async fn count_books(services: &Services) -> AppResult<u64> {
    let query = BookQuery {
        size: 1,
        ..Default::default()
    };
    Ok(services.books.list(&query).await?.total_elements)
}

async fn count_active_loans(services: &Services) -> AppResult<u64> {
    let query = LoanQuery {
        status: Some(LoanStatus::Borrowed),
        size: 1,
        ..Default::default()
    };
    Ok(services.loans.list(&query).await?.total_elements)
}

async fn count_overdue_loans(services: &Services) -> AppResult<u64> {
    Ok(services.loans.overdue().await?.total_elements)
}

async fn load_admin(services: &Services) -> AdminDashboard {
    let (users, books, active, overdue, fines, health, stats) = tokio::join!(
        services.users.list(None, 0, 1),
        count_books(services),
        count_active_loans(services),
        count_overdue_loans(services),
        services.payments.summary(),
        services.reminders.health(),
        services.reminders.statistics(),
    );

    AdminDashboard {
        total_users: panel(users.map(|page| page.total_elements)),
        total_books: panel(books),
        active_loans: panel(active),
        overdue_loans: panel(overdue),
        fines: panel(fines),
        reminder_health: panel(health),
        reminder_stats: panel(stats),
    }
}

async fn load_librarian(services: &Services) -> LibrarianDashboard {
    let (books, active, overdue, reservations, fines) = tokio::join!(
        count_books(services),
        count_active_loans(services),
        services.loans.overdue(),
        services.loans.reservations(),
        services.payments.summary(),
    );

    LibrarianDashboard {
        total_books: panel(books),
        active_loans: panel(active),
        overdue: panel(overdue.map(|page| {
            let mut loans = page.items;
            loans.sort_by_key(|l| l.due_date);
            loans.truncate(RECENT);
            loans
        })),
        open_reservations: panel(reservations.map(|page| {
            page.items
                .iter()
                .filter(|r| matches!(r.status, ReservationStatus::Pending | ReservationStatus::Ready))
                .count() as u64
        })),
        fines: panel(fines),
    }
}

async fn load_student(services: &Services, user_id: i64) -> StudentDashboard {
    let notifications_query = ReminderLogQuery {
        user_id: Some(user_id),
        status: None,
        page: 0,
        size: RECENT as u32,
    };
    let (loans, reservations, fines, bookings, notifications) = tokio::join!(
        services.loans.for_user(user_id),
        services.loans.reservations_for_user(user_id),
        services.payments.fines_for_user(user_id),
        services.rooms.bookings_for_user(user_id),
        services.reminders.logs(&notifications_query),
    );
    let now = Utc::now();

    StudentDashboard {
        loans: panel(loans.map(|page| page.items.into_iter().filter(|l| l.status.is_open()).collect())),
        reservations: panel(reservations.map(|page| {
            page.items
                .into_iter()
                .filter(|r| matches!(r.status, ReservationStatus::Pending | ReservationStatus::Ready))
                .collect()
        })),
        fines: panel(fines.map(|page| page.items)),
        bookings: panel(bookings.map(|page| {
            let mut upcoming: Vec<RoomBooking> = page
                .items
                .into_iter()
                .filter(|b| b.end_time > now && b.status != BookingStatus::Cancelled)
                .collect();
            upcoming.sort_by_key(|b| b.start_time);
            upcoming
        })),
        notifications: panel(notifications.map(|page| page.items)),
    }
}

/// Reports screen for staff
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub fines: Panel<FineSummary>,
    pub active_loans: Panel<u64>,
    pub overdue_loans: Panel<u64>,
    pub reminders: Panel<ReminderStatistics>,
}

pub async fn load_reports(services: &Services, viewer: &Viewer) -> AppResult<ReportSummary> {
    if !viewer.is_staff() {
        return Err(AppError::Authorization("Reports are available to staff only".to_string()));
    }
    let (fines, active, overdue, reminders) = tokio::join!(
        services.payments.summary(),
        count_active_loans(services),
        count_overdue_loans(services),
        services.reminders.statistics(),
    );
    Ok(ReportSummary {
        fines: panel(fines),
        active_loans: panel(active),
        overdue_loans: panel(overdue),
        reminders: panel(reminders),
    })
}
