//! Terminal rendering of screens

use std::fmt::Display;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::{
    dashboard::{Dashboard, Panel, ReportSummary},
    models::{
        book::Book,
        loan::{BorrowRecord, Reservation},
        payment::{Fine, FineSummary},
        reminder::{ReminderConfig, ReminderHealth, ReminderLog, ReminderRunResult, ReminderStatistics},
        room::{Room, RoomBooking},
        user::User,
    },
    views::{FieldErrors, ListView, SettingsView, Toast, ToastKind},
};

const DATE: &str = "%Y-%m-%d";
const DATE_TIME: &str = "%Y-%m-%d %H:%M";

/// A model shown as one table row
pub trait Row {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn opt<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    table
}

fn key_values(rows: Vec<(&str, String)>) -> String {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    for (key, value) in rows {
        t.add_row(vec![key.to_string(), value]);
    }
    t.to_string()
}

impl Row for Book {
    const HEADERS: &'static [&'static str] = &["ID", "Title", "Author", "ISBN", "Genre", "Available"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.author.clone(),
            opt(&self.isbn),
            opt(&self.genre),
            if self.is_available() {
                format!("{}/{}", self.available_copies, self.total_copies)
            } else {
                format!("none of {}", self.total_copies)
            },
        ]
    }
}

impl Row for User {
    const HEADERS: &'static [&'static str] = &["ID", "Username", "Name", "Email", "Role", "Active"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.display_name(),
            opt(&self.email),
            self.role.to_string(),
            if self.active { "yes" } else { "no" }.to_string(),
        ]
    }
}

impl Row for BorrowRecord {
    const HEADERS: &'static [&'static str] = &["ID", "Book", "User", "Borrowed", "Due", "Status", "Renewals"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.book_title.clone().unwrap_or_else(|| format!("#{}", self.book_id)),
            self.username.clone().unwrap_or_else(|| format!("#{}", self.user_id)),
            self.borrow_date.format(DATE).to_string(),
            self.due_date.format(DATE).to_string(),
            self.status.to_string(),
            self.renew_count.to_string(),
        ]
    }
}

impl Row for Reservation {
    const HEADERS: &'static [&'static str] = &["ID", "Book", "User", "Reserved", "Status"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.book_title.clone().unwrap_or_else(|| format!("#{}", self.book_id)),
            format!("#{}", self.user_id),
            self.reserved_at.format(DATE).to_string(),
            format!("{:?}", self.status),
        ]
    }
}

impl Row for Fine {
    const HEADERS: &'static [&'static str] = &["ID", "User", "Amount", "Reason", "Status", "Issued"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            format!("#{}", self.user_id),
            self.amount.to_string(),
            opt(&self.reason),
            self.status.to_string(),
            self.issued_at.format(DATE).to_string(),
        ]
    }
}

impl Row for ReminderLog {
    const HEADERS: &'static [&'static str] = &["ID", "User", "Type", "Status", "Sent", "Message"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            format!("#{}", self.user_id),
            format!("{:?}", self.reminder_type),
            format!("{:?}", self.status),
            self.sent_at.format(DATE_TIME).to_string(),
            self.error_message
                .clone()
                .or_else(|| self.message.clone())
                .unwrap_or_default(),
        ]
    }
}

impl Row for RoomBooking {
    const HEADERS: &'static [&'static str] = &["ID", "Room", "User", "Start", "End", "Status"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.room_name.clone().unwrap_or_else(|| format!("#{}", self.room_id)),
            format!("#{}", self.user_id),
            self.start_time.format(DATE_TIME).to_string(),
            self.end_time.format(DATE_TIME).to_string(),
            self.status.to_string(),
        ]
    }
}

impl Row for Room {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Capacity", "Location", "Available"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.capacity.to_string(),
            opt(&self.location),
            if self.available { "yes" } else { "no" }.to_string(),
        ]
    }
}

pub fn rows<T: Row>(items: &[T]) -> String {
    let mut t = table(T::HEADERS);
    for item in items {
        t.add_row(item.cells());
    }
    t.to_string()
}

/// A list screen: the rows, or the error / empty state, then the pager
pub fn list<T: Row>(title: &str, view: &ListView<T>) -> String {
    let mut out = format!("{}\n", title);
    if let Some(error) = view.error() {
        out.push_str(&format!("Error: {}\n", error));
        return out;
    }
    if view.is_empty_state() {
        out.push_str("No results.\n");
        return out;
    }
    out.push_str(&rows(view.items()));
    out.push('\n');
    if view.total_pages() > 1 {
        out.push_str(&format!(
            "Page {} of {} ({} total)\n",
            view.page() + 1,
            view.total_pages(),
            view.total_elements()
        ));
    }
    out
}

fn panel<T>(value: &Panel<T>, show: impl Fn(&T) -> String) -> String {
    match value {
        Ok(v) => show(v),
        Err(message) => format!("unavailable ({})", message),
    }
}

fn fines_line(summary: &FineSummary) -> String {
    format!(
        "{} outstanding ({} fines), {} paid, {} waived",
        summary.total_outstanding, summary.outstanding_count, summary.total_paid, summary.total_waived
    )
}

fn reminder_stats_line(stats: &ReminderStatistics) -> String {
    format!(
        "{} sent ({} today), {} failed, {} pending",
        stats.total_sent, stats.sent_today, stats.total_failed, stats.total_pending
    )
}

pub fn reminder_health(health: &ReminderHealth) -> String {
    let mut line = if health.is_up() {
        health.status.clone()
    } else {
        format!("{} (needs attention)", health.status)
    };
    if let Some(running) = health.scheduler_running {
        line.push_str(if running { ", scheduler running" } else { ", scheduler stopped" });
    }
    if let Some(last_run) = health.last_run {
        line.push_str(&format!(", last run {}", last_run.format(DATE_TIME)));
    }
    line
}

pub fn dashboard(dashboard: &Dashboard) -> String {
    match dashboard {
        Dashboard::Admin(d) => key_values(vec![
            ("Users", panel(&d.total_users, u64::to_string)),
            ("Books", panel(&d.total_books, u64::to_string)),
            ("Active loans", panel(&d.active_loans, u64::to_string)),
            ("Overdue loans", panel(&d.overdue_loans, u64::to_string)),
            ("Fines", panel(&d.fines, fines_line)),
            ("Reminder service", panel(&d.reminder_health, reminder_health)),
            ("Reminders", panel(&d.reminder_stats, reminder_stats_line)),
        ]),
        Dashboard::Librarian(d) => {
            let mut out = key_values(vec![
                ("Books", panel(&d.total_books, u64::to_string)),
                ("Active loans", panel(&d.active_loans, u64::to_string)),
                ("Open reservations", panel(&d.open_reservations, u64::to_string)),
                ("Fines", panel(&d.fines, fines_line)),
            ]);
            out.push_str("\nOverdue\n");
            out.push_str(&panel(&d.overdue, |loans| {
                if loans.is_empty() {
                    "Nothing overdue.".to_string()
                } else {
                    rows(loans)
                }
            }));
            out
        }
        Dashboard::Student(d) => {
            let mut out = key_values(vec![
                ("Open loans", panel(&d.loans, |l| l.len().to_string())),
                ("Overdue", d.overdue_count().to_string()),
                ("Reservations", panel(&d.reservations, |r| r.len().to_string())),
                (
                    "Outstanding fines",
                    d.outstanding_total()
                        .map(|total| total.to_string())
                        .unwrap_or_else(|| panel(&d.fines, |_| String::new())),
                ),
                ("Upcoming room bookings", panel(&d.bookings, |b| b.len().to_string())),
            ]);
            if let Ok(loans) = &d.loans {
                if !loans.is_empty() {
                    out.push_str("\nMy loans\n");
                    out.push_str(&rows(loans));
                }
            }
            if let Ok(notes) = &d.notifications {
                if !notes.is_empty() {
                    out.push_str("\nRecent notifications\n");
                    out.push_str(&rows(notes));
                }
            }
            out
        }
        Dashboard::UnknownRole(role) => unknown_role(role),
    }
}

pub fn unknown_role(role: &str) -> String {
    format!(
        "Your account has the role \"{}\", which this portal does not recognise.\nAsk an administrator to assign ADMIN, LIBRARIAN or STUDENT.",
        role
    )
}

pub fn reports(report: &ReportSummary) -> String {
    key_values(vec![
        ("Fines", panel(&report.fines, fines_line)),
        ("Active loans", panel(&report.active_loans, u64::to_string)),
        ("Overdue loans", panel(&report.overdue_loans, u64::to_string)),
        ("Reminders", panel(&report.reminders, reminder_stats_line)),
    ])
}

pub fn profile(user: &User) -> String {
    key_values(vec![
        ("ID", user.id.to_string()),
        ("Username", user.username.clone()),
        ("Name", user.display_name()),
        ("Email", opt(&user.email)),
        ("Role", user.role.to_string()),
        ("Student ID", opt(&user.student_id)),
        ("Must change password", user.must_change_password.to_string()),
    ])
}

pub fn settings(view: &SettingsView) -> String {
    let mut out = profile(&view.profile);
    out.push_str("\nService endpoints\n");
    let mut t = table(&["Service", "URL"]);
    for (service, url) in &view.endpoints {
        t.add_row(vec![service.to_string(), url.clone()]);
    }
    out.push_str(&t.to_string());
    out
}

pub fn reminder_config(config: &ReminderConfig) -> String {
    key_values(vec![
        ("Enabled", config.enabled.to_string()),
        ("Days before due", config.days_before_due.to_string()),
        ("Overdue interval (days)", config.overdue_interval_days.to_string()),
        ("Max overdue reminders", config.max_overdue_reminders.to_string()),
        ("Send time", opt(&config.send_time)),
    ])
}

pub fn reminder_run(result: &ReminderRunResult) -> String {
    format!("{} processed, {} sent, {} failed", result.processed, result.sent, result.failed)
}

pub fn toast(toast: &Toast) -> String {
    match toast.kind {
        ToastKind::Success => format!("✓ {}", toast.message),
        ToastKind::Error => format!("✗ {}", toast.message),
    }
}

pub fn field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {}: {}", field.replace('_', " "), message))
        .collect::<Vec<_>>()
        .join("\n")
}
