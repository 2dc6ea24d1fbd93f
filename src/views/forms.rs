//! Modal form models and their client-side validation
//!
//! Validation here only spares the user a round trip. The services repeat
//! every rule and their answer wins.

use std::borrow::Cow;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{
    book::{Book, BookPayload},
    enums::{PaymentMethod, Role},
    loan::CheckoutRequest,
    payment::{PayFineRequest, WaiveFineRequest},
    reminder::ReminderConfig,
    room::{CreateRoomBooking, Room},
    user::{CreateUser, UpdateUser, User},
};

/// Field name → first error message, in display order
pub type FieldErrors = IndexMap<String, String>;

/// Key for errors that belong to no single field
pub const FORM_ERROR: &str = "form";

pub const MAX_CHECKOUT_BOOKS: usize = 5;
pub const MAX_BOOKING_HOURS: i64 = 4;

static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").unwrap());

/// Flatten validator output into one message per field, sorted by field
pub fn flatten_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let field = field.to_string();
            errs.first().map(|err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field.replace('_', " ")));
                (field, message)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.into_iter().collect()
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// At least 8 characters with upper case, lower case, a digit and a symbol
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let upper = password.chars().any(|c| c.is_uppercase());
    let lower = password.chars().any(|c| c.is_lowercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let symbol = password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if long_enough && upper && lower && digit && symbol {
        Ok(())
    } else {
        Err(error(
            "password_strength",
            "Password must be at least 8 characters and include upper and lower case letters, a digit and a symbol",
        ))
    }
}

/// ISBN-10 or ISBN-13, hyphens and spaces ignored; blank is accepted
pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let normalized: String = isbn
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_uppercase();
    if normalized.is_empty() || ISBN_RE.is_match(&normalized) {
        Ok(())
    } else {
        Err(error("isbn", "ISBN must have 10 or 13 digits"))
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Anything a modal can hold
pub trait FormModel: Clone + Send {
    /// Every client-side rule; an empty map means the form may be sent
    fn check(&self) -> Result<(), FieldErrors>;
}

fn finish(result: Result<(), ValidationErrors>, mut extra: FieldErrors) -> Result<(), FieldErrors> {
    let mut errors = match result {
        Ok(()) => FieldErrors::new(),
        Err(e) => flatten_errors(&e),
    };
    for (field, message) in extra.drain(..) {
        errors.entry(field).or_insert(message);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

/// Create and edit book form
#[derive(Debug, Clone, Default, Validate)]
pub struct BookForm {
    #[validate(custom(function = "not_blank", message = "Title is required"))]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "Author is required"))]
    pub author: String,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    pub genre: String,
    pub publisher: String,
    #[validate(range(min = 1000, max = 2100, message = "Publication year must be between 1000 and 2100"))]
    pub publication_year: Option<i32>,
    pub description: String,
    pub location: String,
    #[validate(range(min = 1, max = 1000, message = "Total copies must be between 1 and 1000"))]
    pub total_copies: u32,
    /// Copies currently out when editing; total may not drop below it
    pub borrowed_copies: u32,
}

impl BookForm {
    pub fn new() -> Self {
        Self {
            total_copies: 1,
            ..Default::default()
        }
    }

    /// Seed from an existing book for editing
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone().unwrap_or_default(),
            genre: book.genre.clone().unwrap_or_default(),
            publisher: book.publisher.clone().unwrap_or_default(),
            publication_year: book.publication_year,
            description: book.description.clone().unwrap_or_default(),
            location: book.location.clone().unwrap_or_default(),
            total_copies: book.total_copies,
            borrowed_copies: book.borrowed_copies(),
        }
    }

    pub fn to_payload(&self) -> BookPayload {
        BookPayload {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: optional(&self.isbn),
            genre: optional(&self.genre),
            publisher: optional(&self.publisher),
            publication_year: self.publication_year,
            description: optional(&self.description),
            location: optional(&self.location),
            total_copies: self.total_copies,
        }
    }
}

impl FormModel for BookForm {
    fn check(&self) -> Result<(), FieldErrors> {
        let mut extra = FieldErrors::new();
        if self.total_copies < self.borrowed_copies {
            extra.insert(
                "total_copies".to_string(),
                format!(
                    "Total copies cannot be less than the {} copies currently borrowed",
                    self.borrowed_copies
                ),
            );
        }
        finish(self.validate(), extra)
    }
}

/// Typed-title gate in front of a book deletion
#[derive(Debug, Clone)]
pub struct DeleteBookConfirmation {
    book: Book,
    typed_title: String,
}

impl DeleteBookConfirmation {
    pub fn new(book: Book) -> Self {
        Self {
            book,
            typed_title: String::new(),
        }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn type_title(&mut self, typed: &str) {
        self.typed_title = typed.to_string();
    }

    /// Exact, case-sensitive match
    pub fn title_matches(&self) -> bool {
        self.typed_title == self.book.title
    }

    pub fn has_outstanding_copies(&self) -> bool {
        self.book.available_copies != self.book.total_copies
    }

    pub fn can_delete(&self) -> bool {
        self.title_matches() && !self.has_outstanding_copies()
    }

    pub fn blocked_reason(&self) -> Option<String> {
        if self.has_outstanding_copies() {
            Some(format!(
                "Cannot delete \"{}\": {} of {} copies are still borrowed",
                self.book.title,
                self.book.borrowed_copies(),
                self.book.total_copies
            ))
        } else if !self.title_matches() {
            Some("Type the exact book title to confirm".to_string())
        } else {
            None
        }
    }
}

impl FormModel for DeleteBookConfirmation {
    fn check(&self) -> Result<(), FieldErrors> {
        match self.blocked_reason() {
            None => Ok(()),
            Some(reason) => Err(FieldErrors::from([(FORM_ERROR.to_string(), reason)])),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Validate)]
pub struct UserForm {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[validate(custom(function = "not_blank", message = "First name is required"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name is required"))]
    pub last_name: String,
    pub role: Role,
    pub phone: String,
    pub student_id: String,
}

impl UserForm {
    pub fn new(role: Role) -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            phone: String::new(),
            student_id: String::new(),
        }
    }

    pub fn to_create(&self) -> CreateUser {
        CreateUser {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role: self.role.clone(),
            phone: optional(&self.phone),
            student_id: optional(&self.student_id),
        }
    }
}

impl FormModel for UserForm {
    fn check(&self) -> Result<(), FieldErrors> {
        let mut extra = FieldErrors::new();
        if !self.role.is_known() {
            extra.insert("role".to_string(), "Choose a valid role".to_string());
        }
        finish(self.validate(), extra)
    }
}

/// Profile edit; password is changed elsewhere
#[derive(Debug, Clone, Validate)]
pub struct EditUserForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "First name is required"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name is required"))]
    pub last_name: String,
    pub phone: String,
    pub role: Role,
}

impl EditUserForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone().unwrap_or_default(),
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone().unwrap_or_default(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.clone(),
        }
    }

    pub fn to_update(&self) -> UpdateUser {
        UpdateUser {
            email: optional(&self.email),
            first_name: optional(&self.first_name),
            last_name: optional(&self.last_name),
            role: Some(self.role.clone()),
            phone: optional(&self.phone),
        }
    }
}

impl FormModel for EditUserForm {
    fn check(&self) -> Result<(), FieldErrors> {
        finish(self.validate(), FieldErrors::new())
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct ChangePasswordForm {
    #[validate(custom(function = "not_blank", message = "Current password is required"))]
    pub current_password: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
    pub confirm_password: String,
}

impl FormModel for ChangePasswordForm {
    fn check(&self) -> Result<(), FieldErrors> {
        let mut extra = FieldErrors::new();
        if !self.current_password.is_empty() && self.new_password == self.current_password {
            extra.insert(
                "new_password".to_string(),
                "New password must be different from the current password".to_string(),
            );
        }
        if self.confirm_password != self.new_password {
            extra.insert("confirm_password".to_string(), "Passwords do not match".to_string());
        }
        // The "must be different" message takes precedence over strength
        let mut errors = match finish(self.validate(), FieldErrors::new()) {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors,
        };
        for (field, message) in extra {
            errors.insert(field, message);
        }
        errors.sort_by(|a, _, b, _| field_rank(a).cmp(&field_rank(b)));
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn field_rank(field: &str) -> u8 {
    match field {
        "current_password" => 0,
        "new_password" => 1,
        _ => 2,
    }
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Librarian checkout: one patron, a handful of books
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub user_id: Option<i64>,
    pub book_ids: Vec<i64>,
    pub due_date: Option<NaiveDate>,
}

impl CheckoutForm {
    pub fn add_book(&mut self, book_id: i64) {
        if !self.book_ids.contains(&book_id) {
            self.book_ids.push(book_id);
        }
    }

    pub fn remove_book(&mut self, book_id: i64) {
        self.book_ids.retain(|id| *id != book_id);
    }

    pub fn to_request(&self) -> Option<CheckoutRequest> {
        self.user_id.map(|user_id| CheckoutRequest {
            user_id,
            book_ids: self.book_ids.clone(),
            due_date: self.due_date,
        })
    }

    fn check_on(&self, today: NaiveDate) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.user_id.is_none() {
            errors.insert("user_id".to_string(), "Select a patron".to_string());
        }
        if self.book_ids.is_empty() {
            errors.insert("book_ids".to_string(), "Select at least one book".to_string());
        } else if self.book_ids.len() > MAX_CHECKOUT_BOOKS {
            errors.insert(
                "book_ids".to_string(),
                format!("At most {} books per checkout", MAX_CHECKOUT_BOOKS),
            );
        }
        if let Some(due) = self.due_date {
            if due <= today {
                errors.insert("due_date".to_string(), "Due date must be in the future".to_string());
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl FormModel for CheckoutForm {
    fn check(&self) -> Result<(), FieldErrors> {
        self.check_on(Utc::now().date_naive())
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PayFineForm {
    pub outstanding: Decimal,
    pub amount: Decimal,
    pub method: PaymentMethod,
}

impl PayFineForm {
    /// Defaults to paying the whole amount in cash
    pub fn for_amount(outstanding: Decimal) -> Self {
        Self {
            outstanding,
            amount: outstanding,
            method: PaymentMethod::Cash,
        }
    }

    pub fn to_request(&self) -> PayFineRequest {
        PayFineRequest {
            amount: self.amount,
            payment_method: self.method,
        }
    }
}

impl FormModel for PayFineForm {
    fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.amount <= Decimal::ZERO {
            errors.insert("amount".to_string(), "Amount must be greater than zero".to_string());
        } else if self.amount > self.outstanding {
            errors.insert(
                "amount".to_string(),
                format!("Amount cannot exceed the outstanding {}", self.outstanding),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct WaiveFineForm {
    #[validate(length(min = 5, max = 500, message = "Give a reason of at least 5 characters"))]
    pub reason: String,
}

impl WaiveFineForm {
    pub fn to_request(&self) -> WaiveFineRequest {
        WaiveFineRequest {
            reason: self.reason.trim().to_string(),
        }
    }
}

impl FormModel for WaiveFineForm {
    fn check(&self) -> Result<(), FieldErrors> {
        let trimmed = WaiveFineForm {
            reason: self.reason.trim().to_string(),
        };
        finish(trimmed.validate(), FieldErrors::new())
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RoomBookingForm {
    pub room: Room,
    pub user_id: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub attendees: u32,
    pub purpose: String,
}

impl RoomBookingForm {
    pub fn new(room: Room, user_id: i64) -> Self {
        Self {
            room,
            user_id,
            start_time: None,
            end_time: None,
            attendees: 1,
            purpose: String::new(),
        }
    }

    pub fn to_request(&self) -> Option<CreateRoomBooking> {
        Some(CreateRoomBooking {
            room_id: self.room.id,
            user_id: self.user_id,
            start_time: self.start_time?,
            end_time: self.end_time?,
            purpose: optional(&self.purpose),
            attendees: self.attendees,
        })
    }

    fn check_at(&self, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        match (self.start_time, self.end_time) {
            (None, _) => {
                errors.insert("start_time".to_string(), "Start time is required".to_string());
            }
            (_, None) => {
                errors.insert("end_time".to_string(), "End time is required".to_string());
            }
            (Some(start), Some(end)) => {
                if start <= now {
                    errors.insert("start_time".to_string(), "Start time must be in the future".to_string());
                }
                if end <= start {
                    errors.insert("end_time".to_string(), "End time must be after the start time".to_string());
                } else if end - start > Duration::hours(MAX_BOOKING_HOURS) {
                    errors.insert(
                        "end_time".to_string(),
                        format!("Bookings are limited to {} hours", MAX_BOOKING_HOURS),
                    );
                }
            }
        }
        if self.attendees == 0 || self.attendees > self.room.capacity {
            errors.insert(
                "attendees".to_string(),
                format!("Attendees must be between 1 and {}", self.room.capacity),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl FormModel for RoomBookingForm {
    fn check(&self) -> Result<(), FieldErrors> {
        self.check_at(Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Validate)]
pub struct ReminderConfigForm {
    pub enabled: bool,
    #[validate(range(min = 1, max = 30, message = "Days before due must be between 1 and 30"))]
    pub days_before_due: u32,
    #[validate(range(min = 1, max = 30, message = "Overdue interval must be between 1 and 30 days"))]
    pub overdue_interval_days: u32,
    #[validate(range(min = 1, max = 10, message = "Between 1 and 10 overdue reminders"))]
    pub max_overdue_reminders: u32,
    pub send_time: Option<String>,
}

impl ReminderConfigForm {
    pub fn from_config(config: &ReminderConfig) -> Self {
        Self {
            enabled: config.enabled,
            days_before_due: config.days_before_due,
            overdue_interval_days: config.overdue_interval_days,
            max_overdue_reminders: config.max_overdue_reminders,
            send_time: config.send_time.clone(),
        }
    }

    pub fn to_config(&self) -> ReminderConfig {
        ReminderConfig {
            enabled: self.enabled,
            days_before_due: self.days_before_due,
            overdue_interval_days: self.overdue_interval_days,
            max_overdue_reminders: self.max_overdue_reminders,
            send_time: self.send_time.clone(),
        }
    }
}

impl FormModel for ReminderConfigForm {
    fn check(&self) -> Result<(), FieldErrors> {
        finish(self.validate(), FieldErrors::new())
    }
}
