//! Service modules, one function per backend endpoint

pub mod auth;
pub mod books;
pub mod loans;
pub mod payments;
pub mod reminders;
pub mod rooms;
pub mod users;

use crate::{
    api::{ApiClient, Credentials},
    config::AppConfig,
    error::AppResult,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub payments: payments::PaymentsService,
    pub reminders: reminders::RemindersService,
    pub rooms: rooms::RoomsService,
}

impl Services {
    /// Create all services; they share one connection pool and one token slot
    pub fn new(config: &AppConfig, credentials: Credentials) -> AppResult<Self> {
        let http = ApiClient::build_http(&config.http)?;
        let urls = &config.services;
        let client = |service: &'static str, url: &str| {
            ApiClient::new(service, url, http.clone(), credentials.clone())
        };

        Ok(Self {
            auth: auth::AuthService::new(client("user", &urls.user_url)),
            books: books::BooksService::new(client("book", &urls.book_url)),
            loans: loans::LoansService::new(client("borrow", &urls.borrow_url)),
            users: users::UsersService::new(client("user", &urls.user_url)),
            payments: payments::PaymentsService::new(client("payment", &urls.payment_url)),
            reminders: reminders::RemindersService::new(client("reminder", &urls.reminder_url)),
            rooms: rooms::RoomsService::new(client("room", &urls.room_url)),
        })
    }
}
