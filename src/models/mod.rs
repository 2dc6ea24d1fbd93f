//! Data models for Library Portal

pub mod book;
pub mod enums;
pub mod envelope;
pub mod loan;
pub mod payment;
pub mod reminder;
pub mod room;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use enums::{BookingStatus, FineStatus, LoanStatus, Role};
pub use envelope::{Envelope, Page, PagedResult};
pub use loan::{BorrowRecord, Reservation};
pub use payment::{Fine, FineSummary};
pub use reminder::{ReminderConfig, ReminderLog};
pub use room::{Room, RoomBooking};
pub use user::User;
