//! Screen state: list views, debounced search, modal forms

pub mod debounce;
pub mod forms;
pub mod list_view;
pub mod modal;
pub mod pages;

pub use debounce::Debouncer;
pub use forms::{FieldErrors, FormModel};
pub use list_view::{FetchTicket, ListFilters, ListView};
pub use modal::{Modal, Toast, ToastKind};
pub use pages::{SettingsView, Viewer};
