//! Session, routes and the route guard

pub mod guard;
pub mod routes;
pub mod state;
pub mod store;
pub mod token_store;

pub use guard::{guard, guard_route, landing, GuardDecision};
pub use routes::{default_route_for, Route};
pub use state::{Session, SessionState};
pub use store::SessionStore;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
