//! Screens of the portal and who may open them

use crate::models::enums::Role;

const EVERYONE: &[Role] = &[Role::Admin, Role::Librarian, Role::Student];
const STAFF: &[Role] = &[Role::Admin, Role::Librarian];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    ChangePassword,
    Dashboard,
    Books,
    Users,
    Loans,
    Payments,
    Reminders,
    RoomBookings,
    Notifications,
    Reports,
    Settings,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::Login,
        Route::ChangePassword,
        Route::Dashboard,
        Route::Books,
        Route::Users,
        Route::Loans,
        Route::Payments,
        Route::Reminders,
        Route::RoomBookings,
        Route::Notifications,
        Route::Reports,
        Route::Settings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::ChangePassword => "/change-password",
            Route::Dashboard => "/dashboard",
            Route::Books => "/books",
            Route::Users => "/users",
            Route::Loans => "/loans",
            Route::Payments => "/payments",
            Route::Reminders => "/reminders",
            Route::RoomBookings => "/room-bookings",
            Route::Notifications => "/notifications",
            Route::Reports => "/reports",
            Route::Settings => "/settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::ChangePassword => "Change password",
            Route::Dashboard => "Dashboard",
            Route::Books => "Books",
            Route::Users => "Users",
            Route::Loans => "Loans",
            Route::Payments => "Payments",
            Route::Reminders => "Reminders",
            Route::RoomBookings => "Room bookings",
            Route::Notifications => "Notifications",
            Route::Reports => "Reports",
            Route::Settings => "Settings",
        }
    }

    /// Accepts "/books", "books" and "/books/"
    pub fn from_path(path: &str) -> Option<Route> {
        let normalized = format!("/{}", path.trim().trim_matches('/'));
        Route::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }

    /// Roles allowed to render the route once the session is active
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Route::Login => &[],
            Route::ChangePassword
            | Route::Dashboard
            | Route::Books
            | Route::Loans
            | Route::Payments
            | Route::RoomBookings
            | Route::Notifications
            | Route::Settings => EVERYONE,
            Route::Reports => STAFF,
            Route::Users | Route::Reminders => ADMIN_ONLY,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl std::str::FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::from_path(s).ok_or_else(|| format!("Unknown route: {}", s))
    }
}

/// Landing route per role. Unknown roles fall back to the dashboard.
pub fn default_route_for(role: &Role) -> Route {
    match role {
        Role::Admin => Route::Users,
        Role::Librarian => Route::Books,
        Role::Student | Role::Unknown(_) => Route::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("room-bookings/"), Some(Route::RoomBookings));
        assert_eq!(Route::from_path("/nowhere"), None);
    }

    #[test]
    fn test_default_routes() {
        assert_eq!(default_route_for(&Role::Admin).path(), "/users");
        assert_eq!(default_route_for(&Role::Librarian).path(), "/books");
        assert_eq!(default_route_for(&Role::Student).path(), "/dashboard");
    }

    #[test]
    fn test_default_route_is_allowed_for_its_role() {
        for role in Role::KNOWN {
            let landing = default_route_for(&role);
            assert!(
                landing.allowed_roles().contains(&role),
                "{} cannot open its own landing route {}",
                role,
                landing
            );
        }
    }
}
