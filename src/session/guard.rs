//! Route guard
//!
//! Decides, from the session alone, whether a route renders or where the
//! user is sent instead. Pure: no I/O, no mutation.

use super::routes::{default_route_for, Route};
use super::state::SessionState;
use crate::models::enums::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(Route),
    /// Session still resolving; show a loading indicator
    Pending,
    /// Role outside the known set; show a placeholder instead of redirecting
    UnknownRole(String),
    /// Neither the route nor any fallback is open to this role
    Denied,
}

/// Guard a route against an explicit set of required roles
pub fn guard(route: Route, required_roles: &[Role], session: &SessionState) -> GuardDecision {
    match session {
        SessionState::Loading => GuardDecision::Pending,
        SessionState::Anonymous => {
            if route.is_public() {
                GuardDecision::Render
            } else {
                GuardDecision::Redirect(Route::Login)
            }
        }
        SessionState::MustChangePassword(_) => {
            if route == Route::ChangePassword {
                GuardDecision::Render
            } else {
                GuardDecision::Redirect(Route::ChangePassword)
            }
        }
        SessionState::Active(active) => {
            let role = &active.user.role;
            if let Role::Unknown(raw) = role {
                return GuardDecision::UnknownRole(raw.clone());
            }
            if route.is_public() {
                return GuardDecision::Redirect(default_route_for(role));
            }
            if required_roles.is_empty() || required_roles.contains(role) {
                return GuardDecision::Render;
            }

            let landing = default_route_for(role);
            if landing != route {
                GuardDecision::Redirect(landing)
            } else if route != Route::Dashboard {
                // The caller narrowed the landing route itself
                GuardDecision::Redirect(Route::Dashboard)
            } else {
                GuardDecision::Denied
            }
        }
    }
}

/// Guard a route with its declared role set
pub fn guard_route(route: Route, session: &SessionState) -> GuardDecision {
    guard(route, route.allowed_roles(), session)
}

/// Where "/" sends the user
pub fn landing(session: &SessionState) -> GuardDecision {
    match session {
        SessionState::Loading => GuardDecision::Pending,
        SessionState::Anonymous => GuardDecision::Redirect(Route::Login),
        SessionState::MustChangePassword(_) => GuardDecision::Redirect(Route::ChangePassword),
        SessionState::Active(active) => match &active.user.role {
            Role::Unknown(raw) => GuardDecision::UnknownRole(raw.clone()),
            role => GuardDecision::Redirect(default_route_for(role)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;
    use crate::session::state::Session;
    use pretty_assertions::assert_eq;

    fn user(role: Role, must_change_password: bool) -> User {
        User {
            id: 1,
            username: "someone".to_string(),
            email: None,
            first_name: None,
            last_name: None,
            role,
            active: true,
            must_change_password,
            phone: None,
            student_id: None,
            created_at: None,
        }
    }

    fn active(role: Role) -> SessionState {
        SessionState::authenticated(user(role, false), "t".to_string())
    }

    fn sessions() -> Vec<SessionState> {
        let mut all = vec![SessionState::Loading, SessionState::Anonymous];
        for role in Role::KNOWN {
            all.push(active(role.clone()));
            all.push(SessionState::authenticated(user(role, true), "t".to_string()));
        }
        all.push(active(Role::Unknown("AUDITOR".to_string())));
        all
    }

    #[test]
    fn test_anonymous_never_renders_protected_routes() {
        for route in Route::ALL {
            let decision = guard_route(route, &SessionState::Anonymous);
            if route.is_public() {
                assert_eq!(decision, GuardDecision::Render);
            } else {
                assert_eq!(decision, GuardDecision::Redirect(Route::Login));
            }
        }
    }

    #[test]
    fn test_must_change_password_reaches_only_change_password() {
        for role in Role::KNOWN {
            let session = SessionState::authenticated(user(role, true), "t".to_string());
            assert!(matches!(session, SessionState::MustChangePassword(_)));
            for route in Route::ALL {
                let expected = if route == Route::ChangePassword {
                    GuardDecision::Render
                } else {
                    GuardDecision::Redirect(Route::ChangePassword)
                };
                assert_eq!(guard_route(route, &session), expected, "route {}", route);
            }
        }
    }

    #[test]
    fn test_role_redirect_targets() {
        assert_eq!(
            guard_route(Route::Reminders, &active(Role::Librarian)),
            GuardDecision::Redirect(Route::Books)
        );
        assert_eq!(
            guard_route(Route::Users, &active(Role::Student)),
            GuardDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            guard_route(Route::Login, &active(Role::Admin)),
            GuardDecision::Redirect(Route::Users)
        );
        assert_eq!(guard_route(Route::Reminders, &active(Role::Admin)), GuardDecision::Render);
    }

    #[test]
    fn test_unknown_role_gets_placeholder() {
        let session = active(Role::Unknown("AUDITOR".to_string()));
        for route in Route::ALL {
            assert_eq!(
                guard_route(route, &session),
                GuardDecision::UnknownRole("AUDITOR".to_string())
            );
        }
        assert_eq!(landing(&session), GuardDecision::UnknownRole("AUDITOR".to_string()));
    }

    #[test]
    fn test_guard_converges_within_one_hop() {
        for session in sessions() {
            for route in Route::ALL {
                let first = guard_route(route, &session);
                // Deterministic
                assert_eq!(first, guard_route(route, &session));

                if let GuardDecision::Redirect(target) = first {
                    let second = guard_route(target, &session);
                    assert!(
                        second == GuardDecision::Render || target == Route::Login,
                        "{} -> {} -> {:?} for {}",
                        route,
                        target,
                        second,
                        session.label()
                    );
                }
            }
        }
    }

    #[test]
    fn test_narrowed_landing_route_does_not_loop() {
        let session = active(Role::Librarian);
        assert_eq!(
            guard(Route::Books, &[Role::Admin], &session),
            GuardDecision::Redirect(Route::Dashboard)
        );
        let session = active(Role::Student);
        assert_eq!(guard(Route::Dashboard, &[Role::Admin], &session), GuardDecision::Denied);
    }

    #[test]
    fn test_landing() {
        assert_eq!(landing(&SessionState::Loading), GuardDecision::Pending);
        assert_eq!(landing(&SessionState::Anonymous), GuardDecision::Redirect(Route::Login));
        assert_eq!(landing(&active(Role::Librarian)), GuardDecision::Redirect(Route::Books));
        assert_eq!(guard_route(Route::Books, &SessionState::Loading), GuardDecision::Pending);

        let session = SessionState::MustChangePassword(Session {
            user: user(Role::Student, true),
            token: "t".into(),
        });
        assert_eq!(landing(&session), GuardDecision::Redirect(Route::ChangePassword));
    }
}
