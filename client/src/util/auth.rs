//! Route guards shared by every front end.
//!
//! SYSTEM CONTEXT
//! ==============
//! Provider pages need a session; login and register make no sense with one.
//! Front ends ask [`guard`] before rendering and follow the decision.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::state::auth::AuthState;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/profile";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Only for visitors without a session.
    GuestOnly,
    Protected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Auth check still running; show a spinner.
    Wait,
    Redirect(String),
}

/// Classify a route path. Unknown paths are public.
#[must_use]
pub fn route_access(path: &str) -> RouteAccess {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let first = path.trim_matches('/').split('/').next().unwrap_or_default();
    match first {
        "login" | "register" => RouteAccess::GuestOnly,
        "profile" | "services" | "slots" | "bookings" => RouteAccess::Protected,
        _ => RouteAccess::Public,
    }
}

/// Redirect to `/login` whenever auth has loaded and no session is present.
#[must_use]
pub fn should_redirect_unauth(state: &AuthState) -> bool {
    !state.loading && !state.is_authenticated
}

#[must_use]
pub fn guard(access: RouteAccess, state: &AuthState) -> GuardDecision {
    match access {
        RouteAccess::Public => GuardDecision::Render,
        RouteAccess::Protected if state.loading => GuardDecision::Wait,
        RouteAccess::Protected if should_redirect_unauth(state) => GuardDecision::Redirect(LOGIN_ROUTE.to_owned()),
        RouteAccess::GuestOnly if state.is_authenticated => GuardDecision::Redirect(HOME_ROUTE.to_owned()),
        RouteAccess::Protected | RouteAccess::GuestOnly => GuardDecision::Render,
    }
}

/// [`guard`] for a concrete path.
#[must_use]
pub fn guard_path(path: &str, state: &AuthState) -> GuardDecision {
    guard(route_access(path), state)
}
