//! Routes, the route guard, and the shared `Navigator`.
//!
//! The navigator is the one place the current route lives. The API client
//! holds a clone so that a 401 from any endpoint can send the user back to
//! the login route; the shell subscribes to it and renders whatever it says.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::auth::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Transactions,
    Categories,
    Accounts,
    Budgets,
}

impl Route {
    /// Routes shown in the navigation chrome, in order.
    pub const PAGES: [Route; 5] = [
        Route::Dashboard,
        Route::Transactions,
        Route::Categories,
        Route::Accounts,
        Route::Budgets,
    ];

    /// Resolve a path. Anything unknown falls through to the dashboard.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = trimmed.trim_end_matches('/');
        match trimmed {
            "/login" => Route::Login,
            "/transactions" => Route::Transactions,
            "/categories" => Route::Categories,
            "/accounts" => Route::Accounts,
            "/budgets" => Route::Budgets,
            _ => Route::Dashboard,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::Transactions => "/transactions",
            Route::Categories => "/categories",
            Route::Accounts => "/accounts",
            Route::Budgets => "/budgets",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::Transactions => "Transactions",
            Route::Categories => "Categories",
            Route::Accounts => "Accounts",
            Route::Budgets => "Budgets",
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Next page in the navigation chrome (wrapping around).
    pub fn next(&self) -> Self {
        match self {
            Route::Login => Route::Login,
            Route::Dashboard => Route::Transactions,
            Route::Transactions => Route::Categories,
            Route::Categories => Route::Accounts,
            Route::Accounts => Route::Budgets,
            Route::Budgets => Route::Dashboard,
        }
    }

    /// Previous page in the navigation chrome (wrapping around).
    pub fn prev(&self) -> Self {
        match self {
            Route::Login => Route::Login,
            Route::Dashboard => Route::Budgets,
            Route::Transactions => Route::Dashboard,
            Route::Categories => Route::Transactions,
            Route::Accounts => Route::Categories,
            Route::Budgets => Route::Accounts,
        }
    }
}

/// What the shell should do with a requested route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    /// Session hint not yet confirmed by the server.
    Loading,
    Redirect(Route),
}

/// Decide whether `route` may be rendered in the given auth state.
pub fn guard(route: Route, auth: &AuthState) -> GuardDecision {
    if !route.is_protected() {
        return match auth {
            // Already signed in: the login page sends you home.
            AuthState::Authenticated => GuardDecision::Redirect(Route::Dashboard),
            _ => GuardDecision::Render(Route::Login),
        };
    }
    match auth {
        AuthState::Authenticated => GuardDecision::Render(route),
        AuthState::Restored => GuardDecision::Loading,
        AuthState::Unauthenticated => GuardDecision::Redirect(Route::Login),
    }
}

/// Shared handle on the current route.
/// Clone is cheap - all clones observe the same route.
#[derive(Clone, Debug)]
pub struct Navigator {
    tx: watch::Sender<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Route {
        *self.tx.borrow()
    }

    pub fn navigate(&self, route: Route) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == route {
                false
            } else {
                *current = route;
                true
            }
        });
        if changed {
            debug!(path = route.path(), "Navigated");
        }
    }

    /// Global reaction to an authentication failure.
    pub fn redirect_to_login(&self) {
        if self.current() != Route::Login {
            info!(from = self.current().path(), "Authentication required, redirecting to login");
        }
        self.navigate(Route::Login);
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/"), Route::Dashboard);
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/transactions/"), Route::Transactions);
        assert_eq!(Route::from_path("/budgets?month=202403"), Route::Budgets);
        assert_eq!(Route::from_path("/nope"), Route::Dashboard);
        assert_eq!(Route::from_path(""), Route::Dashboard);
    }

    #[test]
    fn test_path_round_trip() {
        for route in Route::PAGES {
            assert_eq!(Route::from_path(route.path()), route);
        }
        assert_eq!(Route::from_path(Route::Login.path()), Route::Login);
    }

    #[test]
    fn test_next_prev_wrap() {
        assert_eq!(Route::Budgets.next(), Route::Dashboard);
        assert_eq!(Route::Dashboard.prev(), Route::Budgets);
        assert_eq!(Route::Categories.next().prev(), Route::Categories);
        assert_eq!(Route::Login.next(), Route::Login);
    }

    #[test]
    fn test_guard_protected_routes() {
        assert_eq!(
            guard(Route::Budgets, &AuthState::Authenticated),
            GuardDecision::Render(Route::Budgets)
        );
        assert_eq!(guard(Route::Budgets, &AuthState::Restored), GuardDecision::Loading);
        assert_eq!(
            guard(Route::Budgets, &AuthState::Unauthenticated),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_guard_login_route() {
        assert_eq!(
            guard(Route::Login, &AuthState::Unauthenticated),
            GuardDecision::Render(Route::Login)
        );
        assert_eq!(
            guard(Route::Login, &AuthState::Authenticated),
            GuardDecision::Redirect(Route::Dashboard)
        );
    }

    #[test]
    fn test_navigator_shared_between_clones() {
        let nav = Navigator::default();
        let other = nav.clone();
        let mut rx = nav.subscribe();

        other.redirect_to_login();
        assert_eq!(nav.current(), Route::Login);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Route::Login);

        // Redirecting again while on the login page is a no-op
        other.redirect_to_login();
        assert!(!rx.has_changed().unwrap());

        nav.navigate(Route::Accounts);
        assert_eq!(other.current(), Route::Accounts);
    }
}
