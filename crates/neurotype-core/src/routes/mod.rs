//! Client routes and the authentication guard in front of them.
//!
//! `guard` is a pure function of the session snapshot; `Router` applies it on
//! every navigation so a protected screen is never entered (and never fetches
//! anything) without a token.

use std::fmt;

use tracing::debug;

use crate::auth::Session;
use crate::models::NoteRef;

/// Every client-visible path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Register,
    SelectPlan,
    Profile,
    Dashboard,
    Notes,
    NoteDetail(NoteRef),
    Calendar,
    Recommendations,
    Export,
    Chat,
}

impl Route {
    /// Every route with a fixed path, plus the two note-detail shapes
    pub const ALL: [Route; 13] = [
        Route::Landing,
        Route::Login,
        Route::Register,
        Route::SelectPlan,
        Route::Profile,
        Route::Dashboard,
        Route::Notes,
        Route::NoteDetail(NoteRef::New),
        Route::NoteDetail(NoteRef::Id(1)),
        Route::Calendar,
        Route::Recommendations,
        Route::Export,
        Route::Chat,
    ];

    /// Parse a path like `/notes/42`. Trailing slashes are ignored.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim().trim_end_matches('/');
        let route = match trimmed {
            "" => Route::Landing,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/select-plan" => Route::SelectPlan,
            "/profile" => Route::Profile,
            "/dashboard" => Route::Dashboard,
            "/notes" => Route::Notes,
            "/calendar" => Route::Calendar,
            "/recommendations" => Route::Recommendations,
            "/export" => Route::Export,
            "/chat" => Route::Chat,
            other => {
                let id = other.strip_prefix("/notes/")?;
                Route::NoteDetail(NoteRef::parse(id)?)
            }
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::SelectPlan => "/select-plan".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Notes => "/notes".to_string(),
            Route::NoteDetail(note) => format!("/notes/{}", note),
            Route::Calendar => "/calendar".to_string(),
            Route::Recommendations => "/recommendations".to_string(),
            Route::Export => "/export".to_string(),
            Route::Chat => "/chat".to_string(),
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Landing | Route::Login | Route::Register)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Landing => "Welcome",
            Route::Login => "Log in",
            Route::Register => "Create account",
            Route::SelectPlan => "Choose a plan",
            Route::Profile => "Profile",
            Route::Dashboard => "Dashboard",
            Route::Notes => "Notes",
            Route::NoteDetail(NoteRef::New) => "New note",
            Route::NoteDetail(NoteRef::Id(_)) => "Note",
            Route::Calendar => "Calendar",
            Route::Recommendations => "Recommendations",
            Route::Export => "Export",
            Route::Chat => "Chat",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of guarding a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Render(Route),
    Redirect(Route),
}

impl Guard {
    /// The route that ends up on screen
    pub fn target(&self) -> Route {
        match *self {
            Guard::Render(route) | Guard::Redirect(route) => route,
        }
    }
}

/// Protected routes render only with a token present; everything else goes to login.
/// A token still being resolved counts as present.
pub fn guard(route: Route, session: &Session) -> Guard {
    if route.is_protected() && !session.is_authenticated() {
        Guard::Redirect(Route::Login)
    } else {
        Guard::Render(route)
    }
}

/// Current route plus a back-stack of guarded routes
#[derive(Debug, Clone)]
pub struct Router {
    current: Route,
    history: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Route::Landing)
    }
}

impl Router {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Guard `route` against `session` and enter whatever the guard allows.
    /// Returns the route actually entered.
    pub fn navigate(&mut self, route: Route, session: &Session) -> Route {
        let target = match guard(route, session) {
            Guard::Render(route) => route,
            Guard::Redirect(to) => {
                debug!(from = %route, to = %to, "Redirecting unauthenticated navigation");
                to
            }
        };
        if target != self.current {
            self.history.push(self.current);
            self.current = target;
        }
        target
    }

    /// Pop the back-stack, skipping entries the session may no longer enter.
    /// Returns the route entered, or `None` if there was nothing to go back to.
    pub fn back(&mut self, session: &Session) -> Option<Route> {
        while let Some(previous) = self.history.pop() {
            if let Guard::Render(route) = guard(previous, session) {
                self.current = route;
                return Some(route);
            }
        }
        None
    }

    /// Replace the current route and forget history (used after logout)
    pub fn reset(&mut self, route: Route) {
        self.history.clear();
        self.current = route;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> Session {
        Session {
            token: Some("t".to_string()),
            user: None,
            is_loading: false,
        }
    }

    #[test]
    fn test_parse_and_path_agree() {
        for route in Route::ALL {
            assert_eq!(Route::parse(&route.path()), Some(route), "{}", route);
        }
        assert_eq!(Route::parse("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/"), Some(Route::Landing));
        assert_eq!(Route::parse("/notes/new"), Some(Route::NoteDetail(NoteRef::New)));
        assert_eq!(Route::parse("/notes/17"), Some(Route::NoteDetail(NoteRef::Id(17))));
        assert_eq!(Route::parse("/notes/abc"), None);
        assert_eq!(Route::parse("/nowhere"), None);
    }

    #[test]
    fn test_public_routes() {
        let public: Vec<Route> = Route::ALL.into_iter().filter(|r| !r.is_protected()).collect();
        assert_eq!(public, vec![Route::Landing, Route::Login, Route::Register]);
    }

    #[test]
    fn test_guard_every_route() {
        let anonymous = Session::default();
        let authed = logged_in();
        for route in Route::ALL {
            assert_eq!(guard(route, &authed), Guard::Render(route));
            if route.is_protected() {
                assert_eq!(guard(route, &anonymous), Guard::Redirect(Route::Login), "{}", route);
            } else {
                assert_eq!(guard(route, &anonymous), Guard::Render(route));
            }
        }
    }

    #[test]
    fn test_loading_session_may_enter() {
        let loading = Session {
            token: Some("t".to_string()),
            user: None,
            is_loading: true,
        };
        assert_eq!(guard(Route::Dashboard, &loading), Guard::Render(Route::Dashboard));
    }

    #[test]
    fn test_router_redirects_and_goes_back() {
        let mut router = Router::default();
        assert_eq!(router.navigate(Route::Dashboard, &Session::default()), Route::Login);
        assert_eq!(router.current(), Route::Login);

        let session = logged_in();
        router.navigate(Route::Dashboard, &session);
        router.navigate(Route::Notes, &session);
        assert_eq!(router.back(&session), Some(Route::Dashboard));
        assert_eq!(router.back(&session), Some(Route::Login));
        assert_eq!(router.back(&session), Some(Route::Landing));
        assert_eq!(router.back(&session), None);
    }

    #[test]
    fn test_back_skips_routes_closed_by_logout() {
        let session = logged_in();
        let mut router = Router::default();
        router.navigate(Route::Login, &session);
        router.navigate(Route::Dashboard, &session);
        router.navigate(Route::Calendar, &session);

        assert_eq!(router.back(&Session::default()), Some(Route::Login));
    }

    #[test]
    fn test_navigate_to_current_keeps_history_flat() {
        let session = logged_in();
        let mut router = Router::new(Route::Dashboard);
        router.navigate(Route::Dashboard, &session);
        assert_eq!(router.back(&session), None);
    }
}
