use super::{Route, View};
use crate::guard::RouteRequirement;

/// Public Route Module
///
/// Views reachable without signing in: the login screen and the read-only
/// event browsing pages. The guard always lets these render; each view fetches
/// its own data and only attaches a credential when one exists.
pub fn public_routes() -> Vec<Route> {
    let public = |pattern: &'static str, view: View| Route::new(pattern, view, RouteRequirement::Public);

    vec![
        // The root opens on the sign-in / sign-up screen.
        public("/", View::Login),
        public("/login", View::Login),
        public("/index", View::Index),
        // Event listing and detail are browsable by anyone.
        public("/events", View::Events),
        public("/events/:id", View::EventDetail),
        public("/about", View::About),
    ]
}
