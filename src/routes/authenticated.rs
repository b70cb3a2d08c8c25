use super::{Route, View};
use crate::guard::RouteRequirement;

/// Member Route Module
///
/// Screens for signed-in students. Signed-out visitors are sent to the login
/// view; administrators are sent to their own landing view instead.
pub fn authenticated_routes() -> Vec<Route> {
    let member = |pattern: &'static str, view: View| Route::new(pattern, view, RouteRequirement::Member);

    vec![
        // The student landing view: registered events and their QR codes.
        member("/dashboard", View::Dashboard),
        // Filing a new bug report.
        member("/bug-report", View::BugReport),
    ]
}
