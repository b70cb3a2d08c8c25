use super::{Route, View};
use crate::guard::RouteRequirement;

/// Admin Route Module
///
/// Screens for administrators: event management, registrations, check-in and
/// bug triage. Members who reach one are sent back to the dashboard, never to
/// the login view.
pub fn admin_routes() -> Vec<Route> {
    let admin = |pattern: &'static str, view: View| Route::new(pattern, view, RouteRequirement::Admin);

    vec![
        admin("/admin", View::AdminDashboard),
        // Account listing backed by `GET /users/`.
        admin("/student", View::StudentUsers),
        admin("/registrations", View::Registrations),
        admin("/checkin", View::CheckIn),
        // Event management. `/events/create` must out-rank the public `/events/:id`.
        admin("/events/create", View::CreateEvent),
        admin("/events/:id/edit", View::EditEvent),
        // Bug triage detail, opened from the admin dashboard.
        admin("/bug-report/:id", View::BugReportDetail),
    ]
}
