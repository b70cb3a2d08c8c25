//! Route Module Index
//!
//! The client's route surface, split by access level the same way the views
//! are: public browsing, member-only screens, and administrator screens. Each
//! submodule declares its routes with the requirement of its group, and
//! `create_route_table` merges them into the table the guard runs against.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    guard::{self, GuardOutcome, RouteRequirement},
    models::Identity,
};

/// Routes open to everyone, signed in or not.
pub mod public;

/// Routes for signed-in standard members.
pub mod authenticated;

/// Routes restricted to administrators.
pub mod admin;

/// View
///
/// The screens the view layer knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    Index,
    Events,
    EventDetail,
    About,
    Dashboard,
    BugReport,
    AdminDashboard,
    StudentUsers,
    Registrations,
    CheckIn,
    CreateEvent,
    EditEvent,
    BugReportDetail,
    NotFound,
}

/// Route
///
/// A path pattern bound to a view and its access requirement. Patterns are
/// absolute and may contain `:name` segments that capture one path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub pattern: &'static str,
    pub view: View,
    pub requirement: RouteRequirement,
}

impl Route {
    pub const fn new(pattern: &'static str, view: View, requirement: RouteRequirement) -> Self {
        Self {
            pattern,
            view,
            requirement,
        }
    }

    /// Matches `segments` against this pattern, returning the captured
    /// parameters and the number of literal segments that matched.
    fn matches(&self, segments: &[&str]) -> Option<(Vec<(&'static str, String)>, usize)> {
        let pattern: Vec<&'static str> = split_segments(self.pattern);
        if pattern.len() != segments.len() {
            return None;
        }

        let mut params = Vec::new();
        let mut literals = 0;
        for (expected, actual) in pattern.into_iter().zip(segments.iter().copied()) {
            if let Some(name) = expected.strip_prefix(':') {
                params.push((name, actual.to_string()));
            } else if expected == actual {
                literals += 1;
            } else {
                return None;
            }
        }
        Some((params, literals))
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Drops the query string and fragment; `/events/` and `/events` are the same route.
fn route_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// RouteMatch
///
/// A resolved route with the parameters captured from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: Vec<(&'static str, String)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// RouteTable
///
/// Ordered collection of routes. When several patterns match a path, the one
/// with the most literal segments wins (`/events/create` beats `/events/:id`);
/// ties go to the route declared first.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(mut self, routes: Vec<Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let segments = split_segments(route_path(path));

        let mut best: Option<(RouteMatch<'_>, usize)> = None;
        for route in &self.routes {
            let Some((params, literals)) = route.matches(&segments) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, score)| literals > *score) {
                best = Some((RouteMatch { route, params }, literals));
            }
        }
        best.map(|(found, _)| found)
    }

    /// The declared requirement for a path; unknown paths are requirement-free.
    pub fn requirement_for(&self, path: &str) -> RouteRequirement {
        self.resolve(path)
            .map(|found| found.route.requirement)
            .unwrap_or(RouteRequirement::Public)
    }
}

/// create_route_table
///
/// Assembles the full route surface from the three access groups.
pub fn create_route_table() -> RouteTable {
    RouteTable::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
}

/// Navigation
///
/// The result of asking to show `path`: the resolved view, its parameters and
/// what the guard decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub view: View,
    pub params: Vec<(&'static str, String)>,
    pub outcome: GuardOutcome,
}

/// navigate
///
/// Resolves `path` and runs the route guard for `identity`. Unknown paths
/// resolve to `View::NotFound`, which always renders.
pub fn navigate(table: &RouteTable, path: &str, identity: Option<&Identity>) -> Navigation {
    let (view, params, requirement) = match table.resolve(path) {
        Some(found) => (found.route.view, found.params, found.route.requirement),
        None => (View::NotFound, Vec::new(), RouteRequirement::Public),
    };

    let outcome = guard::evaluate(identity, requirement);
    match outcome {
        GuardOutcome::Render => tracing::debug!(%path, ?view, "Navigation allowed"),
        GuardOutcome::Redirect { to, reason } => {
            tracing::debug!(%path, ?view, to, ?reason, "Navigation redirected")
        }
    }

    Navigation {
        path: path.to_string(),
        view,
        params,
        outcome,
    }
}

// --- Role-based navigation menu ---

/// NavLink
///
/// One entry of the navigation bar / sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NavLink {
    pub label: String,
    pub path: String,
}

impl NavLink {
    fn new(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
        }
    }
}

/// menu
///
/// The navigation links to show for the current identity, in display order.
pub fn menu(identity: Option<&Identity>) -> Vec<NavLink> {
    let is_member = identity.is_some_and(|i| !i.is_admin);
    let is_admin = identity.is_some_and(|i| i.is_admin);

    let mut links = vec![NavLink::new("Events", "/events")];
    if is_member {
        links.push(NavLink::new("Dashboard", guard::MEMBER_LANDING));
    }
    links.push(NavLink::new("About", "/about"));
    if is_admin {
        links.push(NavLink::new("Admin", guard::ADMIN_LANDING));
        links.push(NavLink::new("Students", "/student"));
        links.push(NavLink::new("Registrations", "/registrations"));
        links.push(NavLink::new("Check-in", "/checkin"));
    }
    if is_member {
        links.push(NavLink::new("Bug Report", "/bug-report"));
    }
    if identity.is_none() {
        links.push(NavLink::new("Login", guard::LOGIN_ROUTE));
    }
    links
}

/// Human label for the signed-in role.
pub fn role_label(identity: &Identity) -> &'static str {
    if identity.is_admin {
        "Administrator"
    } else {
        "Student"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Identity {
        Identity {
            id: 3,
            email: "student@college.edu".to_string(),
            username: "student".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn literal_segments_beat_parameters() {
        let table = create_route_table();
        let found = table.resolve("/events/create").unwrap();
        assert_eq!(found.route.view, View::CreateEvent);

        let detail = table.resolve("/events/42").unwrap();
        assert_eq!(detail.route.view, View::EventDetail);
        assert_eq!(detail.param("id"), Some("42"));
    }

    #[test]
    fn query_strings_and_trailing_slashes_are_ignored() {
        let table = create_route_table();
        assert_eq!(
            table.resolve("/dashboard/?tab=upcoming").unwrap().route.view,
            View::Dashboard
        );
        assert_eq!(table.resolve("/").unwrap().route.view, View::Login);
    }

    #[test]
    fn unknown_paths_render_not_found() {
        let table = create_route_table();
        let nav = navigate(&table, "/settings", None);
        assert_eq!(nav.view, View::NotFound);
        assert!(nav.outcome.is_render());
    }

    #[test]
    fn member_menu_hides_admin_links() {
        let links = menu(Some(&member()));
        let paths: Vec<&str> = links.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(paths, ["/events", "/dashboard", "/about", "/bug-report"]);
    }

    #[test]
    fn signed_out_menu_offers_login() {
        let links = menu(None);
        assert_eq!(links.last().map(|l| l.path.as_str()), Some("/login"));
        assert!(!links.iter().any(|l| l.path == "/dashboard"));
    }
}
