use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::Identity;

/// Where signed-out visitors are sent.
pub const LOGIN_ROUTE: &str = "/login";
/// Landing view for administrators.
pub const ADMIN_LANDING: &str = "/admin";
/// Landing view for standard members.
pub const MEMBER_LANDING: &str = "/dashboard";

/// RouteRequirement
///
/// The access level a view declares. `Member` views are for signed-in
/// non-administrators; an administrator reaching one is sent to the admin
/// landing instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RouteRequirement {
    #[serde(rename = "none")]
    Public,
    #[serde(rename = "any-authenticated")]
    Member,
    #[serde(rename = "administrator-only")]
    Admin,
}

/// GuardState
///
/// How a navigation was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Public,
    Unauthenticated,
    RoleMismatch,
    Authorized,
}

/// Why a navigation was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    Unauthenticated,
    RoleMismatch,
}

/// GuardOutcome
///
/// What the view layer should do with a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    Redirect {
        to: &'static str,
        reason: RedirectReason,
    },
}

impl GuardOutcome {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardOutcome::Render)
    }

    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GuardOutcome::Render => None,
            GuardOutcome::Redirect { to, .. } => Some(to),
        }
    }
}

/// The landing view for an identity's role.
pub fn landing_route(identity: &Identity) -> &'static str {
    if identity.is_admin {
        ADMIN_LANDING
    } else {
        MEMBER_LANDING
    }
}

/// Where the login screen sends a freshly signed-in user. The path requested
/// before the login redirect is not remembered.
pub fn post_login_route(identity: &Identity) -> &'static str {
    landing_route(identity)
}

/// classify
///
/// Pure function of the current identity and the view's requirement.
pub fn classify(identity: Option<&Identity>, requirement: RouteRequirement) -> GuardState {
    match (requirement, identity) {
        (RouteRequirement::Public, _) => GuardState::Public,
        (_, None) => GuardState::Unauthenticated,
        (RouteRequirement::Admin, Some(identity)) if !identity.is_admin => GuardState::RoleMismatch,
        (RouteRequirement::Member, Some(identity)) if identity.is_admin => GuardState::RoleMismatch,
        (_, Some(_)) => GuardState::Authorized,
    }
}

/// evaluate
///
/// Decides whether a view may render, and if not, where to go instead.
pub fn evaluate(identity: Option<&Identity>, requirement: RouteRequirement) -> GuardOutcome {
    match classify(identity, requirement) {
        GuardState::Public | GuardState::Authorized => GuardOutcome::Render,
        GuardState::Unauthenticated => GuardOutcome::Redirect {
            to: LOGIN_ROUTE,
            reason: RedirectReason::Unauthenticated,
        },
        GuardState::RoleMismatch => GuardOutcome::Redirect {
            // classify only yields RoleMismatch with an identity present.
            to: identity.map(landing_route).unwrap_or(LOGIN_ROUTE),
            reason: RedirectReason::RoleMismatch,
        },
    }
}
