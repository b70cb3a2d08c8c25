use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use uuid::Uuid;

// --- Identity ---

/// Identity
///
/// The signed-in actor as returned by `GET /users/me`. Field names follow the
/// backend record exactly so the same JSON is accepted from the API and from
/// durable storage.
///
/// `is_admin` is fixed for the lifetime of a session; a role change only takes
/// effect after logging in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
}

impl Identity {
    /// The coarse role used for navigation and route gating.
    pub fn role(&self) -> UserRole {
        if self.is_admin {
            UserRole::Admin
        } else {
            UserRole::Student
        }
    }
}

/// UserRole
///
/// The two account kinds known to the platform. Sent verbatim in registration
/// requests (`"student"` / `"admin"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UserRole {
    Student,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "student" => Ok(UserRole::Student),
            "admin" => Ok(UserRole::Admin),
            other => Err(other.to_string()),
        }
    }
}

// --- Request Payloads ---

/// LoginForm
///
/// Form-encoded body of `POST /auth/login`. The backend accepts either the email
/// or the username in the `username` field; this client always sends the email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// RegisterRequest
///
/// JSON body of `POST /auth/register`. The password is passed through to the
/// backend and never logged or persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub username: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .field("username", &self.username)
            .finish()
    }
}

// --- Response Payloads ---

/// TokenResponse
///
/// Successful response of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// ApiErrorBody
///
/// Error envelope returned by the backend on non-2xx responses. `detail` is a
/// plain message for domain errors and a list of field errors for validation
/// failures, so it is kept as raw JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ApiErrorBody {
    /// Flattens `detail` into a single human-readable line.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| {
                        item.get("msg")
                            .and_then(|msg| msg.as_str())
                            .map(str::to_string)
                            .unwrap_or_else(|| item.to_string())
                    })
                    .collect();
                Some(parts.join("; "))
            }
            other => Some(other.to_string()),
        }
    }
}

// --- Notifications ---

/// NotificationVariant
///
/// Visual weight of a notification; `Destructive` marks failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// Notification
///
/// A user-facing message emitted by session operations (login, logout,
/// registration, expiry). Rendered by the view layer as a toast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_variant(title, description, NotificationVariant::Default)
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_variant(title, description, NotificationVariant::Destructive)
    }

    fn with_variant(
        title: impl Into<String>,
        description: impl Into<String>,
        variant: NotificationVariant,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            variant,
            created_at: Utc::now(),
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_uses_backend_field_names() {
        let json = r#"{"id":7,"email":"admin@college.edu","username":"admin","is_admin":true}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();

        assert_eq!(identity.id, 7);
        assert_eq!(identity.role(), UserRole::Admin);
    }

    #[test]
    fn role_parses_lowercase_names_only() {
        assert_eq!("student".parse::<UserRole>(), Ok(UserRole::Student));
        assert_eq!(" admin ".parse::<UserRole>(), Ok(UserRole::Admin));
        assert!("Teacher".parse::<UserRole>().is_err());
    }

    #[test]
    fn error_body_flattens_validation_details() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.message().as_deref(),
            Some("value is not a valid email address")
        );

        let plain: ApiErrorBody =
            serde_json::from_str(r#"{"detail":"Incorrect username/email or password"}"#).unwrap();
        assert_eq!(
            plain.message().as_deref(),
            Some("Incorrect username/email or password")
        );
    }

    #[test]
    fn token_response_debug_hides_token() {
        let token = TokenResponse {
            access_token: "abc.def.ghi".to_string(),
            token_type: "bearer".to_string(),
        };
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("abc.def.ghi"));
        assert!(rendered.contains("bearer"));
    }
}
