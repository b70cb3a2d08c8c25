use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::models::Identity;

/// Credential
///
/// The opaque bearer token issued by `POST /auth/login`. It is never decoded or
/// inspected by the client; the only thing done with it is attaching it verbatim
/// as `Authorization: Bearer <token>` and persisting it for the next start.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the HTTP layer and durable storage only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// The full `Authorization` header value.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Session
///
/// An authenticated identity together with the credential that proves it.
/// Committed and cleared as one unit.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub credential: Credential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_token() {
        let credential = Credential::new("eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert_eq!(format!("{:?}", credential), "Credential([REDACTED])");
    }

    #[test]
    fn bearer_header_attaches_token_verbatim() {
        let credential = Credential::new("not-a-jwt at all");
        assert_eq!(credential.bearer_header(), "Bearer not-a-jwt at all");
    }
}
