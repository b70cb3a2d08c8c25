use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::{
    auth::Credential,
    config::AppConfig,
    error::ApiError,
    models::{ApiErrorBody, Identity, LoginForm, RegisterRequest, TokenResponse},
};

/// AuthApi Trait
///
/// The contract for every backend call the session layer makes. Views and the
/// session store depend on this trait only, so tests can run against a fake
/// backend or a hand-written mock without touching the network.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login` (form-encoded). Exchanges credentials for a bearer token.
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError>;

    /// `GET /users/me`. Fetches the identity the credential belongs to.
    async fn current_user(&self, credential: &Credential) -> Result<Identity, ApiError>;

    /// `POST /auth/register` (JSON). Creates an account; does not sign it in.
    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError>;

    /// `GET /users/?skip=&limit=`. Administrator listing of accounts.
    async fn list_users(
        &self,
        credential: &Credential,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Identity>, ApiError>;
}

/// ApiState
///
/// The shared handle to the backend collaborator.
pub type ApiState = Arc<dyn AuthApi>;

/// HttpAuthApi
///
/// The concrete `AuthApi` backed by the campus events REST API over HTTP.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Builds a client for `base_url` (for example `http://host/api/v1`).
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps non-success statuses onto `ApiError`, pulling the backend's
    /// `detail` message out of the body when there is one.
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.message())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(ApiError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(skip_all, fields(email = %email))]
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let form = LoginForm {
            username: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/auth/login"))
            .form(&form)
            .send()
            .await
            .map_err(transport)?;

        let token: TokenResponse = Self::decode(response).await.inspect_err(|e| {
            warn!(error = %e, "Login request rejected");
        })?;

        if !token.token_type.eq_ignore_ascii_case("bearer") {
            // The token is still attached as a bearer credential; only note the oddity.
            debug!(token_type = %token.token_type, "Unexpected token type from backend");
        }

        Ok(token)
    }

    #[instrument(skip_all)]
    async fn current_user(&self, credential: &Credential) -> Result<Identity, ApiError> {
        let response = self
            .client
            .get(self.url("/users/me"))
            .header(header::AUTHORIZATION, credential.bearer_header())
            .send()
            .await
            .map_err(transport)?;

        Self::decode(response).await
    }

    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        Self::check_status(response).await.map(|_| ())
    }

    #[instrument(skip(self, credential))]
    async fn list_users(
        &self,
        credential: &Credential,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Identity>, ApiError> {
        let response = self
            .client
            .get(self.url("/users/"))
            .query(&[("skip", skip), ("limit", limit)])
            .header(header::AUTHORIZATION, credential.bearer_header())
            .send()
            .await
            .map_err(transport)?;

        Self::decode(response).await
    }
}
