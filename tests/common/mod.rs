#![allow(dead_code)]

// In-process stand-in for the campus events REST API, served with axum on an
// ephemeral port. Only the endpoints the session layer talks to are modelled.

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use campus_session::{
    ApiState, HttpAuthApi, MemoryStorage, Notification, Notifier, SessionStore,
    models::{Identity, LoginForm, RegisterRequest},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub const ADMIN_EMAIL: &str = "admin@college.edu";
pub const STUDENT_EMAIL: &str = "student@college.edu";
pub const PASSWORD: &str = "password";

#[derive(Clone)]
pub struct Account {
    pub identity: Identity,
    pub password: String,
}

#[derive(Default)]
pub struct BackendState {
    pub accounts: Vec<Account>,
    pub login_calls: usize,
    pub profile_calls: usize,
    pub register_calls: usize,
    // When set, GET /users/me answers 500.
    pub profile_fails: bool,
    // When set, every bearer token is rejected with 401.
    pub revoked: bool,
    pub last_list_query: Option<(u32, u32)>,
}

impl BackendState {
    fn seeded() -> Self {
        let account = |id, email: &str, username: &str, is_admin| Account {
            identity: Identity {
                id,
                email: email.to_string(),
                username: username.to_string(),
                is_admin,
            },
            password: PASSWORD.to_string(),
        };

        Self {
            accounts: vec![
                account(1, ADMIN_EMAIL, "admin", true),
                account(2, STUDENT_EMAIL, "student", false),
            ],
            ..Self::default()
        }
    }
}

type Shared = Arc<Mutex<BackendState>>;

pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    pub fn api(&self) -> ApiState {
        Arc::new(HttpAuthApi::new(&self.base_url, Duration::from_secs(5)).unwrap())
    }
}

pub fn token_for(id: i64) -> String {
    format!("token-{}", id)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn caller(state: &BackendState, headers: &HeaderMap) -> Option<Identity> {
    if state.revoked {
        return None;
    }
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    state
        .accounts
        .iter()
        .find(|a| token_for(a.identity.id) == token)
        .map(|a| a.identity.clone())
}

async fn login(State(state): State<Shared>, Form(form): Form<LoginForm>) -> Response {
    let mut state = state.lock().unwrap();
    state.login_calls += 1;

    let found = state.accounts.iter().find(|a| {
        (a.identity.email == form.username || a.identity.username == form.username)
            && a.password == form.password
    });

    match found {
        Some(account) => Json(json!({
            "access_token": token_for(account.identity.id),
            "token_type": "bearer",
        }))
        .into_response(),
        None => detail(
            StatusCode::BAD_REQUEST,
            "Incorrect username/email or password",
        ),
    }
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.profile_calls += 1;

    if state.profile_fails {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    match caller(&state, &headers) {
        Some(identity) => Json(identity).into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"),
    }
}

async fn register(State(state): State<Shared>, Json(request): Json<RegisterRequest>) -> Response {
    let mut state = state.lock().unwrap();
    state.register_calls += 1;

    if state.accounts.iter().any(|a| a.identity.email == request.email) {
        return detail(
            StatusCode::BAD_REQUEST,
            "The user with this email already exists in the system.",
        );
    }

    let identity = Identity {
        id: state.accounts.len() as i64 + 1,
        email: request.email.clone(),
        username: request.username.clone(),
        is_admin: false,
    };
    state.accounts.push(Account {
        identity: identity.clone(),
        password: request.password.clone(),
    });
    Json(identity).into_response()
}

#[derive(Deserialize)]
struct Page {
    skip: u32,
    limit: u32,
}

async fn list_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(page): Query<Page>,
) -> Response {
    let mut state = state.lock().unwrap();

    match caller(&state, &headers) {
        None => detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"),
        Some(identity) if !identity.is_admin => detail(
            StatusCode::FORBIDDEN,
            "The user doesn't have enough privileges",
        ),
        Some(_) => {
            state.last_list_query = Some((page.skip, page.limit));
            let users: Vec<Identity> = state
                .accounts
                .iter()
                .skip(page.skip as usize)
                .take(page.limit as usize)
                .map(|a| a.identity.clone())
                .collect();
            Json(users).into_response()
        }
    }
}

pub async fn spawn_backend() -> FakeBackend {
    let state: Shared = Arc::new(Mutex::new(BackendState::seeded()));

    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/users/me", get(me))
        .route("/api/v1/users/", get(list_users))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeBackend {
        base_url: format!("http://127.0.0.1:{}/api/v1", port),
        state,
    }
}

pub fn session_store(api: ApiState, storage: &MemoryStorage) -> SessionStore {
    SessionStore::new(api, Arc::new(storage.clone()), Notifier::new())
}

pub fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut received = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        received.push(notification);
    }
    received
}
