use std::sync::Arc;

// --- Module Structure ---

// Core session components.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod notify;
pub mod session;
pub mod storage;

// Route surface segregated by access level (Public, Member, Admin).
pub mod routes;

// --- Public Re-exports ---

pub use api::{ApiState, AuthApi, HttpAuthApi};
pub use auth::{Credential, Session};
pub use config::AppConfig;
pub use error::{ApiError, SessionError, StorageError};
pub use guard::{GuardOutcome, GuardState, RouteRequirement};
pub use models::{Identity, Notification, UserRole};
pub use notify::Notifier;
pub use routes::{Navigation, RouteTable, View};
pub use session::{SessionHandle, SessionStore};
pub use storage::{ClientStorage, FileStorage, MemoryStorage, StorageState};

/// AppState
///
/// The single container the view layer is handed at startup: the session
/// store, the route table the guard runs against, and the loaded
/// configuration. Cheap to clone; every clone shares the same session.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub routes: Arc<RouteTable>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires an already-built session store to the full route table.
    pub fn new(session: SessionHandle, config: AppConfig) -> Self {
        Self {
            session,
            routes: Arc::new(routes::create_route_table()),
            config,
        }
    }

    /// build
    ///
    /// Production wiring: HTTP backend and file-backed storage from `config`,
    /// then restores any persisted session. No network call is made here.
    pub async fn build(config: AppConfig) -> Result<Self, ApiError> {
        let api = Arc::new(HttpAuthApi::from_config(&config)?) as ApiState;
        let storage = Arc::new(FileStorage::new(config.session_file.clone())) as StorageState;

        let session = SessionStore::new(api, storage, Notifier::new()).into_handle();
        session.restore().await;

        Ok(Self::new(session, config))
    }

    /// Runs the route guard for `path` against the current identity.
    pub fn navigate(&self, path: &str) -> Navigation {
        let identity = self.session.identity();
        routes::navigate(&self.routes, path, identity.as_ref())
    }
}
