use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::{
    api::ApiState,
    auth::{Credential, Session},
    error::{ApiError, SessionError, StorageError},
    models::{Identity, Notification, RegisterRequest, UserRole},
    notify::Notifier,
    storage::{SESSION_KEYS, StorageState, TOKEN_KEY, USER_ID_KEY, USER_KEY},
};

/// SessionStore
///
/// Single source of truth for who is using the client. One instance is built at
/// startup, `restore()`d once, and then shared by handle with every view for
/// the rest of the process lifetime.
///
/// Mutating operations (`restore`, `login`, `logout`, `expire`) hold an
/// operation lock for their whole duration, so a reader never observes a
/// half-committed identity/credential pair.
pub struct SessionStore {
    api: ApiState,
    storage: StorageState,
    notifier: Notifier,
    state: watch::Sender<Option<Session>>,
    op_lock: Mutex<()>,
}

/// SessionHandle
///
/// How views hold on to the store.
pub type SessionHandle = Arc<SessionStore>;

impl SessionStore {
    pub fn new(api: ApiState, storage: StorageState, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            api,
            storage,
            notifier,
            state,
            op_lock: Mutex::new(()),
        }
    }

    pub fn into_handle(self) -> SessionHandle {
        Arc::new(self)
    }

    // --- Read / subscribe ---

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().as_ref().map(|s| s.identity.clone())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().as_ref().map(|s| s.credential.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// A receiver that observes every session change from now on.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn api(&self) -> &ApiState {
        &self.api
    }

    // --- Lifecycle ---

    /// restore
    ///
    /// Loads a previously persisted session from durable storage. No network
    /// call is made. Missing, partial or malformed data leaves the store empty;
    /// malformed leftovers are purged so they are not re-read on every start.
    pub async fn restore(&self) {
        let _op = self.op_lock.lock().await;

        match self.load_persisted().await {
            Ok(Some(session)) => {
                info!(user_id = session.identity.id, "Session restored from storage");
                self.state.send_replace(Some(session));
            }
            Ok(None) => {
                debug!("No persisted session");
                self.state.send_replace(None);
            }
            Err(reason) => {
                warn!(%reason, "Discarding unusable persisted session");
                self.state.send_replace(None);
                if let Err(e) = self.storage.remove_items(&SESSION_KEYS).await {
                    debug!(error = %e, "Could not purge persisted session");
                }
            }
        }
    }

    async fn load_persisted(&self) -> Result<Option<Session>, String> {
        let user = self
            .storage
            .get_item(USER_KEY)
            .await
            .map_err(|e| e.to_string())?;
        let token = self
            .storage
            .get_item(TOKEN_KEY)
            .await
            .map_err(|e| e.to_string())?;

        match (user, token) {
            (None, None) => Ok(None),
            (Some(user), Some(token)) => {
                let identity: Identity = serde_json::from_str(&user)
                    .map_err(|e| format!("identity record: {}", e))?;
                let credential = Credential::new(token);
                if credential.is_empty() {
                    return Err("empty credential".to_string());
                }
                Ok(Some(Session {
                    identity,
                    credential,
                }))
            }
            (Some(_), None) => Err("identity without credential".to_string()),
            (None, Some(_)) => Err("credential without identity".to_string()),
        }
    }

    /// login
    ///
    /// Exchanges email and password for a credential, fetches the identity with
    /// it, then commits both to memory and durable storage. Any failure leaves
    /// the store signed out; nothing is retried.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let _op = self.op_lock.lock().await;

        let session = match self.authenticate(email.trim(), password).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.clear_quietly().await;
                self.notify_login_failed();
                return Err(SessionError::LoginFailed(e));
            }
        };

        if let Err(e) = self.persist(&session).await {
            warn!(error = %e, "Could not persist session, rolling back login");
            self.clear_quietly().await;
            self.notify_login_failed();
            return Err(e);
        }

        let identity = session.identity.clone();
        self.state.send_replace(Some(session));

        info!(user_id = identity.id, role = %identity.role(), "Login successful");
        self.notifier.publish(Notification::success(
            "Login successful",
            format!("Welcome back, {}!", identity.username),
        ));

        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let token = self.api.login(email, password).await?;
        let credential = Credential::new(token.access_token);
        let identity = self.api.current_user(&credential).await?;
        Ok(Session {
            identity,
            credential,
        })
    }

    async fn persist(&self, session: &Session) -> Result<(), SessionError> {
        let record = serde_json::to_string(&session.identity)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        self.storage.set_item(USER_KEY, &record).await?;
        self.storage
            .set_item(TOKEN_KEY, session.credential.expose())
            .await?;
        self.storage
            .set_item(USER_ID_KEY, &session.identity.id.to_string())
            .await?;
        Ok(())
    }

    fn notify_login_failed(&self) {
        self.notifier.publish(Notification::destructive(
            "Login failed",
            "Invalid email or password",
        ));
    }

    /// Drops the in-memory session and best-effort clears durable storage.
    async fn clear_quietly(&self) {
        self.state.send_replace(None);
        if let Err(e) = self.storage.remove_items(&SESSION_KEYS).await {
            debug!(error = %e, "Could not clear persisted session");
        }
    }

    /// register
    ///
    /// Creates an account on the backend. All four fields must be non-blank and
    /// the role must be `student` or `admin`; otherwise the request is refused
    /// before any network call. Does not sign the new account in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<(), SessionError> {
        let fields = [
            ("name", name),
            ("email", email),
            ("password", password),
            ("role", role),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            self.notifier.publish(Notification::destructive(
                "Incomplete Form",
                "Please fill in all the fields before registering.",
            ));
            return Err(SessionError::IncompleteForm(*field));
        }

        let role = role.parse::<UserRole>().map_err(|unknown| {
            self.notifier.publish(Notification::destructive(
                "Registration failed",
                "Please choose either the student or the admin role.",
            ));
            SessionError::InvalidRole(unknown)
        })?;

        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            role,
            username: name.trim().to_string(),
        };

        match self.api.register(&request).await {
            Ok(()) => {
                info!(email = %request.email, %role, "Registration accepted");
                self.notifier.publish(Notification::success(
                    "Registration successful",
                    format!("Welcome, {}! You can now log in.", request.username),
                ));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Registration rejected");
                self.notifier.publish(Notification::destructive(
                    "Registration failed",
                    "Please enter a valid email",
                ));
                Err(SessionError::RegistrationFailed(e))
            }
        }
    }

    /// logout
    ///
    /// Clears the session from memory and durable storage. Idempotent: when
    /// nobody is signed in it only makes sure storage holds no leftovers.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let _op = self.op_lock.lock().await;

        let previous = self.state.send_replace(None);
        let removed = self.storage.remove_items(&SESSION_KEYS).await;

        let Some(session) = previous else {
            if let Err(e) = removed {
                debug!(error = %e, "Could not clear persisted session");
            }
            return Ok(());
        };

        info!(user_id = session.identity.id, "Logged out");
        self.notifier.publish(Notification::success(
            "Logged out",
            "You have been logged out successfully",
        ));
        removed.map_err(Into::into)
    }

    /// expire
    ///
    /// Ends the session after the backend rejected its credential. Behaves like
    /// `logout` with a different notification.
    pub async fn expire(&self) {
        let _op = self.op_lock.lock().await;
        self.expire_locked().await;
    }

    async fn expire_locked(&self) {
        let Some(session) = self.state.send_replace(None) else {
            return;
        };
        if let Err(e) = self.storage.remove_items(&SESSION_KEYS).await {
            debug!(error = %e, "Could not clear persisted session");
        }

        warn!(user_id = session.identity.id, "Credential rejected, session expired");
        self.notifier.publish(Notification::destructive(
            "Session expired",
            "Please log in again.",
        ));
    }

    // --- Authenticated calls ---

    /// authorized
    ///
    /// Runs a backend call with the current credential. A 401 from the backend
    /// ends the session (if it is still the one the call was made with) and
    /// surfaces as `SessionError::Expired`.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, SessionError>
    where
        F: FnOnce(Credential) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let credential = self.credential().ok_or(SessionError::NotAuthenticated)?;

        match call(credential.clone()).await {
            Err(ApiError::Unauthorized) => {
                let _op = self.op_lock.lock().await;
                let still_current = self
                    .credential()
                    .is_some_and(|current| current.expose() == credential.expose());
                if still_current {
                    self.expire_locked().await;
                }
                Err(SessionError::Expired)
            }
            other => other.map_err(SessionError::from),
        }
    }

    /// Lists accounts for the administrator "students" screen.
    pub async fn list_users(&self, skip: u32, limit: u32) -> Result<Vec<Identity>, SessionError> {
        let api = self.api.clone();
        self.authorized(|credential| async move { api.list_users(&credential, skip, limit).await })
            .await
    }
}
