//! Signed-in user and bearer token.
//!
//! # Design
//! - State moves `Unknown -> Authenticated | Anonymous`; `Unknown` only lasts
//!   until [`SessionStore::rehydrate`] runs at start-up.
//! - `is_authenticated` holds exactly when both a user and a token are present,
//!   because both live in one `Option`.
//! - Changes are published on a `watch` channel as a [`SessionStatus`]; the
//!   epoch increases whenever a new identity is established so dependents can
//!   tell a fresh sign-in from a token refresh.
//! - Auth endpoints are called directly, outside the 401 interceptor.
//! - Refreshes are serialised; a caller whose stale token was already replaced
//!   by a concurrent refresh reuses the new token without another round-trip.

use std::sync::{Arc, Mutex, PoisonError};

use animeverse_api_models::{
    AuthPayload, Envelope, LoginRequest, RefreshPayload, RefreshRequest, RegisterRequest,
    UserRecord,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{TokenSource, decode_body, ensure_success, send_with_context};
use crate::loading::LoadingFlag;
use crate::storage::{ACTIVE_PROFILE_KEY, KeyValueStore, SESSION_KEY, persist_or_warn, remove_or_warn};

/// Where the session stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Persisted state has not been read yet.
    Unknown,
    /// A user and token are present.
    Authenticated,
    /// Nobody is signed in.
    Anonymous,
}

/// Published session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStatus {
    /// Current phase.
    pub phase: SessionPhase,
    /// Incremented on every login, registration, and rehydration.
    pub epoch: u64,
}

#[derive(Default)]
struct SessionState {
    current: Option<AuthPayload>,
    error: Option<String>,
}

/// Owns the authenticated identity and its persistence.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: Client,
    base_url: String,
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
    status: watch::Sender<SessionStatus>,
    loading: LoadingFlag,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl SessionStore {
    /// Create a store in the `Unknown` phase.
    #[must_use]
    pub fn new(http: Client, base_url: impl Into<String>, storage: Arc<dyn KeyValueStore>) -> Self {
        let (status, _) = watch::channel(SessionStatus {
            phase: SessionPhase::Unknown,
            epoch: 0,
        });
        Self {
            inner: Arc::new(SessionInner {
                http,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                storage,
                state: Mutex::new(SessionState::default()),
                status,
                loading: LoadingFlag::new(),
                refresh_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Load the persisted session. A malformed record is discarded.
    pub fn rehydrate(&self) {
        let restored = self.inner.storage.get(SESSION_KEY).and_then(|raw| {
            match serde_json::from_str::<AuthPayload>(&raw) {
                Ok(payload) if !payload.token.trim().is_empty() => Some(payload),
                Ok(_) => {
                    warn!("persisted session has no token; discarding");
                    remove_or_warn(self.inner.storage.as_ref(), SESSION_KEY);
                    None
                }
                Err(err) => {
                    warn!(error = %err, "persisted session is malformed; discarding");
                    remove_or_warn(self.inner.storage.as_ref(), SESSION_KEY);
                    None
                }
            }
        });

        let phase = if restored.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        };
        debug!(?phase, "session rehydrated");
        self.state().current = restored;
        self.publish(phase, true);
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection; nothing is persisted on failure.
    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<UserRecord> {
        self.authenticate("/auth/login", credentials).await
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection; nothing is persisted on failure.
    pub async fn register(&self, account: &RegisterRequest) -> ClientResult<UserRecord> {
        self.authenticate("/auth/register", account).await
    }

    /// Forget the session locally, together with the persisted profile
    /// selection. Never fails and makes no network call.
    pub fn logout(&self) {
        remove_or_warn(self.inner.storage.as_ref(), SESSION_KEY);
        remove_or_warn(self.inner.storage.as_ref(), ACTIVE_PROFILE_KEY);
        let was_signed_in = self.state().current.take().is_some();
        if was_signed_in {
            info!("signed out");
        }
        self.publish(SessionPhase::Anonymous, false);
    }

    /// Exchange the current token for a fresh one.
    ///
    /// Returns `false`, after clearing the session, when there is no token or
    /// the server refuses.
    pub async fn refresh_token(&self) -> bool {
        let stale = self.token();
        self.refresh_from(stale.as_deref()).await
    }

    /// Signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<UserRecord> {
        self.state().current.as_ref().map(|session| session.user.clone())
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state().current.as_ref().map(|session| session.token.clone())
    }

    /// Whether a user and token are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().current.is_some()
    }

    /// Whether the signed-in user may edit the catalog.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state()
            .current
            .as_ref()
            .is_some_and(|session| session.user.is_admin)
    }

    /// Message from the last failed login or registration.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Whether a login or registration is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.is_loading()
    }

    /// Current published status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    /// Subscribe to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    async fn authenticate<B: Serialize + Sync>(&self, path: &str, body: &B) -> ClientResult<UserRecord> {
        let _loading = self.inner.loading.begin();
        self.state().error = None;

        let outcome = match self.post::<AuthPayload, B>(path, body).await {
            Ok(payload) if payload.token.trim().is_empty() => Err(ClientError::InvalidField {
                field: "token".to_string(),
                message: "server returned no token".to_string(),
            }),
            other => other,
        };

        match outcome {
            Ok(payload) => {
                let user = payload.user.clone();
                self.establish(payload);
                info!(user = %user.username, "signed in");
                Ok(user)
            }
            Err(err) => {
                warn!(path, error = %err, "authentication failed");
                self.state().error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn refresh_from(&self, stale: Option<&str>) -> bool {
        let _gate = self.inner.refresh_gate.lock().await;

        let Some(current) = self.token() else {
            debug!("no token to refresh");
            self.logout();
            return false;
        };
        if stale.is_some_and(|stale| stale != current) {
            debug!("token already refreshed by a concurrent request");
            return true;
        }

        let request = RefreshRequest { token: current };
        match self.post::<RefreshPayload, _>("/auth/refresh", &request).await {
            Ok(payload) if !payload.token.trim().is_empty() => {
                self.replace_token(payload.token);
                debug!("token refreshed");
                true
            }
            Ok(_) => {
                warn!("refresh returned no token; signing out");
                self.logout();
                false
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed; signing out");
                self.logout();
                false
            }
        }
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.http.post(url).json(body);
        let response = send_with_context(builder, path).await?;
        let response = ensure_success(path, response).await?;
        let envelope: Envelope<T> = decode_body(path, response).await?;
        Ok(envelope.data)
    }

    fn establish(&self, payload: AuthPayload) {
        self.persist(&payload);
        self.state().current = Some(payload);
        self.publish(SessionPhase::Authenticated, true);
    }

    fn replace_token(&self, token: String) {
        let updated = {
            let mut state = self.state();
            let Some(session) = state.current.as_mut() else {
                return;
            };
            session.token = token;
            session.clone()
        };
        self.persist(&updated);
    }

    fn persist(&self, payload: &AuthPayload) {
        match serde_json::to_string(payload) {
            Ok(raw) => persist_or_warn(self.inner.storage.as_ref(), SESSION_KEY, &raw),
            Err(err) => warn!(error = %err, "failed to encode session"),
        }
    }

    fn publish(&self, phase: SessionPhase, new_identity: bool) {
        self.inner.status.send_modify(|status| {
            status.phase = phase;
            if new_identity {
                status.epoch += 1;
            }
        });
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenSource for SessionStore {
    fn bearer(&self) -> Option<String> {
        self.token()
    }

    async fn refresh(&self, stale: Option<&str>) -> bool {
        self.refresh_from(stale).await
    }
}
