//! Composition root wiring the stores together.
//!
//! # Design
//! - Construction order is fixed: storage, session, transport, profiles, then
//!   the collection and watchlist stores, each receiving handles to what it
//!   depends on.
//! - [`Animeverse::sync`] reconciles dependents after the session or active
//!   profile changed. Every step is idempotent, so calling it after an
//!   explicit operation and from the background task never double-fetches.
//! - [`Animeverse::spawn_sync`] also covers changes triggered inside the
//!   transport, such as the sign-out after a failed token refresh.

use std::sync::Arc;

use animeverse_api_models::{LoginRequest, Profile, RegisterRequest, UserRecord};
use animeverse_config::ClientConfig;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::collection::CollectionStore;
use crate::error::ClientResult;
use crate::http::{ApiClient, build_http_client};
use crate::profiles::ProfileStore;
use crate::session::SessionStore;
use crate::storage::{FileStorage, KeyValueStore, MemoryStorage};
use crate::watchlist::WatchlistStore;

/// All client stores, constructed in dependency order.
#[derive(Clone)]
pub struct Animeverse {
    storage: Arc<dyn KeyValueStore>,
    session: SessionStore,
    api: ApiClient,
    profiles: ProfileStore,
    collection: CollectionStore,
    watchlist: WatchlistStore,
}

impl Animeverse {
    /// Build the stores from configuration, persisting to the configured
    /// state file or to memory when none is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the state file cannot be read or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let storage: Arc<dyn KeyValueStore> = match &config.state_file {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };
        let http = build_http_client(config)?;
        Ok(Self::with_parts(http, &config.api_url, storage))
    }

    /// Build the stores around an existing HTTP client and storage backend.
    ///
    /// The persisted session is rehydrated before this returns.
    #[must_use]
    pub fn with_parts(http: Client, base_url: &str, storage: Arc<dyn KeyValueStore>) -> Self {
        let session = SessionStore::new(http.clone(), base_url, Arc::clone(&storage));
        session.rehydrate();
        let api = ApiClient::new(http, base_url, Arc::new(session.clone()), Arc::clone(&storage));
        let profiles = ProfileStore::new(api.clone(), session.clone(), Arc::clone(&storage));
        let collection = CollectionStore::new(api.clone(), session.clone(), profiles.clone());
        let watchlist = WatchlistStore::new(api.clone(), profiles.clone());
        Self {
            storage,
            session,
            api,
            profiles,
            collection,
            watchlist,
        }
    }

    /// Session store.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Authenticated transport.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Profile store.
    #[must_use]
    pub const fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Collection store.
    #[must_use]
    pub const fn collection(&self) -> &CollectionStore {
        &self.collection
    }

    /// Watchlist store.
    #[must_use]
    pub const fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    /// Storage backend shared by the stores.
    #[must_use]
    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.storage)
    }

    /// Reconcile profiles with the session, then the collection and watchlist
    /// with the active profile. Failures are recorded on the stores and logged.
    pub async fn sync(&self) {
        if let Err(err) = self.profiles.sync_with_session().await {
            warn!(error = %err, "profile sync failed");
        }
        if let Err(err) = self.collection.sync_with_profile().await {
            warn!(error = %err, "collection sync failed");
        }
        if let Err(err) = self.watchlist.sync_with_profile().await {
            warn!(error = %err, "watchlist sync failed");
        }
    }

    /// Sign in and load the account's profiles.
    ///
    /// # Errors
    ///
    /// Propagates the login failure.
    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<UserRecord> {
        let user = self.session.login(credentials).await?;
        self.sync().await;
        Ok(user)
    }

    /// Register, sign in, and load the account's profiles.
    ///
    /// # Errors
    ///
    /// Propagates the registration failure.
    pub async fn register(&self, account: &RegisterRequest) -> ClientResult<UserRecord> {
        let user = self.session.register(account).await?;
        self.sync().await;
        Ok(user)
    }

    /// Sign out and clear every dependent store.
    pub async fn logout(&self) {
        self.session.logout();
        self.sync().await;
    }

    /// Select a profile and load the data that depends on it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ProfileNotFound`](crate::ClientError::ProfileNotFound)
    /// for unknown ids.
    pub async fn select_profile(&self, profile_id: &str) -> ClientResult<Profile> {
        let profile = self.profiles.select_profile(profile_id)?;
        self.sync().await;
        Ok(profile)
    }

    /// Run [`sync`](Self::sync) in the background whenever the session or
    /// the active profile changes. The task runs until the handle is aborted.
    #[must_use]
    pub fn spawn_sync(&self) -> JoinHandle<()> {
        let app = self.clone();
        let mut session_changes = self.session.subscribe();
        let mut profile_changes = self.profiles.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = session_changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = profile_changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                debug!("state changed; reconciling stores");
                app.sync().await;
            }
        })
    }
}
