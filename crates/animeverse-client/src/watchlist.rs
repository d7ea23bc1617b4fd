//! The active profile's watchlist, favorites, and server-computed stats.
//!
//! # Design
//! - All three collections belong to one profile and are replaced together.
//! - Mutations never predict the result: each performs one remote call and
//!   then re-reads the three collections from the server.
//! - A failed re-read is recorded and logged, but the mutation that already
//!   succeeded on the server still reports success.
//! - Membership checks are advisory and never fail.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use animeverse_api_models::{
    EntryChanges, FavoriteToggle, NewWatchlistEntry, ProfileScope, WatchlistEntry, WatchlistStats,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiClient, ApiRequest, decode_body};
use crate::loading::LoadingFlag;
use crate::profiles::ProfileStore;

const PAGE_QUERY: [(&str, &str); 2] = [("page", "1"), ("limit", "20")];

/// Point-in-time view of the watchlist store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WatchlistSnapshot {
    /// Entries of the active profile.
    pub entries: Vec<WatchlistEntry>,
    /// Favorite entries of the active profile.
    pub favorites: Vec<WatchlistEntry>,
    /// Aggregate counters, once loaded.
    pub stats: Option<WatchlistStats>,
    /// Whether an operation is in flight.
    pub loading: bool,
    /// Last error message.
    pub error: Option<String>,
}

#[derive(Default)]
struct WatchlistState {
    entries: Vec<WatchlistEntry>,
    favorites: Vec<WatchlistEntry>,
    stats: Option<WatchlistStats>,
    profile_id: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatsBody {
    Wrapped { data: WatchlistStats },
    Bare(WatchlistStats),
}

impl StatsBody {
    const fn into_stats(self) -> WatchlistStats {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Owns the watchlist views of the active profile.
#[derive(Clone)]
pub struct WatchlistStore {
    inner: Arc<WatchlistInner>,
}

struct WatchlistInner {
    api: ApiClient,
    profiles: ProfileStore,
    state: Mutex<WatchlistState>,
    loading: LoadingFlag,
}

impl WatchlistStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(api: ApiClient, profiles: ProfileStore) -> Self {
        Self {
            inner: Arc::new(WatchlistInner {
                api,
                profiles,
                state: Mutex::new(WatchlistState::default()),
                loading: LoadingFlag::new(),
            }),
        }
    }

    /// Load the three collections when the active profile changed; clear them
    /// without a request when no profile is active.
    ///
    /// # Errors
    ///
    /// Propagates the first failed fetch; the next call retries.
    pub async fn sync_with_profile(&self) -> ClientResult<()> {
        let Some(profile_id) = self.active_profile_id() else {
            self.clear();
            return Ok(());
        };
        if self.state().profile_id.as_deref() == Some(profile_id.as_str()) {
            return Ok(());
        }
        let _loading = self.inner.loading.begin();
        self.load(&profile_id).await
    }

    /// Re-read watchlist, favorites, and stats for the active profile.
    ///
    /// # Errors
    ///
    /// Propagates the first failed fetch.
    pub async fn refresh_watchlist(&self) -> ClientResult<()> {
        let Some(profile_id) = self.active_profile_id() else {
            return Ok(());
        };
        self.load(&profile_id).await
    }

    /// Add a catalog item to the active profile's watchlist.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveProfile`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn add_to_watchlist(&self, anime_id: &str, options: EntryChanges) -> ClientResult<()> {
        let _loading = self.inner.loading.begin();
        let profile_id = self.require_profile()?;
        let request = ApiRequest::post("/watchlists").json(&NewWatchlistEntry {
            profile_id: profile_id.clone(),
            anime_id: anime_id.to_string(),
            changes: options,
        })?;
        self.mutate(&profile_id, &request).await
    }

    /// Change status and/or favorite flag of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveProfile`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn update_watchlist_entry(&self, entry_id: &str, changes: EntryChanges) -> ClientResult<()> {
        let _loading = self.inner.loading.begin();
        let profile_id = self.require_profile()?;
        let request = ApiRequest::put(format!("/watchlists/{entry_id}")).json(&ProfileScope {
            profile_id: profile_id.clone(),
            changes,
        })?;
        self.mutate(&profile_id, &request).await
    }

    /// Remove an entry by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveProfile`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn remove_from_watchlist(&self, entry_id: &str) -> ClientResult<()> {
        let _loading = self.inner.loading.begin();
        let profile_id = self.require_profile()?;
        let request = ApiRequest::delete(format!("/watchlists/{entry_id}")).json(&ProfileScope {
            profile_id: profile_id.clone(),
            changes: EntryChanges::default(),
        })?;
        self.mutate(&profile_id, &request).await
    }

    /// Remove whichever entry refers to `anime_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveProfile`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn remove_anime_from_watchlist(&self, anime_id: &str) -> ClientResult<()> {
        let _loading = self.inner.loading.begin();
        let profile_id = self.require_profile()?;
        let request = ApiRequest::delete(format!("/watchlists/{profile_id}/anime/{anime_id}"));
        self.mutate(&profile_id, &request).await
    }

    /// Set or clear the favorite flag of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveProfile`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn toggle_favorite(&self, entry_id: &str, is_favorite: bool) -> ClientResult<()> {
        let _loading = self.inner.loading.begin();
        let profile_id = self.require_profile()?;
        let request = ApiRequest::patch(format!("/watchlists/{entry_id}/favorite")).json(
            &FavoriteToggle {
                profile_id: profile_id.clone(),
                is_favorite,
            },
        )?;
        self.mutate(&profile_id, &request).await
    }

    /// Whether `anime_id` is on the active profile's watchlist.
    ///
    /// A 404, a missing profile, or any other failure reads as `false`.
    pub async fn is_in_watchlist(&self, anime_id: &str) -> bool {
        let Some(profile_id) = self.active_profile_id() else {
            return false;
        };
        let path = format!("/watchlists/{profile_id}/anime/{anime_id}");
        let body: ClientResult<Value> = match self.inner.api.send(&ApiRequest::get(path.as_str())).await {
            Ok(response) => decode_body(&path, response).await,
            Err(err) => Err(err),
        };
        match body {
            Ok(value) => membership(value.get("data").unwrap_or(&value)),
            Err(err) if err.is_not_found() => false,
            Err(err) => {
                debug!(anime_id, error = %err, "membership check failed");
                false
            }
        }
    }

    /// Entries of the active profile.
    #[must_use]
    pub fn entries(&self) -> Vec<WatchlistEntry> {
        self.state().entries.clone()
    }

    /// Favorite entries of the active profile.
    #[must_use]
    pub fn favorites(&self) -> Vec<WatchlistEntry> {
        self.state().favorites.clone()
    }

    /// Aggregate counters, once loaded.
    #[must_use]
    pub fn stats(&self) -> Option<WatchlistStats> {
        self.state().stats
    }

    /// Whether an operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.is_loading()
    }

    /// Last error message.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WatchlistSnapshot {
        let state = self.state();
        WatchlistSnapshot {
            entries: state.entries.clone(),
            favorites: state.favorites.clone(),
            stats: state.stats,
            loading: self.inner.loading.is_loading(),
            error: state.error.clone(),
        }
    }

    async fn mutate(&self, profile_id: &str, request: &ApiRequest) -> ClientResult<()> {
        if let Err(err) = self.inner.api.execute(request).await {
            warn!(path = %request.path(), error = %err, "watchlist change rejected");
            self.state().error = Some(err.to_string());
            return Err(err);
        }
        debug!(path = %request.path(), profile_id, "watchlist changed; refreshing");
        if let Err(err) = self.load(profile_id).await {
            warn!(profile_id, error = %err, "watchlist refresh after change failed");
        }
        Ok(())
    }

    async fn load(&self, profile_id: &str) -> ClientResult<()> {
        let api = &self.inner.api;
        let entries_request = ApiRequest::get(format!("/watchlists/{profile_id}")).query(PAGE_QUERY);
        let favorites_request =
            ApiRequest::get(format!("/watchlists/profile/{profile_id}/favorites")).query(PAGE_QUERY);
        let stats_path = format!("/watchlists/{profile_id}/stats");
        let stats_request = ApiRequest::get(stats_path.as_str());

        let (entries, favorites, stats) = tokio::join!(
            api.data::<Option<Vec<WatchlistEntry>>>(&entries_request),
            api.data::<Option<Vec<WatchlistEntry>>>(&favorites_request),
            async {
                match api.send(&stats_request).await {
                    Ok(response) => decode_body::<StatsBody>(&stats_path, response)
                        .await
                        .map(StatsBody::into_stats),
                    Err(err) => Err(err),
                }
            },
        );

        let mut state = self.state();
        if self
            .inner
            .profiles
            .active_profile()
            .is_none_or(|active| active.id != profile_id)
        {
            debug!(profile_id, "profile changed during refresh; discarding");
            return Ok(());
        }

        let mut first_error: Option<ClientError> = None;
        match entries {
            Ok(entries) => state.entries = entries.unwrap_or_default(),
            Err(err) => first_error = first_error.or(Some(err)),
        }
        match favorites {
            Ok(favorites) => state.favorites = favorites.unwrap_or_default(),
            Err(err) => first_error = first_error.or(Some(err)),
        }
        match stats {
            Ok(stats) => state.stats = Some(stats),
            Err(err) => first_error = first_error.or(Some(err)),
        }

        if let Some(err) = first_error {
            state.error = Some(err.to_string());
            return Err(err);
        }
        state.profile_id = Some(profile_id.to_string());
        state.error = None;
        debug!(
            profile_id,
            entries = state.entries.len(),
            favorites = state.favorites.len(),
            "watchlist loaded"
        );
        Ok(())
    }

    fn clear(&self) {
        let mut state = self.state();
        if state.profile_id.is_none() && state.entries.is_empty() && state.stats.is_none() {
            return;
        }
        state.entries.clear();
        state.favorites.clear();
        state.stats = None;
        state.profile_id = None;
        debug!("watchlist cleared; no active profile");
    }

    fn require_profile(&self) -> ClientResult<String> {
        self.active_profile_id().ok_or_else(|| {
            let err = ClientError::NoActiveProfile;
            self.state().error = Some(err.to_string());
            err
        })
    }

    fn active_profile_id(&self) -> Option<String> {
        self.inner.profiles.active_profile().map(|profile| profile.id)
    }

    fn state(&self) -> MutexGuard<'_, WatchlistState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn membership(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) => true,
        Value::Object(map) => map.get("inWatchlist").is_none_or(membership),
    }
}
