//! Paginated catalog listing, search, and administration.
//!
//! # Design
//! - The store keeps one canonical [`CollectionQuery`]; callers send partial
//!   [`QueryPatch`]es that are merged over it.
//! - The active profile's [`RatingPolicy`] is forced onto every listing,
//!   search, and random draw; a policy change resets to page 1 and refetches.
//! - A single-slot memo remembers the last successful endpoint and effective
//!   query; an identical request is skipped only while no other fetch is in
//!   flight.
//! - Each fetch is stamped with a generation; responses that are no longer
//!   the newest are discarded instead of overwriting fresher results.
//! - The published query only moves when a load succeeds. Patches merge over
//!   the newest requested query, which falls back to the published one after
//!   a failure.
//! - Catalog mutations are limited to administrators and checked locally
//!   before any request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use animeverse_api_models::{
    Anime, AnimeDraft, CollectionQuery, ExternalAnime, ImportRequest, Pagination, QueryPatch,
    RandomOptions, RatingPolicy,
};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiClient, ApiRequest};
use crate::loading::LoadingFlag;
use crate::profiles::ProfileStore;
use crate::session::SessionStore;

/// Point-in-time view of the collection store.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionSnapshot {
    /// Items on the current page.
    pub animes: Vec<Anime>,
    /// Total matching items.
    pub total: u64,
    /// Current page.
    pub page: u32,
    /// Pages available.
    pub total_pages: u32,
    /// Canonical query (before the rating policy is applied).
    pub query: CollectionQuery,
    /// Whether an operation is in flight.
    pub loading: bool,
    /// Last error message.
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endpoint {
    List,
    Search,
}

impl Endpoint {
    fn request(self, query: &CollectionQuery) -> ApiRequest {
        match self {
            Self::List => ApiRequest::get("/animes").query(query.to_pairs()),
            Self::Search => ApiRequest::get("/animes/search").query(query.to_search_pairs()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LastLoad {
    endpoint: Endpoint,
    effective: CollectionQuery,
}

/// Query, endpoint, and policy a listing was requested with.
#[derive(Clone, Debug)]
struct Intent {
    query: CollectionQuery,
    endpoint: Endpoint,
    policy: RatingPolicy,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            query: CollectionQuery::default(),
            endpoint: Endpoint::List,
            policy: RatingPolicy::Unrestricted,
        }
    }
}

/// Active profile id and policy the listing was last aligned with.
type SyncTarget = (Option<String>, RatingPolicy);

struct CollectionState {
    animes: Vec<Anime>,
    pagination: Pagination,
    committed: Intent,
    requested: Intent,
    last: Option<LastLoad>,
    synced: Option<SyncTarget>,
    generation: u64,
    settled: u64,
    error: Option<String>,
}

impl Default for CollectionState {
    fn default() -> Self {
        Self {
            animes: Vec::new(),
            pagination: Pagination {
                total: 0,
                page: 1,
                total_pages: 0,
            },
            committed: Intent::default(),
            requested: Intent::default(),
            last: None,
            synced: None,
            generation: 0,
            settled: 0,
            error: None,
        }
    }
}

/// Owns the catalog page shown to the user.
#[derive(Clone)]
pub struct CollectionStore {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    api: ApiClient,
    session: SessionStore,
    profiles: ProfileStore,
    state: Mutex<CollectionState>,
    loading: LoadingFlag,
}

enum Plan {
    Skip,
    Fetch {
        intent: Intent,
        effective: CollectionQuery,
        generation: u64,
    },
}

impl CollectionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, profiles: ProfileStore) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                api,
                session,
                profiles,
                state: Mutex::new(CollectionState::default()),
                loading: LoadingFlag::new(),
            }),
        }
    }

    /// Merge `patch` over the current query and load the matching page.
    ///
    /// Skipped when the effective query equals the last successful one.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure; current items are kept.
    pub async fn fetch_animes(&self, patch: &QueryPatch) -> ClientResult<()> {
        let plan = self.plan(Endpoint::List, patch, false);
        self.run(plan).await
    }

    /// Search the catalog for `term`, starting from page 1.
    ///
    /// A blank term clears the search and lists the catalog instead.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure; current items are kept.
    pub async fn search_animes(&self, term: &str, patch: &QueryPatch) -> ClientResult<()> {
        let term = term.trim();
        let endpoint = if term.is_empty() {
            Endpoint::List
        } else {
            Endpoint::Search
        };
        let patch = QueryPatch {
            page: Some(1),
            search: Some(Some(term.to_string()).filter(|term| !term.is_empty())),
            ..patch.clone()
        };
        let plan = self.plan(endpoint, &patch, false);
        self.run(plan).await
    }

    /// Reload page 1 when the active profile or its rating policy changed.
    ///
    /// Losing the active profile lifts the restriction: the first page is
    /// reloaded unrestricted while signed in, and the listing is cleared once
    /// signed out. Nothing happens before a profile was ever active.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure; the next call retries.
    pub async fn sync_with_profile(&self) -> ClientResult<()> {
        if !self.inner.session.is_authenticated() {
            if self.state().synced.is_some() {
                self.clear();
            }
            return Ok(());
        }

        let active = self.inner.profiles.active_profile();
        let target: SyncTarget = (
            active.as_ref().map(|profile| profile.id.clone()),
            RatingPolicy::for_profile(active.as_ref()),
        );
        let endpoint = {
            let state = self.state();
            let unchanged = match &state.synced {
                Some(synced) => *synced == target,
                None => target.0.is_none(),
            };
            if unchanged {
                return Ok(());
            }
            state.requested.endpoint
        };

        debug!(profile_id = ?target.0, policy = ?target.1, "active profile changed; loading first page");
        let plan = self.plan(endpoint, &QueryPatch::new().page(1), false);
        self.run(plan).await?;
        self.state().synced = Some(target);
        Ok(())
    }

    /// Fetch one catalog item.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure.
    pub async fn get_anime(&self, anime_id: &str) -> ClientResult<Anime> {
        let _loading = self.inner.loading.begin();
        let result = self
            .inner
            .api
            .data(&ApiRequest::get(format!("/animes/{anime_id}")))
            .await;
        self.record(result)
    }

    /// Create a catalog item and reload the current page.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AdminRequired`] or a validation error before any
    /// request, otherwise propagates the remote failure.
    pub async fn create_anime(&self, draft: &AnimeDraft) -> ClientResult<Anime> {
        self.require_admin()?;
        draft.validate()?;
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::post("/animes").json(draft)?;
        let created: Anime = self.record(self.inner.api.data(&request).await)?;
        info!(anime_id = %created.id, title = %created.title, "anime created");
        self.reload_current().await;
        Ok(created)
    }

    /// Replace a catalog item and patch it in the current page.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AdminRequired`] or a validation error before any
    /// request, otherwise propagates the remote failure.
    pub async fn update_anime(&self, anime_id: &str, draft: &AnimeDraft) -> ClientResult<Anime> {
        self.require_admin()?;
        draft.validate()?;
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::put(format!("/animes/{anime_id}")).json(draft)?;
        let updated: Anime = self.record(self.inner.api.data(&request).await)?;
        {
            let mut state = self.state();
            for anime in &mut state.animes {
                if anime.id == anime_id {
                    anime.clone_from(&updated);
                }
            }
        }
        Ok(updated)
    }

    /// Delete a catalog item and drop it from the current page.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AdminRequired`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn delete_anime(&self, anime_id: &str) -> ClientResult<()> {
        self.require_admin()?;
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::delete(format!("/animes/{anime_id}"));
        self.record(self.inner.api.execute(&request).await)?;
        let mut state = self.state();
        state.animes.retain(|anime| anime.id != anime_id);
        state.pagination.total = state.pagination.total.saturating_sub(1);
        Ok(())
    }

    /// Random picks honouring the active profile's policy; `[]` on failure.
    pub async fn get_random_animes(&self, options: &RandomOptions) -> Vec<Anime> {
        let effective = options.with_policy(&self.inner.profiles.rating_policy());
        let request = ApiRequest::get("/animes/random").query(effective.to_pairs());
        self.inner
            .api
            .data(&request)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "random recommendations unavailable");
                Vec::new()
            })
    }

    /// Genre labels known to the catalog; `[]` on failure.
    pub async fn get_genres(&self) -> Vec<String> {
        self.inner
            .api
            .data(&ApiRequest::get("/animes/genres"))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "genre list unavailable");
                Vec::new()
            })
    }

    /// Look up titles in the external catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AdminRequired`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn search_external_api(&self, title: &str) -> ClientResult<Vec<ExternalAnime>> {
        self.require_admin()?;
        let request = ApiRequest::get("/animes/external/search").query([("title", title)]);
        self.inner.api.data(&request).await
    }

    /// Import an external title and reload the current page.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AdminRequired`] before any request, otherwise
    /// propagates the remote failure.
    pub async fn import_from_external_api(&self, external_id: &str) -> ClientResult<Anime> {
        self.require_admin()?;
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::post("/animes/external/import").json(&ImportRequest {
            external_id: external_id.to_string(),
        })?;
        let imported: Anime = self.record(self.inner.api.data(&request).await)?;
        info!(anime_id = %imported.id, external_id, "anime imported");
        self.reload_current().await;
        Ok(imported)
    }

    /// Items on the current page.
    #[must_use]
    pub fn animes(&self) -> Vec<Anime> {
        self.state().animes.clone()
    }

    /// Query of the page currently shown.
    #[must_use]
    pub fn query(&self) -> CollectionQuery {
        self.state().committed.query.clone()
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
    pub fn snapshot(&self) -> CollectionSnapshot {
        let state = self.state();
        CollectionSnapshot {
            animes: state.animes.clone(),
            total: state.pagination.total,
            page: state.pagination.page,
            total_pages: state.pagination.total_pages,
            query: state.committed.query.clone(),
            loading: self.inner.loading.is_loading(),
            error: state.error.clone(),
        }
    }

    fn plan(&self, endpoint: Endpoint, patch: &QueryPatch, force: bool) -> Plan {
        let policy = self.inner.profiles.rating_policy();
        let mut state = self.state();
        let mut next = state.requested.query.merged(patch);
        if state.last.is_some() && state.requested.policy != policy {
            next.page = 1;
        }
        let effective = next.with_policy(&policy);
        let candidate = LastLoad {
            endpoint,
            effective: effective.clone(),
        };
        let idle = state.settled == state.generation;
        if !force && idle && state.last.as_ref() == Some(&candidate) {
            debug!("query unchanged since last load; skipping");
            return Plan::Skip;
        }

        let intent = Intent {
            query: next,
            endpoint,
            policy,
        };
        state.requested = intent.clone();
        state.generation += 1;
        Plan::Fetch {
            intent,
            effective,
            generation: state.generation,
        }
    }

    async fn run(&self, plan: Plan) -> ClientResult<()> {
        let Plan::Fetch {
            intent,
            effective,
            generation,
        } = plan
        else {
            return Ok(());
        };

        let _loading = self.inner.loading.begin();
        let result = self
            .inner
            .api
            .fetch::<Vec<Anime>>(&intent.endpoint.request(&effective))
            .await;

        let mut state = self.state();
        if state.generation != generation {
            debug!(generation, latest = state.generation, "discarding superseded response");
            return result.map(drop);
        }
        state.settled = generation;
        match result {
            Ok(envelope) => {
                let count = envelope.data.len();
                state.pagination = envelope.pagination.unwrap_or(Pagination {
                    total: u64::try_from(count).unwrap_or(u64::MAX),
                    page: effective.page,
                    total_pages: u32::from(count > 0),
                });
                state.animes = envelope.data;
                state.last = Some(LastLoad {
                    endpoint: intent.endpoint,
                    effective,
                });
                state.committed = intent;
                state.error = None;
                debug!(count, total = state.pagination.total, "collection loaded");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "collection load failed");
                state.requested = state.committed.clone();
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn clear(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = CollectionState {
            generation,
            settled: generation,
            ..CollectionState::default()
        };
        debug!("collection cleared after sign-out");
    }

    async fn reload_current(&self) {
        let endpoint = self.state().requested.endpoint;
        let plan = self.plan(endpoint, &QueryPatch::new(), true);
        if let Err(err) = self.run(plan).await {
            warn!(error = %err, "reload after catalog change failed");
        }
    }

    fn require_admin(&self) -> ClientResult<()> {
        if self.inner.session.is_admin() {
            Ok(())
        } else {
            let err = ClientError::AdminRequired;
            self.state().error = Some(err.to_string());
            Err(err)
        }
    }

    fn record<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(error = %err, "catalog operation failed");
                self.state().error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, CollectionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
