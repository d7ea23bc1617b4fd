//! Viewer profiles of the signed-in account and the active selection.
//!
//! # Design
//! - The list follows the session: it loads once per sign-in epoch and is
//!   cleared without a network call when nobody is signed in.
//! - The active profile id is persisted; after a load it is restored when the
//!   profile still exists and dropped from storage otherwise. Signing out
//!   drops it too.
//! - Mutations patch the local list from the server's answer instead of
//!   reloading, and keep the active profile in step.
//! - The active profile is published on a `watch` channel so dependents can
//!   react to switches.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use animeverse_api_models::{
    Profile, ProfileDraft, ProfileType, ProfileTypeChange, ProfileUpdate, RatingPolicy,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiClient, ApiRequest};
use crate::loading::LoadingFlag;
use crate::session::{SessionPhase, SessionStore};
use crate::storage::{ACTIVE_PROFILE_KEY, KeyValueStore, persist_or_warn, remove_or_warn};

/// Point-in-time view of the profile store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileSnapshot {
    /// Profiles of the signed-in account.
    pub profiles: Vec<Profile>,
    /// Selected profile.
    pub active: Option<Profile>,
    /// Whether an operation is in flight.
    pub loading: bool,
    /// Last error message.
    pub error: Option<String>,
}

#[derive(Default)]
struct ProfileState {
    profiles: Vec<Profile>,
    active: Option<Profile>,
    synced_epoch: Option<u64>,
    error: Option<String>,
}

/// Owns the profile list and the active profile.
#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<ProfileInner>,
}

struct ProfileInner {
    api: ApiClient,
    session: SessionStore,
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<ProfileState>,
    active: watch::Sender<Option<Profile>>,
    loading: LoadingFlag,
}

impl ProfileStore {
    /// Create an empty store bound to `session`.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, storage: Arc<dyn KeyValueStore>) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            inner: Arc::new(ProfileInner {
                api,
                session,
                storage,
                state: Mutex::new(ProfileState::default()),
                active,
                loading: LoadingFlag::new(),
            }),
        }
    }

    /// Bring the list in line with the session.
    ///
    /// Loads once per sign-in, clears when signed out, and does nothing while
    /// the session is still unknown.
    ///
    /// # Errors
    ///
    /// Propagates a failed load; the next call retries it.
    pub async fn sync_with_session(&self) -> ClientResult<()> {
        let status = self.inner.session.status();
        match status.phase {
            SessionPhase::Unknown => Ok(()),
            SessionPhase::Anonymous => {
                self.clear();
                Ok(())
            }
            SessionPhase::Authenticated => {
                if self.state().synced_epoch == Some(status.epoch) {
                    return Ok(());
                }
                self.load(status.epoch).await
            }
        }
    }

    /// Reload the list from the server regardless of prior loads.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure.
    pub async fn fetch_profiles(&self) -> ClientResult<()> {
        let epoch = self.inner.session.status().epoch;
        self.load(epoch).await
    }

    /// Make `profile_id` the active profile.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ProfileNotFound`] when the id is not in the list.
    pub fn select_profile(&self, profile_id: &str) -> ClientResult<Profile> {
        let found = self
            .state()
            .profiles
            .iter()
            .find(|profile| profile.id == profile_id)
            .cloned();
        let Some(profile) = found else {
            let err = ClientError::ProfileNotFound {
                id: profile_id.to_string(),
            };
            self.state().error = Some(err.to_string());
            return Err(err);
        };

        persist_or_warn(self.inner.storage.as_ref(), ACTIVE_PROFILE_KEY, &profile.id);
        {
            let mut state = self.state();
            state.active = Some(profile.clone());
            state.error = None;
        }
        info!(profile_id = %profile.id, name = %profile.name, "profile selected");
        self.publish();
        Ok(profile)
    }

    /// Fetch one profile without touching the list.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure.
    pub async fn get_profile(&self, profile_id: &str) -> ClientResult<Profile> {
        self.inner
            .api
            .data(&ApiRequest::get(format!("/profiles/{profile_id}")))
            .await
    }

    /// Create a profile and append it to the list.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure (including the server's profile limit).
    pub async fn create_profile(&self, draft: &ProfileDraft) -> ClientResult<Profile> {
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::post("/profiles").json(draft)?;
        let created: Profile = self.record(self.inner.api.data(&request).await)?;
        self.state().profiles.push(created.clone());
        debug!(profile_id = %created.id, "profile created");
        Ok(created)
    }

    /// Rename a profile or change its avatar.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure.
    pub async fn update_profile(&self, profile_id: &str, update: &ProfileUpdate) -> ClientResult<Profile> {
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::put(format!("/profiles/{profile_id}")).json(update)?;
        let updated: Profile = self.record(self.inner.api.data(&request).await)?;
        self.replace(profile_id, &updated);
        Ok(updated)
    }

    /// Delete a profile; deleting the active one clears the selection.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure.
    pub async fn delete_profile(&self, profile_id: &str) -> ClientResult<()> {
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::delete(format!("/profiles/{profile_id}"));
        self.record(self.inner.api.execute(&request).await)?;

        let was_active = {
            let mut state = self.state();
            state.profiles.retain(|profile| profile.id != profile_id);
            let was_active = state
                .active
                .as_ref()
                .is_some_and(|active| active.id == profile_id);
            if was_active {
                state.active = None;
            }
            was_active
        };
        if was_active {
            remove_or_warn(self.inner.storage.as_ref(), ACTIVE_PROFILE_KEY);
            self.publish();
        }
        debug!(profile_id, was_active, "profile deleted");
        Ok(())
    }

    /// Switch a profile between kid, teen, and adult.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure.
    pub async fn change_profile_type(
        &self,
        profile_id: &str,
        profile_type: ProfileType,
    ) -> ClientResult<Profile> {
        let _loading = self.inner.loading.begin();
        let request = ApiRequest::patch(format!("/profiles/{profile_id}/type"))
            .json(&ProfileTypeChange { profile_type })?;
        let updated: Profile = self.record(self.inner.api.data(&request).await)?;
        self.replace(profile_id, &updated);
        Ok(updated)
    }

    /// Profiles of the signed-in account.
    #[must_use]
    pub fn profiles(&self) -> Vec<Profile> {
        self.state().profiles.clone()
    }

    /// Selected profile.
    #[must_use]
    pub fn active_profile(&self) -> Option<Profile> {
        self.state().active.clone()
    }

    /// Catalog restriction implied by the selected profile.
    #[must_use]
    pub fn rating_policy(&self) -> RatingPolicy {
        RatingPolicy::for_profile(self.state().active.as_ref())
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
    pub fn snapshot(&self) -> ProfileSnapshot {
        let state = self.state();
        ProfileSnapshot {
            profiles: state.profiles.clone(),
            active: state.active.clone(),
            loading: self.inner.loading.is_loading(),
            error: state.error.clone(),
        }
    }

    /// Subscribe to active-profile changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Profile>> {
        self.inner.active.subscribe()
    }

    async fn load(&self, epoch: u64) -> ClientResult<()> {
        let _loading = self.inner.loading.begin();
        let profiles: Vec<Profile> = self.record(
            self.inner
                .api
                .data(&ApiRequest::get("/profiles"))
                .await,
        )?;

        let persisted = self.inner.storage.get(ACTIVE_PROFILE_KEY);
        let restored = persisted
            .as_deref()
            .and_then(|id| profiles.iter().find(|profile| profile.id == id).cloned());
        if persisted.is_some() && restored.is_none() {
            debug!("persisted profile no longer exists; clearing");
            remove_or_warn(self.inner.storage.as_ref(), ACTIVE_PROFILE_KEY);
        }

        debug!(count = profiles.len(), restored = restored.is_some(), "profiles loaded");
        {
            let mut state = self.state();
            state.profiles = profiles;
            state.active = restored;
            state.synced_epoch = Some(epoch);
            state.error = None;
        }
        self.publish();
        Ok(())
    }

    fn clear(&self) {
        if self.inner.storage.get(ACTIVE_PROFILE_KEY).is_some() {
            remove_or_warn(self.inner.storage.as_ref(), ACTIVE_PROFILE_KEY);
        }
        {
            let mut state = self.state();
            if state.synced_epoch.is_none() && state.profiles.is_empty() && state.active.is_none() {
                return;
            }
            state.profiles.clear();
            state.active = None;
            state.synced_epoch = None;
        }
        debug!("profiles cleared after sign-out");
        self.publish();
    }

    fn replace(&self, profile_id: &str, updated: &Profile) {
        let active_changed = {
            let mut state = self.state();
            for profile in &mut state.profiles {
                if profile.id == profile_id {
                    profile.clone_from(updated);
                }
            }
            match state.active.as_mut() {
                Some(active) if active.id == profile_id => {
                    active.clone_from(updated);
                    true
                }
                _ => false,
            }
        };
        if active_changed {
            self.publish();
        }
    }

    fn record<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        match result {
            Ok(value) => {
                self.state().error = None;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "profile operation failed");
                self.state().error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn publish(&self) {
        let current = self.state().active.clone();
        self.inner.active.send_if_modified(|published| {
            if *published == current {
                false
            } else {
                *published = current;
                true
            }
        });
    }

    fn state(&self) -> MutexGuard<'_, ProfileState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
