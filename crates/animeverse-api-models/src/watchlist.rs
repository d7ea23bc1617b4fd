//! Watchlist entries, aggregates, and mutation bodies.
//!
//! # Design
//! - Every mutation body carries the owning `profileId`; the backend checks it
//!   against the token's account.
//! - Optional fields are omitted rather than sent as `null` so partial updates
//!   leave server-side values untouched.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anime::Anime;
use crate::error::ModelError;

/// Viewing progress of a watchlist entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    /// Queued.
    #[default]
    PlanToWatch,
    /// In progress.
    Watching,
    /// Finished.
    Completed,
    /// Abandoned.
    Dropped,
}

impl WatchStatus {
    /// Every status in display order.
    pub const ALL: [Self; 4] = [
        Self::PlanToWatch,
        Self::Watching,
        Self::Completed,
        Self::Dropped,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlanToWatch => "plan_to_watch",
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
        }
    }
}

impl Display for WatchStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownValue {
                kind: "watch status",
                value: value.to_string(),
            })
    }
}

/// A profile's association with a catalog item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    /// Entry identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Populated catalog item.
    #[serde(alias = "animeId")]
    pub anime: Anime,
    /// Owning profile.
    #[serde(default)]
    pub profile_id: String,
    /// Viewing progress.
    #[serde(default)]
    pub status: WatchStatus,
    /// Favorite flag.
    #[serde(default)]
    pub is_favorite: bool,
    /// Creation time, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Server-computed aggregate for one profile's watchlist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistStats {
    /// Entry count.
    pub total: u64,
    /// Favorite count.
    pub favorites: u64,
    /// Entries currently being watched.
    pub watching: u64,
    /// Finished entries.
    pub completed: u64,
}

/// Optional entry fields shared by create and update bodies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryChanges {
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WatchStatus>,
    /// New favorite flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl EntryChanges {
    /// Whether no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.is_favorite.is_none()
    }
}

/// Body for `POST /watchlists`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlistEntry {
    /// Owning profile.
    pub profile_id: String,
    /// Catalog item to add.
    pub anime_id: String,
    /// Initial values.
    #[serde(flatten)]
    pub changes: EntryChanges,
}

/// Body for `PUT /watchlists/:id` and `DELETE /watchlists/:id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileScope {
    /// Owning profile.
    pub profile_id: String,
    /// Fields to change; empty for deletes.
    #[serde(flatten)]
    pub changes: EntryChanges,
}

/// Body for `PATCH /watchlists/:id/favorite`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    /// Owning profile.
    pub profile_id: String,
    /// Desired flag.
    pub is_favorite: bool,
}
