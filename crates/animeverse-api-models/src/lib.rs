#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused)]
#![allow(clippy::module_name_repetitions)]
//! Shared HTTP DTOs for the Animeverse REST API.
//!
//! The client stores and the CLI both encode requests and decode responses
//! through these types so the wire contract lives in one place. Identifiers
//! arrive Mongo-style (`_id`); `id` is accepted as an alias everywhere.
//!
//! Layout: `auth.rs` (users, credentials), `profile.rs` (viewer profiles),
//! `rating.rs` (content ratings + parental policy), `anime.rs` (catalog
//! items), `query.rs` (collection query + partial patches), `watchlist.rs`
//! (entries, stats, mutation bodies), `envelope.rs` (response envelopes).

pub mod anime;
pub mod auth;
pub mod envelope;
pub mod error;
pub mod profile;
pub mod query;
pub mod rating;
pub mod watchlist;

mod de;

pub use anime::{Anime, AnimeDraft, AnimeStatus, ExternalAnime, ImportRequest};
pub use auth::{AuthPayload, LoginRequest, RefreshPayload, RefreshRequest, RegisterRequest, UserRecord};
pub use envelope::{Envelope, ErrorBody, Pagination};
pub use error::{ModelError, ModelResult};
pub use profile::{MAX_PROFILES, Profile, ProfileDraft, ProfileType, ProfileTypeChange, ProfileUpdate};
pub use query::{CollectionQuery, QueryPatch, RandomOptions, SortField, SortOrder};
pub use rating::{ContentRating, RatingPolicy, format_ratings, parse_ratings};
pub use watchlist::{
    EntryChanges, FavoriteToggle, NewWatchlistEntry, ProfileScope, WatchStatus, WatchlistEntry,
    WatchlistStats,
};
