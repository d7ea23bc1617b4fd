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

//! Client-side session and data synchronisation for the Animeverse API.
//!
//! Stores are built leaf-first and receive their dependencies as handles:
//! storage, then [`SessionStore`], then [`ApiClient`], then [`ProfileStore`],
//! then [`CollectionStore`] and [`WatchlistStore`]. [`Animeverse`] wires them
//! together and reconciles dependents whenever the session or the active
//! profile changes.
//!
//! Layout: `storage.rs` (durable key/value persistence), `loading.rs` (scoped
//! loading flags), `http.rs` (authenticated transport with the single
//! refresh-and-retry), `session.rs`, `profiles.rs`, `collection.rs`,
//! `watchlist.rs` (stores), `app.rs` (composition root).

pub mod app;
pub mod collection;
pub mod error;
pub mod http;
pub mod loading;
pub mod profiles;
pub mod session;
pub mod storage;
pub mod watchlist;

pub use app::Animeverse;
pub use collection::{CollectionSnapshot, CollectionStore};
pub use error::{ClientError, ClientResult};
pub use http::{ApiClient, ApiRequest, HEADER_PROFILE_ID, HEADER_REQUEST_ID, TokenSource};
pub use loading::{LoadingFlag, LoadingGuard};
pub use profiles::{ProfileSnapshot, ProfileStore};
pub use session::{SessionPhase, SessionStatus, SessionStore};
pub use storage::{
    ACTIVE_PROFILE_KEY, FileStorage, KeyValueStore, MemoryStorage, SESSION_KEY, StorageError,
};
pub use watchlist::{WatchlistSnapshot, WatchlistStore};
