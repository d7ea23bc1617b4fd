#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused)]

//! Client configuration resolved from the process environment.
//!
//! Layout: `defaults.rs` (variable names and fallbacks), `model.rs`
//! (`ClientConfig`), `validate.rs` (field parsers), `loader.rs` (environment
//! lookup and assembly).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{
    DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ENV_API_URL, ENV_LOG, ENV_LOG_FORMAT, ENV_STATE_FILE,
    ENV_TIMEOUT_SECS, MAX_TIMEOUT_SECS,
};
pub use error::{ConfigError, ConfigResult};
pub use model::ClientConfig;
