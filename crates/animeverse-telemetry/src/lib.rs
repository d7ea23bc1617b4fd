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
//! Telemetry primitives shared across the Animeverse workspace.
//!
//! Centralises tracing-subscriber installation and the per-invocation request
//! context so the client core and the CLI log with one consistent shape.

pub mod context;
pub mod error;
pub mod init;

pub use context::{current_command, current_request_id, new_request_id, with_request_context};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
