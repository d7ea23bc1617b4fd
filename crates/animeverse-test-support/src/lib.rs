#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (JSON payloads shaped like the REST API's responses).

pub mod fixtures;
