//! Command handlers grouped by the store they drive. Each returns the text
//! to print.

pub(crate) mod anime;
pub(crate) mod auth;
pub(crate) mod profiles;
pub(crate) mod watchlist;
