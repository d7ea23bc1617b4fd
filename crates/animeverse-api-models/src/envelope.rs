//! Response envelopes shared by every endpoint.

use serde::{Deserialize, Serialize};

/// Successful response body: `{ "data": ..., "pagination"?: ... }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Payload.
    pub data: T,
    /// Present on paginated listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Pagination block attached to list responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total matching items.
    #[serde(default)]
    pub total: u64,
    /// Current one-based page.
    #[serde(default = "first_page")]
    pub page: u32,
    /// Number of pages available.
    #[serde(default)]
    pub total_pages: u32,
}

const fn first_page() -> u32 {
    1
}

/// Error body; servers are not required to send one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    #[serde(default)]
    pub message: Option<String>,
}
