//! Collection query state and partial updates.
//!
//! # Design
//! - [`CollectionQuery`] is the full, canonical filter state; equality is by
//!   value so the client can skip redundant fetches.
//! - [`QueryPatch`] carries only the fields a caller wants to change; omitted
//!   fields keep their previous value rather than falling back to defaults.
//! - Blank strings clear a filter, matching how form inputs are submitted.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::anime::AnimeStatus;
use crate::error::ModelError;
use crate::rating::{ContentRating, RatingPolicy, format_ratings};

/// Default page size used by the backend.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Default number of random recommendations.
pub const DEFAULT_RANDOM_COUNT: u32 = 5;

/// Sort key for catalog listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// By score.
    #[default]
    Rating,
    /// Alphabetically by title.
    Title,
    /// By release year.
    Year,
}

impl SortField {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Title => "title",
            Self::Year => "year",
        }
    }
}

impl FromStr for SortField {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rating" => Ok(Self::Rating),
            "title" => Ok(Self::Title),
            "year" => Ok(Self::Year),
            _ => Err(ModelError::UnknownValue {
                kind: "sort field",
                value: value.to_string(),
            }),
        }
    }
}

impl Display for SortField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortOrder {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ModelError::UnknownValue {
                kind: "sort order",
                value: value.to_string(),
            }),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Canonical filter/sort/pagination state for catalog fetches.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionQuery {
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Genre filter.
    pub genre: Option<String>,
    /// Status filter.
    pub status: Option<AnimeStatus>,
    /// Allowed ratings.
    pub content_rating: Option<Vec<ContentRating>>,
    /// Free-text search.
    pub search: Option<String>,
    /// Sort key.
    pub sort: SortField,
    /// Sort direction.
    pub order: SortOrder,
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            genre: None,
            status: None,
            content_rating: None,
            search: None,
            sort: SortField::Rating,
            order: SortOrder::Desc,
        }
    }
}

impl CollectionQuery {
    /// Apply `patch` over this query; untouched fields keep their value.
    #[must_use]
    pub fn merged(&self, patch: &QueryPatch) -> Self {
        let mut next = self.clone();
        if let Some(page) = patch.page {
            next.page = page.max(1);
        }
        if let Some(limit) = patch.limit {
            next.limit = limit.max(1);
        }
        if let Some(genre) = &patch.genre {
            next.genre.clone_from(genre);
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(ratings) = &patch.content_rating {
            next.content_rating.clone_from(ratings);
        }
        if let Some(search) = &patch.search {
            next.search.clone_from(search);
        }
        if let Some(sort) = patch.sort {
            next.sort = sort;
        }
        if let Some(order) = patch.order {
            next.order = order;
        }
        next
    }

    /// The query actually sent: the profile policy replaces any caller rating filter.
    #[must_use]
    pub fn with_policy(&self, policy: &RatingPolicy) -> Self {
        let mut effective = self.clone();
        if let Some(ratings) = policy.ratings() {
            effective.content_rating = Some(ratings.to_vec());
        }
        effective
    }

    /// Query-string pairs for `GET /animes`.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sort", self.sort.as_str().to_string()),
            ("order", self.order.as_str().to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        self.push_filters(&mut pairs);
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }

    /// Query-string pairs for `GET /animes/search`: the term travels as `q`
    /// and only the rating filter accompanies pagination.
    #[must_use]
    pub fn to_search_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.search.clone().unwrap_or_default()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(ratings) = self.content_rating.as_deref().filter(|r| !r.is_empty()) {
            pairs.push(("contentRating", format_ratings(ratings)));
        }
        pairs
    }

    fn push_filters(&self, pairs: &mut Vec<(&'static str, String)>) {
        if let Some(genre) = &self.genre {
            pairs.push(("genre", genre.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(ratings) = self.content_rating.as_deref().filter(|r| !r.is_empty()) {
            pairs.push(("contentRating", format_ratings(ratings)));
        }
    }
}

/// Partial update of a [`CollectionQuery`].
///
/// Outer `None` means "leave as is"; `Some(None)` clears an optional filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPatch {
    /// New page.
    pub page: Option<u32>,
    /// New page size.
    pub limit: Option<u32>,
    /// Genre change.
    pub genre: Option<Option<String>>,
    /// Status change.
    pub status: Option<Option<AnimeStatus>>,
    /// Rating filter change.
    pub content_rating: Option<Option<Vec<ContentRating>>>,
    /// Search term change.
    pub search: Option<Option<String>>,
    /// Sort key change.
    pub sort: Option<SortField>,
    /// Sort direction change.
    pub order: Option<SortOrder>,
}

impl QueryPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to `page`.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Use `limit` items per page.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter by genre; a blank value clears the filter.
    #[must_use]
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(non_blank(genre.into()));
        self
    }

    /// Filter by status, or clear it with `None`.
    #[must_use]
    pub const fn status(mut self, status: Option<AnimeStatus>) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by ratings; an empty list clears the filter.
    #[must_use]
    pub fn content_rating(mut self, ratings: Vec<ContentRating>) -> Self {
        self.content_rating = Some(if ratings.is_empty() { None } else { Some(ratings) });
        self
    }

    /// Search for `term`; a blank value clears the search.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(non_blank(term.into()));
        self
    }

    /// Sort by `sort`.
    #[must_use]
    pub const fn sort(mut self, sort: SortField) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sort in `order`.
    #[must_use]
    pub const fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Patch that resets every filter to the defaults (page 1, rating desc).
    #[must_use]
    pub fn clear_filters() -> Self {
        let defaults = CollectionQuery::default();
        Self {
            page: Some(defaults.page),
            limit: None,
            genre: Some(None),
            status: Some(None),
            content_rating: Some(None),
            search: Some(None),
            sort: Some(defaults.sort),
            order: Some(defaults.order),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Options for `GET /animes/random`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomOptions {
    /// Number of items to draw.
    pub count: u32,
    /// Genre filter.
    pub genre: Option<String>,
    /// Allowed ratings.
    pub content_rating: Option<Vec<ContentRating>>,
}

impl Default for RandomOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_RANDOM_COUNT,
            genre: None,
            content_rating: None,
        }
    }
}

impl RandomOptions {
    /// Options with the profile policy forced on.
    #[must_use]
    pub fn with_policy(&self, policy: &RatingPolicy) -> Self {
        let mut effective = self.clone();
        if let Some(ratings) = policy.ratings() {
            effective.content_rating = Some(ratings.to_vec());
        }
        effective
    }

    /// Query-string pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("count", self.count.to_string())];
        if let Some(genre) = &self.genre {
            pairs.push(("genre", genre.clone()));
        }
        if let Some(ratings) = self.content_rating.as_deref().filter(|r| !r.is_empty()) {
            pairs.push(("contentRating", format_ratings(ratings)));
        }
        pairs
    }
}
