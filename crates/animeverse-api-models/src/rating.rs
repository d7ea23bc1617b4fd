//! Content ratings and the parental policy derived from profile types.
//!
//! # Design
//! - Ratings are ordinal (`G < PG < PG-13 < R < NC-17`); the derive order of
//!   [`ContentRating`] encodes that ordering.
//! - A [`RatingPolicy`] is computed from the active profile and forced onto
//!   catalog queries; callers never assemble the restriction by hand.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::profile::{Profile, ProfileType};

/// Ordinal audience classification attached to every catalog item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentRating {
    /// General audiences.
    #[serde(rename = "G")]
    G,
    /// Parental guidance suggested.
    #[serde(rename = "PG")]
    Pg,
    /// Parents strongly cautioned.
    #[serde(rename = "PG-13")]
    Pg13,
    /// Restricted.
    #[serde(rename = "R")]
    R,
    /// Adults only.
    #[serde(rename = "NC-17")]
    Nc17,
}

impl ContentRating {
    /// Every rating in ascending order.
    pub const ALL: [Self; 5] = [Self::G, Self::Pg, Self::Pg13, Self::R, Self::Nc17];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::G => "G",
            Self::Pg => "PG",
            Self::Pg13 => "PG-13",
            Self::R => "R",
            Self::Nc17 => "NC-17",
        }
    }

    /// All ratings at or below `ceiling`, ascending.
    #[must_use]
    pub fn up_to(ceiling: Self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|rating| *rating <= ceiling)
            .collect()
    }
}

impl Display for ContentRating {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ContentRating {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|rating| rating.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownValue {
                kind: "content rating",
                value: value.to_string(),
            })
    }
}

/// Join ratings into the comma-separated form the API expects (`G,PG`).
#[must_use]
pub fn format_ratings(ratings: &[ContentRating]) -> String {
    ratings
        .iter()
        .map(|rating| rating.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a comma-separated rating list; blank input yields an empty list.
///
/// # Errors
///
/// Returns [`ModelError::UnknownValue`] for the first unrecognised rating.
pub fn parse_ratings(value: &str) -> Result<Vec<ContentRating>, ModelError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ContentRating::from_str)
        .collect()
}

/// Catalog restriction applied on behalf of the active profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RatingPolicy {
    /// No restriction (adult profile or no profile selected).
    #[default]
    Unrestricted,
    /// Only the listed ratings may be returned.
    Restricted(Vec<ContentRating>),
}

impl RatingPolicy {
    /// Policy implied by a profile type.
    #[must_use]
    pub fn for_type(profile_type: ProfileType) -> Self {
        profile_type
            .rating_ceiling()
            .map_or(Self::Unrestricted, |ceiling| {
                Self::Restricted(ContentRating::up_to(ceiling))
            })
    }

    /// Policy implied by the (optional) active profile.
    #[must_use]
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        profile.map_or(Self::Unrestricted, |profile| {
            Self::for_type(profile.profile_type)
        })
    }

    /// Ratings this policy forces onto queries, if any.
    #[must_use]
    pub fn ratings(&self) -> Option<&[ContentRating]> {
        match self {
            Self::Unrestricted => None,
            Self::Restricted(ratings) => Some(ratings.as_slice()),
        }
    }

    /// Whether an item with `rating` may be shown under this policy.
    #[must_use]
    pub fn allows(&self, rating: ContentRating) -> bool {
        self.ratings().is_none_or(|allowed| allowed.contains(&rating))
    }
}
