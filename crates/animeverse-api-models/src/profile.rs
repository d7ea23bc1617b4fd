//! Viewer profiles owned by an authenticated user.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::rating::ContentRating;

/// Highest number of profiles the UI lets a user create.
///
/// The stores do not enforce this; it is a contract for front-ends.
pub const MAX_PROFILES: usize = 5;

/// Audience class of a profile; drives the parental content policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    /// Children: `G` and `PG` only.
    Kid,
    /// Teenagers: up to `PG-13`.
    Teen,
    /// Adults: unrestricted.
    Adult,
}

impl ProfileType {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kid => "kid",
            Self::Teen => "teen",
            Self::Adult => "adult",
        }
    }

    /// Highest rating this profile type may browse, `None` when unrestricted.
    #[must_use]
    pub const fn rating_ceiling(self) -> Option<ContentRating> {
        match self {
            Self::Kid => Some(ContentRating::Pg),
            Self::Teen => Some(ContentRating::Pg13),
            Self::Adult => None,
        }
    }
}

impl Display for ProfileType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ProfileType {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kid" => Ok(Self::Kid),
            "teen" => Ok(Self::Teen),
            "adult" => Ok(Self::Adult),
            _ => Err(ModelError::UnknownValue {
                kind: "profile type",
                value: value.to_string(),
            }),
        }
    }
}

/// A viewer profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Audience class.
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    /// Explicit rating ceiling configured server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_content_rating: Option<ContentRating>,
}

impl Profile {
    /// Whether an item rated `rating` is appropriate for this profile.
    ///
    /// An explicit `maxContentRating` wins over the type's ceiling.
    #[must_use]
    pub fn can_view(&self, rating: ContentRating) -> bool {
        self.max_content_rating
            .or_else(|| self.profile_type.rating_ceiling())
            .is_none_or(|ceiling| rating <= ceiling)
    }
}

/// Body for `POST /profiles`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    /// Display name.
    pub name: String,
    /// Optional avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Audience class.
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
}

/// Partial body for `PUT /profiles/:id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Body for `PATCH /profiles/:id/type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTypeChange {
    /// Target audience class.
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
}
