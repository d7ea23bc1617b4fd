//! Catalog items and the admin/import payloads that create them.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::de::string_or_number;
use crate::error::{ModelError, ModelResult};
use crate::rating::ContentRating;

/// Highest score a catalog item can carry.
pub const MAX_SCORE: f64 = 10.0;

/// Broadcast status of a series. Wire values are the backend's Spanish labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimeStatus {
    /// Currently airing.
    #[serde(rename = "En emisión")]
    Airing,
    /// Finished airing.
    #[serde(rename = "Finalizado")]
    Finished,
    /// Announced, not yet airing.
    #[serde(rename = "Anunciado")]
    Announced,
    /// On hiatus.
    #[serde(rename = "Pausado")]
    Paused,
}

impl AnimeStatus {
    /// Every status in display order.
    pub const ALL: [Self; 4] = [Self::Airing, Self::Finished, Self::Announced, Self::Paused];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Airing => "En emisión",
            Self::Finished => "Finalizado",
            Self::Announced => "Anunciado",
            Self::Paused => "Pausado",
        }
    }
}

impl Display for AnimeStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AnimeStatus {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(status) = Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
        {
            return Ok(status);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "airing" | "en emision" => Ok(Self::Airing),
            "finished" => Ok(Self::Finished),
            "announced" => Ok(Self::Announced),
            "paused" => Ok(Self::Paused),
            _ => Err(ModelError::UnknownValue {
                kind: "anime status",
                value: value.to_string(),
            }),
        }
    }
}

const fn one() -> u32 {
    1
}

const fn unrated() -> ContentRating {
    ContentRating::Pg13
}

/// A catalog item as returned by `/animes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anime {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Title.
    pub title: String,
    /// Cover image URL.
    #[serde(default)]
    pub image_url: String,
    /// Plot summary.
    #[serde(default)]
    pub synopsis: String,
    /// Genre labels.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Score between 0 and 10.
    #[serde(default)]
    pub rating: f64,
    /// Number of seasons (at least one).
    #[serde(default = "one")]
    pub season_count: u32,
    /// Number of episodes (at least one).
    #[serde(default = "one")]
    pub episode_count: u32,
    /// Broadcast status.
    pub status: AnimeStatus,
    /// First release year.
    #[serde(default)]
    pub release_year: i32,
    /// Producing studio.
    #[serde(default)]
    pub studio: String,
    /// Audience rating; the backend treats a missing value as `PG-13`.
    #[serde(default = "unrated")]
    pub content_rating: ContentRating,
}

/// Body for `POST /animes` and `PUT /animes/:id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDraft {
    /// Title.
    pub title: String,
    /// Cover image URL.
    pub image_url: String,
    /// Plot summary.
    pub synopsis: String,
    /// Genre labels.
    pub genres: Vec<String>,
    /// Score between 0 and 10.
    pub rating: f64,
    /// Number of seasons.
    pub season_count: u32,
    /// Number of episodes.
    pub episode_count: u32,
    /// Broadcast status.
    pub status: AnimeStatus,
    /// First release year.
    pub release_year: i32,
    /// Producing studio.
    pub studio: String,
    /// Audience rating.
    pub content_rating: ContentRating,
}

impl AnimeDraft {
    /// Check the catalog invariants before the draft leaves the client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidField`] naming the first offending field.
    pub fn validate(&self) -> ModelResult<()> {
        if self.title.trim().is_empty() {
            return Err(invalid("title", "must not be empty"));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_SCORE).contains(&self.rating) {
            return Err(invalid("rating", "must be between 0 and 10"));
        }
        if self.season_count < 1 {
            return Err(invalid("seasonCount", "must be at least 1"));
        }
        if self.episode_count < 1 {
            return Err(invalid("episodeCount", "must be at least 1"));
        }
        Ok(())
    }
}

impl From<&Anime> for AnimeDraft {
    fn from(anime: &Anime) -> Self {
        Self {
            title: anime.title.clone(),
            image_url: anime.image_url.clone(),
            synopsis: anime.synopsis.clone(),
            genres: anime.genres.clone(),
            rating: anime.rating,
            season_count: anime.season_count,
            episode_count: anime.episode_count,
            status: anime.status,
            release_year: anime.release_year,
            studio: anime.studio.clone(),
            content_rating: anime.content_rating,
        }
    }
}

fn invalid(field: &'static str, message: &str) -> ModelError {
    ModelError::InvalidField {
        field,
        message: message.to_string(),
    }
}

/// A search hit from the external catalog (`/animes/external/search`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAnime {
    /// Identifier in the external catalog.
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub external_id: String,
    /// Title.
    pub title: String,
    /// Cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Plot summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    /// Episode count when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    /// Release year when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    /// Score when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Body for `POST /animes/external/import`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// Identifier in the external catalog.
    pub external_id: String,
}
