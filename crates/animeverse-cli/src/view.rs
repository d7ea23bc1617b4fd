//! Derivations over store state used by the renderers.
//!
//! Nothing here talks to the network; every function is a pure view of what
//! the stores already hold.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use animeverse_api_models::{Anime, MAX_PROFILES, Profile, WatchStatus, WatchlistEntry};

/// Watchlist tab: everything, favorites only, or one viewing status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum WatchlistTab {
    #[default]
    All,
    Favorites,
    Status(WatchStatus),
}

impl FromStr for WatchlistTab {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "favorites" | "favourites" => Ok(Self::Favorites),
            other => other.parse().map(Self::Status).map_err(|_| {
                format!(
                    "unknown tab '{value}' (expected all, favorites, plan_to_watch, watching, completed, dropped)"
                )
            }),
        }
    }
}

impl Display for WatchlistTab {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => formatter.write_str("all"),
            Self::Favorites => formatter.write_str("favorites"),
            Self::Status(status) => Display::fmt(status, formatter),
        }
    }
}

/// Entries visible on `tab`. The favorites tab reads the server's favorites
/// collection; the others filter the full list.
pub(crate) fn entries_for_tab<'a>(
    entries: &'a [WatchlistEntry],
    favorites: &'a [WatchlistEntry],
    tab: WatchlistTab,
) -> Vec<&'a WatchlistEntry> {
    match tab {
        WatchlistTab::All => entries.iter().collect(),
        WatchlistTab::Favorites => favorites.iter().collect(),
        WatchlistTab::Status(status) => entries
            .iter()
            .filter(|entry| entry.status == status)
            .collect(),
    }
}

/// Entries grouped by status in display order; empty groups are omitted.
pub(crate) fn group_by_status<'a>(
    entries: &[&'a WatchlistEntry],
) -> Vec<(WatchStatus, Vec<&'a WatchlistEntry>)> {
    WatchStatus::ALL
        .into_iter()
        .map(|status| {
            let members = entries
                .iter()
                .copied()
                .filter(|entry| entry.status == status)
                .collect::<Vec<_>>();
            (status, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect()
}

/// One line of the profile picker.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ProfileRow<'a> {
    pub(crate) profile: &'a Profile,
    pub(crate) active: bool,
}

pub(crate) fn profile_rows<'a>(
    profiles: &'a [Profile],
    active: Option<&Profile>,
) -> Vec<ProfileRow<'a>> {
    profiles
        .iter()
        .map(|profile| ProfileRow {
            profile,
            active: active.is_some_and(|current| current.id == profile.id),
        })
        .collect()
}

/// Whether another profile may be created.
pub(crate) const fn can_add_profile(count: usize) -> bool {
    count < MAX_PROFILES
}

/// Whether `anime` is above what the active profile may watch.
///
/// The server already filters listings for restricted profiles; this flags
/// items reached another way, such as a direct lookup.
pub(crate) fn exceeds_ceiling(anime: &Anime, active: Option<&Profile>) -> bool {
    active.is_some_and(|profile| !profile.can_view(anime.content_rating))
}

#[cfg(test)]
mod tests {
    use super::*;
    use animeverse_test_support::fixtures;

    fn entry(id: &str, status: &str, favorite: bool) -> WatchlistEntry {
        serde_json::from_value(fixtures::watchlist_entry(id, "p1", &format!("a-{id}"), status, favorite))
            .expect("fixture decodes")
    }

    fn profile(id: &str, kind: &str) -> Profile {
        serde_json::from_value(fixtures::profile(id, id, kind)).expect("fixture decodes")
    }

    #[test]
    fn tabs_parse_statuses_and_aliases() {
        assert_eq!("favourites".parse(), Ok(WatchlistTab::Favorites));
        assert_eq!(
            "plan-to-watch".parse(),
            Ok(WatchlistTab::Status(WatchStatus::PlanToWatch))
        );
        assert!("later".parse::<WatchlistTab>().is_err());
        assert_eq!(WatchlistTab::Status(WatchStatus::Dropped).to_string(), "dropped");
    }

    #[test]
    fn tabs_filter_client_side() {
        let entries = vec![
            entry("w1", "watching", false),
            entry("w2", "completed", true),
            entry("w3", "watching", true),
        ];
        let favorites = vec![entry("w2", "completed", true)];

        assert_eq!(entries_for_tab(&entries, &favorites, WatchlistTab::All).len(), 3);
        let watching = entries_for_tab(
            &entries,
            &favorites,
            WatchlistTab::Status(WatchStatus::Watching),
        );
        assert_eq!(
            watching.iter().map(|entry| entry.id.as_str()).collect::<Vec<_>>(),
            vec!["w1", "w3"]
        );
        assert_eq!(
            entries_for_tab(&entries, &favorites, WatchlistTab::Favorites)[0].id,
            "w2"
        );
    }

    #[test]
    fn grouping_follows_status_order_and_skips_empty() {
        let entries = vec![
            entry("w1", "completed", false),
            entry("w2", "plan_to_watch", false),
            entry("w3", "completed", false),
        ];
        let refs = entries.iter().collect::<Vec<_>>();
        let groups = group_by_status(&refs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, WatchStatus::PlanToWatch);
        assert_eq!(groups[1].0, WatchStatus::Completed);
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn active_profile_is_marked() {
        let profiles = vec![profile("p1", "kid"), profile("p2", "adult")];
        let rows = profile_rows(&profiles, Some(&profiles[1]));
        assert!(!rows[0].active);
        assert!(rows[1].active);
        assert!(profile_rows(&profiles, None).iter().all(|row| !row.active));
        assert!(can_add_profile(4));
        assert!(!can_add_profile(MAX_PROFILES));
    }

    #[test]
    fn ceiling_flags_only_restricted_profiles() {
        let mature: Anime =
            serde_json::from_value(fixtures::anime("a1", "Berserk", "R")).expect("fixture decodes");
        assert!(exceeds_ceiling(&mature, Some(&profile("p1", "kid"))));
        assert!(exceeds_ceiling(&mature, Some(&profile("p2", "teen"))));
        assert!(!exceeds_ceiling(&mature, Some(&profile("p3", "adult"))));
        assert!(!exceeds_ceiling(&mature, None));
    }
}
