//! Output renderers and formatting helpers for CLI commands.
//!
//! Renderers return the text instead of printing so handlers stay testable;
//! `cli::run` writes the result to stdout.

use std::fmt::Write as _;

use animeverse_api_models::{
    Anime, ExternalAnime, MAX_PROFILES, Pagination, Profile, UserRecord, WatchlistEntry,
    WatchlistStats,
};
use animeverse_client::CollectionSnapshot;
use anyhow::anyhow;
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};
use crate::view::{WatchlistTab, exceeds_ceiling, group_by_status, profile_rows};

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn render_user(user: &UserRecord, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(user),
        OutputFormat::Table => {
            let role = if user.is_admin { "admin" } else { "member" };
            Ok(format!(
                "signed in as {} <{}> ({role})",
                user.username, user.email
            ))
        }
    }
}

pub(crate) fn render_profiles(
    profiles: &[Profile],
    active: Option<&Profile>,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(&json!({
            "profiles": profiles,
            "activeProfileId": active.map(|profile| profile.id.as_str()),
        })),
        OutputFormat::Table => {
            let mut out = format!("  {:<26} {:<6} NAME\n", "ID", "TYPE");
            for row in profile_rows(profiles, active) {
                let marker = if row.active { '*' } else { ' ' };
                let _ = writeln!(
                    out,
                    "{marker} {:<26} {:<6} {}",
                    row.profile.id,
                    row.profile.profile_type.as_str(),
                    row.profile.name
                );
            }
            let _ = write!(out, "{}/{MAX_PROFILES} profiles", profiles.len());
            Ok(out)
        }
    }
}

pub(crate) fn render_profile(profile: &Profile, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(profile),
        OutputFormat::Table => {
            let mut out = format!(
                "id: {}\nname: {}\ntype: {}",
                profile.id, profile.name, profile.profile_type
            );
            if let Some(ceiling) = profile
                .max_content_rating
                .or_else(|| profile.profile_type.rating_ceiling())
            {
                let _ = write!(out, "\nmax rating: {ceiling}");
            }
            if let Some(avatar) = &profile.avatar {
                let _ = write!(out, "\navatar: {avatar}");
            }
            Ok(out)
        }
    }
}

pub(crate) fn render_anime_page(
    snapshot: &CollectionSnapshot,
    active: Option<&Profile>,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let pagination = Pagination {
                total: snapshot.total,
                page: snapshot.page,
                total_pages: snapshot.total_pages,
            };
            to_json(&json!({ "data": snapshot.animes, "pagination": pagination }))
        }
        OutputFormat::Table => {
            let mut out = anime_table(&snapshot.animes, active);
            let _ = write!(
                out,
                "\npage {}/{} ({} total)",
                snapshot.page,
                snapshot.total_pages.max(1),
                snapshot.total
            );
            Ok(out)
        }
    }
}

pub(crate) fn render_anime_list(
    animes: &[Anime],
    active: Option<&Profile>,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(animes),
        OutputFormat::Table => Ok(anime_table(animes, active).trim_end().to_string()),
    }
}

fn anime_table(animes: &[Anime], active: Option<&Profile>) -> String {
    let mut out = format!(
        "{:<26} {:<6} {:>5} {:>4} TITLE\n",
        "ID", "RATED", "SCORE", "YEAR"
    );
    for anime in animes {
        let flag = if exceeds_ceiling(anime, active) {
            " [restricted]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:<26} {:<6} {:>5.1} {:>4} {}{flag}",
            anime.id,
            anime.content_rating.as_str(),
            anime.rating,
            anime.release_year,
            anime.title
        );
    }
    out
}

pub(crate) fn render_anime(
    anime: &Anime,
    active: Option<&Profile>,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(anime),
        OutputFormat::Table => {
            let mut out = format!("id: {}\ntitle: {}", anime.id, anime.title);
            let _ = write!(
                out,
                "\nrated: {}\nscore: {:.1}\nstatus: {}\nyear: {}\nstudio: {}",
                anime.content_rating, anime.rating, anime.status, anime.release_year, anime.studio
            );
            let _ = write!(
                out,
                "\nseasons: {} / episodes: {}",
                anime.season_count, anime.episode_count
            );
            if !anime.genres.is_empty() {
                let _ = write!(out, "\ngenres: {}", anime.genres.join(", "));
            }
            if exceeds_ceiling(anime, active) {
                out.push_str("\nwarning: above the active profile's content rating");
            }
            if !anime.synopsis.is_empty() {
                let _ = write!(out, "\n\n{}", anime.synopsis);
            }
            Ok(out)
        }
    }
}

pub(crate) fn render_external(hits: &[ExternalAnime], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(hits),
        OutputFormat::Table => {
            let mut out = format!("{:<10} {:>4} {:>5} TITLE\n", "EXTERNAL", "YEAR", "EPS");
            for hit in hits {
                let year = hit.release_year.map_or_else(|| "-".to_string(), |y| y.to_string());
                let episodes = hit
                    .episode_count
                    .map_or_else(|| "-".to_string(), |n| n.to_string());
                let _ = writeln!(
                    out,
                    "{:<10} {year:>4} {episodes:>5} {}",
                    hit.external_id, hit.title
                );
            }
            Ok(out.trim_end().to_string())
        }
    }
}

pub(crate) fn render_genres(genres: &[String], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(genres),
        OutputFormat::Table => Ok(genres.join("\n")),
    }
}

pub(crate) fn render_watchlist(
    entries: &[&WatchlistEntry],
    tab: WatchlistTab,
    grouped: bool,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(entries),
        OutputFormat::Table => {
            let mut out = format!("tab: {tab} ({} entries)\n", entries.len());
            if grouped {
                for (status, members) in group_by_status(entries) {
                    let _ = writeln!(out, "\n{status} ({})", members.len());
                    for entry in members {
                        let _ = writeln!(out, "  {}", entry_line(entry));
                    }
                }
            } else {
                let _ = writeln!(out, "{:<26} {:<14} FAV TITLE", "ENTRY", "STATUS");
                for entry in entries {
                    let _ = writeln!(out, "{}", entry_line(entry));
                }
            }
            Ok(out.trim_end().to_string())
        }
    }
}

fn entry_line(entry: &WatchlistEntry) -> String {
    let favorite = if entry.is_favorite { "*" } else { " " };
    format!(
        "{:<26} {:<14} {favorite:^3} {}",
        entry.id,
        entry.status.as_str(),
        entry.anime.title
    )
}

pub(crate) fn render_stats(stats: &WatchlistStats, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(stats),
        OutputFormat::Table => Ok(format!(
            "total: {}\nfavorites: {}\nwatching: {}\ncompleted: {}",
            stats.total, stats.favorites, stats.watching, stats.completed
        )),
    }
}
