use animeverse_api_models::{EntryChanges, Profile};
use animeverse_client::ClientError;

use crate::cli::{
    AnimeIdArgs, EntryIdArgs, FavoriteArgs, WatchlistAddArgs, WatchlistListArgs,
    WatchlistUpdateArgs,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_stats, render_watchlist};
use crate::view::entries_for_tab;

async fn active_profile(ctx: &AppContext) -> CliResult<Profile> {
    ctx.restore_profiles().await?;
    ctx.app
        .profiles()
        .active_profile()
        .ok_or_else(|| CliError::from(ClientError::NoActiveProfile))
}

pub(crate) async fn handle_watchlist_list(
    ctx: &AppContext,
    args: WatchlistListArgs,
) -> CliResult<String> {
    active_profile(ctx).await?;
    let watchlist = ctx.app.watchlist();
    watchlist.refresh_watchlist().await?;
    let snapshot = watchlist.snapshot();
    let visible = entries_for_tab(&snapshot.entries, &snapshot.favorites, args.tab);
    render_watchlist(&visible, args.tab, args.group, ctx.output)
}

pub(crate) async fn handle_watchlist_add(
    ctx: &AppContext,
    args: WatchlistAddArgs,
) -> CliResult<String> {
    let profile = active_profile(ctx).await?;
    ctx.app
        .watchlist()
        .add_to_watchlist(
            &args.anime_id,
            EntryChanges {
                status: args.status,
                is_favorite: args.favorite.then_some(true),
            },
        )
        .await?;
    Ok(format!(
        "added {} to {}'s watchlist",
        args.anime_id, profile.name
    ))
}

pub(crate) async fn handle_watchlist_update(
    ctx: &AppContext,
    args: WatchlistUpdateArgs,
) -> CliResult<String> {
    if args.status.is_none() && args.favorite.is_none() {
        return Err(CliError::validation(
            "nothing to update (pass --status or --favorite)",
        ));
    }
    active_profile(ctx).await?;
    ctx.app
        .watchlist()
        .update_watchlist_entry(
            &args.entry_id,
            EntryChanges {
                status: args.status,
                is_favorite: args.favorite,
            },
        )
        .await?;
    Ok(format!("updated entry {}", args.entry_id))
}

pub(crate) async fn handle_watchlist_remove(
    ctx: &AppContext,
    args: EntryIdArgs,
) -> CliResult<String> {
    active_profile(ctx).await?;
    ctx.app
        .watchlist()
        .remove_from_watchlist(&args.entry_id)
        .await?;
    Ok(format!("removed entry {}", args.entry_id))
}

pub(crate) async fn handle_watchlist_remove_anime(
    ctx: &AppContext,
    args: AnimeIdArgs,
) -> CliResult<String> {
    active_profile(ctx).await?;
    ctx.app
        .watchlist()
        .remove_anime_from_watchlist(&args.id)
        .await?;
    Ok(format!("removed {} from the watchlist", args.id))
}

pub(crate) async fn handle_watchlist_favorite(
    ctx: &AppContext,
    args: FavoriteArgs,
) -> CliResult<String> {
    active_profile(ctx).await?;
    let favorite = !args.off;
    ctx.app
        .watchlist()
        .toggle_favorite(&args.entry_id, favorite)
        .await?;
    let verb = if favorite { "marked" } else { "unmarked" };
    Ok(format!("{verb} entry {} as favorite", args.entry_id))
}

pub(crate) async fn handle_watchlist_check(
    ctx: &AppContext,
    args: AnimeIdArgs,
) -> CliResult<String> {
    let profile = active_profile(ctx).await?;
    let listed = ctx.app.watchlist().is_in_watchlist(&args.id).await;
    let verdict = if listed { "is" } else { "is not" };
    Ok(format!(
        "{} {verdict} on {}'s watchlist",
        args.id, profile.name
    ))
}

pub(crate) async fn handle_watchlist_stats(ctx: &AppContext) -> CliResult<String> {
    active_profile(ctx).await?;
    let watchlist = ctx.app.watchlist();
    watchlist.refresh_watchlist().await?;
    let stats = watchlist.stats().unwrap_or_default();
    render_stats(&stats, ctx.output)
}
