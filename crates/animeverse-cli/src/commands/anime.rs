use std::fs;
use std::path::Path;

use animeverse_api_models::{AnimeDraft, QueryPatch, RandomOptions};
use anyhow::Context;

use crate::cli::{
    AnimeFileArgs, AnimeIdArgs, AnimeListArgs, AnimeRandomArgs, AnimeSearchArgs, AnimeUpdateArgs,
    ExternalSearchArgs, ImportArgs,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_anime, render_anime_list, render_anime_page, render_external, render_genres};

/// Catalog reads work signed out; when signed in, the persisted profile must
/// be restored first so its rating policy applies.
async fn restore_if_signed_in(ctx: &AppContext) -> CliResult<()> {
    if ctx.app.session().is_authenticated() {
        ctx.restore_profiles().await?;
    }
    Ok(())
}

fn list_patch(args: AnimeListArgs) -> QueryPatch {
    let mut patch = QueryPatch::new().page(args.page.unwrap_or(1));
    if let Some(limit) = args.limit {
        patch = patch.limit(limit);
    }
    if let Some(genre) = args.genre {
        patch = patch.genre(genre);
    }
    if let Some(status) = args.status {
        patch = patch.status(Some(status));
    }
    if !args.ratings.is_empty() {
        patch = patch.content_rating(args.ratings);
    }
    if let Some(sort) = args.sort {
        patch = patch.sort(sort);
    }
    if let Some(order) = args.order {
        patch = patch.order(order);
    }
    patch
}

fn read_draft(path: &Path) -> CliResult<AnimeDraft> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(CliError::failure)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid anime document", path.display()))
        .map_err(CliError::failure)
}

pub(crate) async fn handle_anime_list(ctx: &AppContext, args: AnimeListArgs) -> CliResult<String> {
    restore_if_signed_in(ctx).await?;
    let collection = ctx.app.collection();
    collection.fetch_animes(&list_patch(args)).await?;
    render_anime_page(
        &collection.snapshot(),
        ctx.app.profiles().active_profile().as_ref(),
        ctx.output,
    )
}

pub(crate) async fn handle_anime_search(
    ctx: &AppContext,
    args: AnimeSearchArgs,
) -> CliResult<String> {
    if args.term.trim().is_empty() {
        return Err(CliError::validation("search term must not be empty"));
    }
    restore_if_signed_in(ctx).await?;
    let mut patch = QueryPatch::new();
    if let Some(limit) = args.limit {
        patch = patch.limit(limit);
    }
    let collection = ctx.app.collection();
    collection.search_animes(&args.term, &patch).await?;
    render_anime_page(
        &collection.snapshot(),
        ctx.app.profiles().active_profile().as_ref(),
        ctx.output,
    )
}

pub(crate) async fn handle_anime_show(ctx: &AppContext, args: AnimeIdArgs) -> CliResult<String> {
    restore_if_signed_in(ctx).await?;
    let anime = ctx.app.collection().get_anime(&args.id).await?;
    render_anime(
        &anime,
        ctx.app.profiles().active_profile().as_ref(),
        ctx.output,
    )
}

pub(crate) async fn handle_anime_random(
    ctx: &AppContext,
    args: AnimeRandomArgs,
) -> CliResult<String> {
    if args.count == 0 {
        return Err(CliError::validation("count must be at least 1"));
    }
    restore_if_signed_in(ctx).await?;
    let picks = ctx
        .app
        .collection()
        .get_random_animes(&RandomOptions {
            count: args.count,
            genre: args.genre,
            ..RandomOptions::default()
        })
        .await;
    render_anime_list(
        &picks,
        ctx.app.profiles().active_profile().as_ref(),
        ctx.output,
    )
}

pub(crate) async fn handle_anime_genres(ctx: &AppContext) -> CliResult<String> {
    restore_if_signed_in(ctx).await?;
    let genres = ctx.app.collection().get_genres().await;
    render_genres(&genres, ctx.output)
}

pub(crate) async fn handle_anime_create(
    ctx: &AppContext,
    args: AnimeFileArgs,
) -> CliResult<String> {
    let draft = read_draft(&args.file)?;
    let created = ctx.app.collection().create_anime(&draft).await?;
    render_anime(&created, None, ctx.output)
}

pub(crate) async fn handle_anime_update(
    ctx: &AppContext,
    args: AnimeUpdateArgs,
) -> CliResult<String> {
    let draft = read_draft(&args.file)?;
    let updated = ctx.app.collection().update_anime(&args.id, &draft).await?;
    render_anime(&updated, None, ctx.output)
}

pub(crate) async fn handle_anime_delete(ctx: &AppContext, args: AnimeIdArgs) -> CliResult<String> {
    ctx.app.collection().delete_anime(&args.id).await?;
    Ok(format!("deleted anime {}", args.id))
}

pub(crate) async fn handle_anime_external(
    ctx: &AppContext,
    args: ExternalSearchArgs,
) -> CliResult<String> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(CliError::validation("title must not be empty"));
    }
    let hits = ctx.app.collection().search_external_api(title).await?;
    render_external(&hits, ctx.output)
}

pub(crate) async fn handle_anime_import(ctx: &AppContext, args: ImportArgs) -> CliResult<String> {
    let imported = ctx
        .app
        .collection()
        .import_from_external_api(args.external_id.trim())
        .await?;
    render_anime(&imported, None, ctx.output)
}
