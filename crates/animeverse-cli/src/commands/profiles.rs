use animeverse_api_models::{MAX_PROFILES, ProfileDraft, ProfileUpdate};

use crate::cli::{ProfileCreateArgs, ProfileIdArgs, ProfileSetTypeArgs, ProfileUpdateArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_profile, render_profiles};
use crate::view::can_add_profile;

pub(crate) async fn handle_profile_list(ctx: &AppContext) -> CliResult<String> {
    ctx.restore_profiles().await?;
    let profiles = ctx.app.profiles();
    render_profiles(
        &profiles.profiles(),
        profiles.active_profile().as_ref(),
        ctx.output,
    )
}

pub(crate) async fn handle_profile_show(ctx: &AppContext, args: ProfileIdArgs) -> CliResult<String> {
    ctx.require_session()?;
    let profile = ctx.app.profiles().get_profile(&args.id).await?;
    render_profile(&profile, ctx.output)
}

pub(crate) async fn handle_profile_select(
    ctx: &AppContext,
    args: ProfileIdArgs,
) -> CliResult<String> {
    ctx.restore_profiles().await?;
    let profile = ctx.app.profiles().select_profile(&args.id)?;
    Ok(format!(
        "active profile: {} ({})",
        profile.name, profile.profile_type
    ))
}

pub(crate) async fn handle_profile_create(
    ctx: &AppContext,
    args: ProfileCreateArgs,
) -> CliResult<String> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::validation("profile name must not be empty"));
    }
    ctx.restore_profiles().await?;
    if !can_add_profile(ctx.app.profiles().profiles().len()) {
        return Err(CliError::validation(format!(
            "an account holds at most {MAX_PROFILES} profiles"
        )));
    }
    let created = ctx
        .app
        .profiles()
        .create_profile(&ProfileDraft {
            name: name.to_string(),
            avatar: args.avatar,
            profile_type: args.profile_type,
        })
        .await?;
    render_profile(&created, ctx.output)
}

pub(crate) async fn handle_profile_update(
    ctx: &AppContext,
    args: ProfileUpdateArgs,
) -> CliResult<String> {
    if args.name.is_none() && args.avatar.is_none() {
        return Err(CliError::validation(
            "nothing to update (pass --name or --avatar)",
        ));
    }
    ctx.restore_profiles().await?;
    let updated = ctx
        .app
        .profiles()
        .update_profile(
            &args.id,
            &ProfileUpdate {
                name: args.name,
                avatar: args.avatar,
            },
        )
        .await?;
    render_profile(&updated, ctx.output)
}

pub(crate) async fn handle_profile_set_type(
    ctx: &AppContext,
    args: ProfileSetTypeArgs,
) -> CliResult<String> {
    ctx.restore_profiles().await?;
    let updated = ctx
        .app
        .profiles()
        .change_profile_type(&args.id, args.profile_type)
        .await?;
    render_profile(&updated, ctx.output)
}

pub(crate) async fn handle_profile_delete(
    ctx: &AppContext,
    args: ProfileIdArgs,
) -> CliResult<String> {
    ctx.restore_profiles().await?;
    let was_active = ctx
        .app
        .profiles()
        .active_profile()
        .is_some_and(|active| active.id == args.id);
    ctx.app.profiles().delete_profile(&args.id).await?;
    if was_active {
        Ok(format!("deleted profile {} (no profile selected now)", args.id))
    } else {
        Ok(format!("deleted profile {}", args.id))
    }
}
