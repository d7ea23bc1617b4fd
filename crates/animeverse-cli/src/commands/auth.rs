use animeverse_api_models::{LoginRequest, RegisterRequest};

use crate::cli::{LoginArgs, RegisterArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_user;

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<String> {
    let email = args.email.trim();
    if email.is_empty() || args.password.is_empty() {
        return Err(CliError::validation("email and password are required"));
    }
    let user = ctx
        .app
        .login(&LoginRequest {
            email: email.to_string(),
            password: args.password,
        })
        .await?;
    render_user(&user, ctx.output)
}

pub(crate) async fn handle_register(ctx: &AppContext, args: RegisterArgs) -> CliResult<String> {
    let username = args.username.trim();
    let email = args.email.trim();
    if username.is_empty() || email.is_empty() || args.password.is_empty() {
        return Err(CliError::validation(
            "username, email, and password are required",
        ));
    }
    let user = ctx
        .app
        .register(&RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: args.password,
        })
        .await?;
    render_user(&user, ctx.output)
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> String {
    let was_signed_in = ctx.app.session().is_authenticated();
    ctx.app.logout().await;
    if was_signed_in {
        "signed out".to_string()
    } else {
        "not signed in".to_string()
    }
}

pub(crate) fn handle_whoami(ctx: &AppContext) -> CliResult<String> {
    ctx.require_session()?;
    let user = ctx
        .app
        .session()
        .user()
        .ok_or_else(|| CliError::validation("not signed in"))?;
    render_user(&user, ctx.output)
}
