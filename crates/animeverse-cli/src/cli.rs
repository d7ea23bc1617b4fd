//! Argument parsing and command dispatch.

use std::path::PathBuf;

use animeverse_api_models::{AnimeStatus, ContentRating, ProfileType, SortField, SortOrder, WatchStatus};
use animeverse_config::{ENV_API_URL, ENV_LOG, ENV_LOG_FORMAT, ENV_STATE_FILE, ENV_TIMEOUT_SECS};
use animeverse_telemetry::{LoggingConfig, build_sha, init_logging, new_request_id, with_request_context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::client::{AppContext, CliResult, build_context, resolve_config};
use crate::commands::anime::{
    handle_anime_create, handle_anime_delete, handle_anime_external, handle_anime_genres,
    handle_anime_import, handle_anime_list, handle_anime_random, handle_anime_search,
    handle_anime_show, handle_anime_update,
};
use crate::commands::auth::{handle_login, handle_logout, handle_register, handle_whoami};
use crate::commands::profiles::{
    handle_profile_create, handle_profile_delete, handle_profile_list, handle_profile_select,
    handle_profile_set_type, handle_profile_show, handle_profile_update,
};
use crate::commands::watchlist::{
    handle_watchlist_add, handle_watchlist_check, handle_watchlist_favorite, handle_watchlist_list,
    handle_watchlist_remove, handle_watchlist_remove_anime, handle_watchlist_stats,
    handle_watchlist_update,
};
use crate::view::WatchlistTab;

const DEFAULT_STATE_FILE: &str = ".animeverse/state.json";

/// Parses CLI arguments, executes the requested command inside a request
/// context, and prints the result. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);

    let config = match resolve_config(&cli.global) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    let logging = LoggingConfig {
        level: &config.log_level,
        format: config.log_format,
        build_sha: build_sha(),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    let result = with_request_context(new_request_id(), command_name, async {
        let ctx = build_context(&config, cli.global.output)?;
        dispatch(&ctx, cli.command).await
    })
    .await;

    match result {
        Ok(text) => {
            if !text.is_empty() {
                println!("{text}");
            }
            0
        }
        Err(err) => {
            debug!(command = command_name, exit_code = err.exit_code(), "command failed");
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(ctx: &AppContext, command: Command) -> CliResult<String> {
    match command {
        Command::Login(args) => handle_login(ctx, args).await,
        Command::Register(args) => handle_register(ctx, args).await,
        Command::Logout => Ok(handle_logout(ctx).await),
        Command::Whoami => handle_whoami(ctx),
        Command::Profile(profile) => match profile {
            ProfileCommand::List => handle_profile_list(ctx).await,
            ProfileCommand::Show(args) => handle_profile_show(ctx, args).await,
            ProfileCommand::Select(args) => handle_profile_select(ctx, args).await,
            ProfileCommand::Create(args) => handle_profile_create(ctx, args).await,
            ProfileCommand::Update(args) => handle_profile_update(ctx, args).await,
            ProfileCommand::SetType(args) => handle_profile_set_type(ctx, args).await,
            ProfileCommand::Delete(args) => handle_profile_delete(ctx, args).await,
        },
        Command::Anime(anime) => match anime {
            AnimeCommand::List(args) => handle_anime_list(ctx, args).await,
            AnimeCommand::Search(args) => handle_anime_search(ctx, args).await,
            AnimeCommand::Show(args) => handle_anime_show(ctx, args).await,
            AnimeCommand::Random(args) => handle_anime_random(ctx, args).await,
            AnimeCommand::Genres => handle_anime_genres(ctx).await,
            AnimeCommand::Create(args) => handle_anime_create(ctx, args).await,
            AnimeCommand::Update(args) => handle_anime_update(ctx, args).await,
            AnimeCommand::Delete(args) => handle_anime_delete(ctx, args).await,
            AnimeCommand::External(args) => handle_anime_external(ctx, args).await,
            AnimeCommand::Import(args) => handle_anime_import(ctx, args).await,
        },
        Command::Watchlist(watchlist) => match watchlist {
            WatchlistCommand::List(args) => handle_watchlist_list(ctx, args).await,
            WatchlistCommand::Add(args) => handle_watchlist_add(ctx, args).await,
            WatchlistCommand::Update(args) => handle_watchlist_update(ctx, args).await,
            WatchlistCommand::Remove(args) => handle_watchlist_remove(ctx, args).await,
            WatchlistCommand::RemoveAnime(args) => handle_watchlist_remove_anime(ctx, args).await,
            WatchlistCommand::Favorite(args) => handle_watchlist_favorite(ctx, args).await,
            WatchlistCommand::Check(args) => handle_watchlist_check(ctx, args).await,
            WatchlistCommand::Stats => handle_watchlist_stats(ctx).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "animeverse", about = "Browse the Animeverse catalog and manage watchlists")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Args)]
pub(crate) struct GlobalArgs {
    #[arg(long, global = true, env = ENV_API_URL)]
    pub(crate) api_url: Option<String>,
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long,
        global = true,
        env = ENV_STATE_FILE,
        default_value = DEFAULT_STATE_FILE,
        help = "File holding the session and active profile between runs"
    )]
    pub(crate) state_file: PathBuf,
    #[arg(long, global = true, env = ENV_LOG)]
    pub(crate) log: Option<String>,
    #[arg(long, global = true, env = ENV_LOG_FORMAT)]
    pub(crate) log_format: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    Login(LoginArgs),
    Register(RegisterArgs),
    Logout,
    Whoami,
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Anime(AnimeCommand),
    #[command(subcommand)]
    Watchlist(WatchlistCommand),
}

#[derive(Subcommand)]
pub(crate) enum ProfileCommand {
    List,
    Show(ProfileIdArgs),
    Select(ProfileIdArgs),
    Create(ProfileCreateArgs),
    Update(ProfileUpdateArgs),
    SetType(ProfileSetTypeArgs),
    Delete(ProfileIdArgs),
}

#[derive(Subcommand)]
pub(crate) enum AnimeCommand {
    List(AnimeListArgs),
    Search(AnimeSearchArgs),
    Show(AnimeIdArgs),
    Random(AnimeRandomArgs),
    Genres,
    Create(AnimeFileArgs),
    Update(AnimeUpdateArgs),
    Delete(AnimeIdArgs),
    External(ExternalSearchArgs),
    Import(ImportArgs),
}

#[derive(Subcommand)]
pub(crate) enum WatchlistCommand {
    List(WatchlistListArgs),
    Add(WatchlistAddArgs),
    Update(WatchlistUpdateArgs),
    Remove(EntryIdArgs),
    RemoveAnime(AnimeIdArgs),
    Favorite(FavoriteArgs),
    Check(AnimeIdArgs),
    Stats,
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = "ANIMEVERSE_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) username: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = "ANIMEVERSE_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

#[derive(Args)]
pub(crate) struct ProfileIdArgs {
    #[arg(help = "Profile identifier")]
    pub(crate) id: String,
}

#[derive(Args)]
pub(crate) struct ProfileCreateArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long = "type", default_value = "adult")]
    pub(crate) profile_type: ProfileType,
    #[arg(long)]
    pub(crate) avatar: Option<String>,
}

#[derive(Args)]
pub(crate) struct ProfileUpdateArgs {
    #[arg(help = "Profile identifier")]
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) avatar: Option<String>,
}

#[derive(Args)]
pub(crate) struct ProfileSetTypeArgs {
    #[arg(help = "Profile identifier")]
    pub(crate) id: String,
    #[arg(help = "kid, teen, or adult")]
    pub(crate) profile_type: ProfileType,
}

#[derive(Args, Default)]
pub(crate) struct AnimeListArgs {
    #[arg(long)]
    pub(crate) page: Option<u32>,
    #[arg(long)]
    pub(crate) limit: Option<u32>,
    #[arg(long)]
    pub(crate) genre: Option<String>,
    #[arg(long)]
    pub(crate) status: Option<AnimeStatus>,
    #[arg(long = "rating", value_delimiter = ',')]
    pub(crate) ratings: Vec<ContentRating>,
    #[arg(long)]
    pub(crate) sort: Option<SortField>,
    #[arg(long)]
    pub(crate) order: Option<SortOrder>,
}

#[derive(Args)]
pub(crate) struct AnimeSearchArgs {
    #[arg(help = "Search term")]
    pub(crate) term: String,
    #[arg(long)]
    pub(crate) limit: Option<u32>,
}

#[derive(Args)]
pub(crate) struct AnimeIdArgs {
    #[arg(help = "Anime identifier")]
    pub(crate) id: String,
}

#[derive(Args)]
pub(crate) struct AnimeRandomArgs {
    #[arg(long, default_value_t = animeverse_api_models::query::DEFAULT_RANDOM_COUNT)]
    pub(crate) count: u32,
    #[arg(long)]
    pub(crate) genre: Option<String>,
}

#[derive(Args)]
pub(crate) struct AnimeFileArgs {
    #[arg(short = 'f', long = "file", help = "JSON document describing the anime")]
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct AnimeUpdateArgs {
    #[arg(help = "Anime identifier")]
    pub(crate) id: String,
    #[arg(short = 'f', long = "file", help = "JSON document describing the anime")]
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct ExternalSearchArgs {
    #[arg(help = "Title to look up in the external catalog")]
    pub(crate) title: String,
}

#[derive(Args)]
pub(crate) struct ImportArgs {
    #[arg(help = "External catalog identifier")]
    pub(crate) external_id: String,
}

#[derive(Args)]
pub(crate) struct WatchlistListArgs {
    #[arg(long, default_value = "all", help = "all, favorites, or a watch status")]
    pub(crate) tab: WatchlistTab,
    #[arg(long, help = "Group entries by watch status")]
    pub(crate) group: bool,
}

#[derive(Args)]
pub(crate) struct WatchlistAddArgs {
    #[arg(help = "Anime identifier")]
    pub(crate) anime_id: String,
    #[arg(long)]
    pub(crate) status: Option<WatchStatus>,
    #[arg(long)]
    pub(crate) favorite: bool,
}

#[derive(Args)]
pub(crate) struct WatchlistUpdateArgs {
    #[arg(help = "Watchlist entry identifier")]
    pub(crate) entry_id: String,
    #[arg(long)]
    pub(crate) status: Option<WatchStatus>,
    #[arg(long)]
    pub(crate) favorite: Option<bool>,
}

#[derive(Args)]
pub(crate) struct EntryIdArgs {
    #[arg(help = "Watchlist entry identifier")]
    pub(crate) entry_id: String,
}

#[derive(Args)]
pub(crate) struct FavoriteArgs {
    #[arg(help = "Watchlist entry identifier")]
    pub(crate) entry_id: String,
    #[arg(long, help = "Remove the favorite mark instead of setting it")]
    pub(crate) off: bool,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Register(_) => "register",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::Profile(profile) => match profile {
            ProfileCommand::List => "profile_list",
            ProfileCommand::Show(_) => "profile_show",
            ProfileCommand::Select(_) => "profile_select",
            ProfileCommand::Create(_) => "profile_create",
            ProfileCommand::Update(_) => "profile_update",
            ProfileCommand::SetType(_) => "profile_set_type",
            ProfileCommand::Delete(_) => "profile_delete",
        },
        Command::Anime(anime) => match anime {
            AnimeCommand::List(_) => "anime_list",
            AnimeCommand::Search(_) => "anime_search",
            AnimeCommand::Show(_) => "anime_show",
            AnimeCommand::Random(_) => "anime_random",
            AnimeCommand::Genres => "anime_genres",
            AnimeCommand::Create(_) => "anime_create",
            AnimeCommand::Update(_) => "anime_update",
            AnimeCommand::Delete(_) => "anime_delete",
            AnimeCommand::External(_) => "anime_external",
            AnimeCommand::Import(_) => "anime_import",
        },
        Command::Watchlist(watchlist) => match watchlist {
            WatchlistCommand::List(_) => "watchlist_list",
            WatchlistCommand::Add(_) => "watchlist_add",
            WatchlistCommand::Update(_) => "watchlist_update",
            WatchlistCommand::Remove(_) => "watchlist_remove",
            WatchlistCommand::RemoveAnime(_) => "watchlist_remove_anime",
            WatchlistCommand::Favorite(_) => "watchlist_favorite",
            WatchlistCommand::Check(_) => "watchlist_check",
            WatchlistCommand::Stats => "watchlist_stats",
        },
    }
}
