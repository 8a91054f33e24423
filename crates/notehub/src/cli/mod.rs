//! Command-line interface for notehub.
//!
//! Every command runs on one tokio runtime. Handlers print their own
//! output and errors and report success as a `bool`; any failure makes the
//! process exit with status 1.

/// Clap argument definitions
mod args;

/// `capture` command: stdin into an autosaved document
mod capture;

/// Config command handlers
mod config;

/// `today`, `daily` and `append` commands
mod daily;

/// `ls`, `tree`, `cat`, `put`, `rm` and `mkdir` commands
mod files;

/// Search command handler
mod search;

use clap::Parser;
use env_logger::Env;

use notehub_core::error::ErrorKind;
use notehub_core::transport::HttpTransport;
use notehub_core::{Config, NotehubError, RemoteStore, Result};

pub use args::Cli;
use args::Commands;

/// Store type used by every remote command.
pub type CliStore = RemoteStore<HttpTransport>;

/// Everything a remote command needs: the effective config and a store.
pub struct Session {
    pub config: Config,
    pub store: CliStore,
}

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("✗ Could not start the async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let success = runtime.block_on(dispatch(cli));
    if !success {
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> bool {
    let branch = cli.branch;

    match cli.command {
        Commands::Init {
            owner,
            repo,
            token,
            daily_folder,
        } => config::handle_init(owner, repo, token, branch, daily_folder),

        Commands::Config { command } => config::handle_config_command(command),

        command => {
            let session = match connect(branch) {
                Ok(session) => session,
                Err(e) => {
                    report(&e);
                    return false;
                }
            };
            run_remote(command, &session).await
        }
    }
}

async fn run_remote(command: Commands, session: &Session) -> bool {
    match command {
        Commands::Ls { path } => files::handle_ls(session, &path).await,
        Commands::Tree { path, depth } => files::handle_tree(session, &path, depth).await,
        Commands::Cat { path } => files::handle_cat(session, &path).await,
        Commands::Put {
            path,
            file,
            message,
        } => files::handle_put(session, &path, file, message).await,
        Commands::Rm { path, recursive } => files::handle_rm(session, &path, recursive).await,
        Commands::Mkdir { path } => files::handle_mkdir(session, &path).await,
        Commands::Today => daily::handle_today(session).await,
        Commands::Daily { days, date } => daily::handle_daily(session, days, date).await,
        Commands::Append { text } => daily::handle_append(session, &text.join(" ")).await,
        Commands::Search { query } => search::handle_search(session, &query.join(" ")).await,
        Commands::Capture { path, on_conflict } => {
            capture::handle_capture(session, &path, on_conflict).await
        }
        // Handled before connecting
        Commands::Init { .. } | Commands::Config { .. } => true,
    }
}

/// Load the config, apply environment and flag overrides, and build a
/// store backed by the HTTP transport.
fn connect(branch: Option<String>) -> Result<Session> {
    let mut config = Config::load()?.with_env_overrides();
    if let Some(branch) = branch {
        config.branch = branch;
    }

    let credentials = config.credentials()?;
    let transport = HttpTransport::new(config.request_timeout())?;
    log::debug!(
        "Using {} on branch {}",
        credentials.full_name(),
        credentials.branch()
    );

    Ok(Session {
        store: RemoteStore::new(credentials, transport),
        config,
    })
}

/// Print an error, with a hint where one helps.
pub fn report(error: &NotehubError) {
    eprintln!("✗ {}", error);
    match error.kind() {
        ErrorKind::Unauthorized => {
            eprintln!("  Check the token (NOTEHUB_GITHUB_TOKEN or 'notehub config set token ...')");
        }
        ErrorKind::Conflict => {
            eprintln!("  The note changed remotely; fetch it again with 'notehub cat' and retry");
        }
        ErrorKind::Unavailable => {
            eprintln!("  The backend could not be reached; try again later");
        }
        _ => {}
    }
}
