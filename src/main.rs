//! teamctl - manage teams behind your organization's login

use clap::Parser;

mod auth;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;

use cli::{AppContext, Cli, Commands, GlobalOptions, TeamCommands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "teamctl=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // Commands that never touch the session
    match cli.command {
        Commands::Version => {
            println!("teamctl version {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Completion { shell } => {
            cli::print_completions(shell);
            return Ok(());
        }
        _ => {}
    }

    let opts = GlobalOptions::from_cli(&cli);
    let ctx = AppContext::init(&opts).await?;

    let result = dispatch(&ctx, cli.command).await;
    if let Err(ref err) = result {
        // Report before waiting on any login the failure may have started
        eprintln!("Error: {}", err);
    }
    ctx.shutdown().await;

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

async fn dispatch(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login => cli::auth::login(ctx).await,
        Commands::Logout => cli::auth::logout(ctx).await,
        Commands::Status => cli::auth::status(ctx).await,
        Commands::Token => cli::auth::token(ctx).await,
        Commands::Team(team_cmd) => match team_cmd {
            TeamCommands::List => cli::team::list(ctx).await,
            TeamCommands::Create { name } => cli::team::create(ctx, &name).await,
            TeamCommands::Delete { team_id, yes } => {
                cli::team::delete(ctx, &team_id, yes).await
            }
        },
        Commands::Version | Commands::Completion { .. } => Ok(()),
    }
}
