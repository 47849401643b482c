//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod auth;
pub mod context;
pub mod team;

pub use args::{GlobalOptions, OutputFormat};
pub use context::AppContext;

/// teamctl - manage teams behind your organization's login
#[derive(Parser, Debug)]
#[command(name = "teamctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(
        long,
        global = true,
        env = "TEAMCTL_FORMAT",
        default_value = "table",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "TEAMCTL_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Teams API base URL
    #[arg(long, global = true, env = "TEAMCTL_API_URL", hide_env = true)]
    pub api_url: Option<String>,

    /// Identity broker base URL
    #[arg(long, global = true, env = "TEAMCTL_BROKER_URL", hide_env = true)]
    pub broker_url: Option<String>,

    /// Identity broker realm
    #[arg(long, global = true, env = "TEAMCTL_REALM", hide_env = true)]
    pub realm: Option<String>,

    /// Identity broker client ID
    #[arg(long, global = true, env = "TEAMCTL_CLIENT_ID", hide_env = true)]
    pub client_id: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "TEAMCTL_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in through the identity provider
    Login,

    /// Sign out and forget the stored session
    Logout,

    /// Show login state, user and roles
    Status,

    /// Show details of the current access token
    Token,

    /// Manage teams
    #[command(subcommand)]
    Team(TeamCommands),

    /// Display version information
    Version,

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   teamctl completion bash > /etc/bash_completion.d/teamctl
  zsh:    teamctl completion zsh > \"${fpath[1]}/_teamctl\"
  fish:   teamctl completion fish > ~/.config/fish/completions/teamctl.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Team management subcommands
#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// List all teams
    List,

    /// Create a team
    Create {
        /// Team name (surrounding whitespace is trimmed)
        name: String,
    },

    /// Delete a team
    Delete {
        /// Team ID
        team_id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Write static completions for `shell` to stdout
pub fn print_completions(shell: Shell) {
    use clap::CommandFactory;

    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "teamctl", &mut std::io::stdout());
}
