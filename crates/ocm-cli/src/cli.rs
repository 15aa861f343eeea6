//! Command-line argument parsing with clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// OCM CLI - log in to the cloud management API and call it.
#[derive(Parser, Debug, Clone)]
#[command(name = "ocm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in, saving the credentials and tokens.
    Login(LoginArgs),

    /// Log out, removing saved tokens and credentials.
    Logout,

    /// Print the current access or refresh token.
    Token(TokenArgs),

    /// Inspect and edit the saved settings.
    Config {
        /// Config subcommand to execute.
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Send a GET request to the gateway.
    Get(GetArgs),
}

/// Arguments for `login`.
#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Access or refresh token.
    #[arg(short, long)]
    pub token: Option<String>,

    /// OpenID client identifier.
    #[arg(long)]
    pub client_id: Option<String>,

    /// OpenID client secret.
    #[arg(long)]
    pub client_secret: Option<String>,

    /// User name for the password grant.
    #[arg(long)]
    pub user: Option<String>,

    /// Password for the password grant.
    #[arg(long)]
    pub password: Option<String>,

    /// Gateway URL or one of the aliases (production, staging, integration).
    #[arg(long)]
    pub url: Option<String>,

    /// OpenID token URL.
    #[arg(long)]
    pub token_url: Option<String>,

    /// OpenID scope, may be repeated.
    #[arg(long = "scope")]
    pub scopes: Vec<String>,

    /// Skip TLS verification.
    #[arg(long)]
    pub insecure: bool,
}

/// Arguments for `token`.
#[derive(Args, Debug, Clone, Default)]
pub struct TokenArgs {
    /// Print the refresh token instead of the access token.
    #[arg(long)]
    pub refresh: bool,

    /// Print the decoded header.
    #[arg(long, conflicts_with_all = ["payload", "signature"])]
    pub header: bool,

    /// Print the decoded claims.
    #[arg(long, conflicts_with = "signature")]
    pub payload: bool,

    /// Print the signature segment.
    #[arg(long)]
    pub signature: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show one setting, or all of them.
    Get {
        /// Setting name.
        name: Option<String>,
    },

    /// Change a setting.
    Set {
        /// Setting name.
        name: String,
        /// New value.
        value: String,
    },

    /// Reset a setting to its empty value.
    Delete {
        /// Setting name.
        name: String,
    },

    /// Show where the settings are stored.
    Path,
}

/// Arguments for `get`.
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// API path, for example `/api/clusters_mgmt/v1/clusters`.
    pub path: String,
}
