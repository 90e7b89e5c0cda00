use clap::{Args, Parser, Subcommand};

use infra_console::analytics::filter::EntityFilter;
use infra_console::dashboard::ChartKind;

/// Infra Console: admin client for users, services, tokens and usage stats
#[derive(Parser)]
#[command(name = "infra-console", version, about)]
pub struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and print the session cookie value
    Login {
        #[arg(long, short)]
        username: String,
        #[arg(long, env = "INFRA_CONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Change the admin password
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        /// Defaults to the value of --new
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage services
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },

    /// Manage access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Usage statistics
    Stats {
        #[command(subcommand)]
        command: StatsCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    List,
    Get { id: u64 },
    Create {
        #[arg(long)]
        username: String,
    },
    Update {
        id: u64,
        #[arg(long)]
        username: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
    },
    Delete { id: u64 },
    /// Enable or disable a user
    Status {
        id: u64,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[derive(Args)]
pub struct ServiceFields {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub base_url: String,
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    List,
    Get { id: u64 },
    Create {
        #[command(flatten)]
        fields: ServiceFields,
    },
    Update {
        id: u64,
        #[command(flatten)]
        fields: ServiceFields,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
    },
    Delete { id: u64 },
    /// Enable or disable a service
    Status {
        id: u64,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[derive(Args)]
pub struct ExpiryArgs {
    /// Token never expires
    #[arg(long, conflicts_with = "expires")]
    pub permanent: bool,
    /// Expiry as RFC 3339 or YYYY-MM-DD (server default: 30 days)
    #[arg(long)]
    pub expires: Option<String>,
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// List tokens, optionally for one user and/or service
    List {
        #[arg(long)]
        user: Option<u64>,
        #[arg(long)]
        service: Option<u64>,
    },
    /// Tokens issued to a user
    ForUser { user_id: u64 },
    /// Tokens issued on a service
    ForService { service_id: u64 },
    Get { id: u64 },
    /// Issue a token for a user on a service
    Create {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        service: u64,
        #[command(flatten)]
        expiry: ExpiryArgs,
    },
    Update {
        id: u64,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
        #[command(flatten)]
        expiry: ExpiryArgs,
    },
    Delete { id: u64 },
    /// Enable or disable a token
    Status {
        id: u64,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[derive(Args, Clone, Copy)]
pub struct ChartArgs {
    /// Entity id, or "all"
    #[arg(long, default_value = "all")]
    pub entity: EntityFilter,
    /// Lookback window in days (defaults to INFRA_CONSOLE_WINDOW_DAYS)
    #[arg(long)]
    pub days: Option<u32>,
    #[arg(long, value_enum)]
    pub kind: Option<ChartKind>,
}

#[derive(Subcommand)]
pub enum StatsCommands {
    /// Totals, peaks and request trend
    Overview {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Requests per day
    Daily {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Requests per service
    Services,
    /// Per-service series (--entity selects a service)
    ServiceTime(ChartArgs),
    /// Per-token series (--entity selects a user)
    TokenTime(ChartArgs),
    /// Per-user requests grouped by service (--entity selects a user)
    UserServices {
        #[command(flatten)]
        chart: ChartArgs,
        /// All-time totals per service instead of a daily series
        #[arg(long)]
        totals: bool,
    },
    /// Per-user requests grouped by token (--entity selects a user)
    UserTokens {
        #[command(flatten)]
        chart: ChartArgs,
        /// All-time totals per token instead of a daily series
        #[arg(long)]
        totals: bool,
    },
}
