use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use prismatf::config::{ProviderConfig, RetrySettings};
use prismatf::prismacloud::SearchType;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub struct ConnectionArgs {
    #[arg(long, global = true, env = "PRISMACLOUD_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(long, global = true, env = "PRISMACLOUD_URL")]
    pub url: Option<String>,

    #[arg(long, global = true, env = "PRISMACLOUD_USERNAME")]
    pub username: Option<String>,

    #[arg(long, global = true, env = "PRISMACLOUD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, global = true, env = "PRISMACLOUD_CUSTOMER_NAME")]
    pub customer_name: Option<String>,

    #[arg(long, global = true, env = "PRISMACLOUD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl ConnectionArgs {
    /// Flags and env vars win over the config file.
    pub fn apply(&self, config: &mut ProviderConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if self.username.is_some() {
            config.username = self.username.clone();
        }
        if self.password.is_some() {
            config.password = self.password.clone();
        }
        if self.customer_name.is_some() {
            config.customer_name = self.customer_name.clone();
        }
        if self.token.is_some() {
            config.token = self.token.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode or decode composite resource ids
    Id {
        #[command(subcommand)]
        command: IdCommand,
    },
    /// Manage `prismacloud_rql_search` resources
    Rql {
        #[command(subcommand)]
        command: RqlCommand,
    },
    /// Read the `prismacloud_user_role` data source
    Role {
        #[command(subcommand)]
        command: RoleCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum IdCommand {
    Encode {
        #[arg(required = true)]
        parts: Vec<String>,
    },
    Decode {
        token: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RqlCommand {
    Create(RqlCreateArgs),
    Read(RqlReadArgs),
}

#[derive(clap::Args, Debug)]
pub struct RqlCreateArgs {
    #[arg(long, default_value = "config")]
    pub search_type: SearchType,

    #[arg(long)]
    pub query: String,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub retry: RetryArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct RqlReadArgs {
    pub id: String,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub retry: RetryArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    #[arg(long, default_value_t = 10)]
    pub limit: u32,

    #[arg(long)]
    pub skip_result: bool,

    #[arg(long)]
    pub heuristic_search: bool,

    #[arg(long, default_value_t = 24)]
    pub time_amount: u32,

    #[arg(long, default_value = "hour")]
    pub time_unit: String,
}

#[derive(Subcommand, Debug)]
pub enum RoleCommand {
    Show {
        #[arg(long)]
        role_id: Option<String>,

        #[arg(long, required_unless_present = "role_id")]
        name: Option<String>,

        #[command(flatten)]
        retry: RetryArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        output: OutputFormat,
    },
}

#[derive(clap::Args, Debug)]
pub struct RetryArgs {
    #[arg(long)]
    pub backoff_retry: bool,

    /// Negative values are rejected when the policy is built
    #[arg(long, allow_negative_numbers = true)]
    pub max_retries: Option<i64>,
}

impl RetryArgs {
    pub fn apply(&self, settings: &mut RetrySettings) {
        if self.backoff_retry {
            settings.backoff_retry = true;
        }
        if let Some(max_retries) = self.max_retries {
            settings.max_retries = max_retries;
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}
