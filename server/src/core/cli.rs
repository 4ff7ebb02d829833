use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_CORS_ORIGIN, ENV_DATABASE_URL, ENV_HOST, ENV_JWT_SECRET, ENV_PORT,
};

#[derive(Parser)]
#[command(name = "leaddesk")]
#[command(version, about = "Lead management API server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// PostgreSQL connection URL
    #[arg(long, global = true, env = ENV_DATABASE_URL, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Secret used to sign session tokens
    #[arg(long, global = true, env = ENV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Allowed CORS origins (comma separated)
    #[arg(long, global = true, env = ENV_CORS_ORIGIN, value_delimiter = ',')]
    pub cors_origin: Option<Vec<String>>,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Apply the database schema and exit
    Migrate,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub cors_origins: Option<Vec<String>>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            config: cli.config,
            database_url: cli.database_url,
            jwt_secret: cli.jwt_secret,
            cors_origins: cli.cors_origin,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (cli.into(), command)
}
