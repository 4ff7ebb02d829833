//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{ApiServer, AuthManager};
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, DEFAULT_LOG_FILTER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::PostgresService;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub database: Arc<PostgresService>,
    pub auth: Arc<AuthManager>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config).await?;
        match command {
            Some(Commands::Migrate) => {
                tracing::info!("Schema is up to date");
                app.database.close().await;
                Ok(())
            }
            Some(Commands::Start) | None => Self::start_server(app).await,
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let database = PostgresService::init(&config.postgres)
            .await
            .context("Failed to initialize PostgreSQL")?;
        let auth = AuthManager::new(&config.auth.jwt_secret, config.auth.session_ttl_secs);

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            database: Arc::new(database),
            auth: Arc::new(auth),
        })
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        app.shutdown.install_signal_handlers();

        app.shutdown
            .register(
                app.database
                    .start_health_check_task(app.shutdown.subscribe()),
            )
            .await;

        tracing::info!(
            host = %app.config.server.host,
            port = app.config.server.port,
            "{} starting",
            APP_NAME
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;

        app.shutdown.shutdown().await;
        app.database.close().await;
        tracing::debug!("Shutdown complete");

        Ok(())
    }
}
