use std::env;

use bannerboard_core::{Board, Config, ConfigError, DatabaseError, SqliteDatabase};
use bannerboard_server::{run_server, ServerContext};
use colored::Colorize;
use log::{error, info};
use thiserror::Error;
use tokio::runtime::{self, Runtime};

mod logging;

const DEFAULT_CONFIG_PATH: &str = "config/config.ron";

struct App {
    context: ServerContext,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("Could not load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl App {
    fn new() -> Result<Self, AppError> {
        let config_path =
            env::var("BANNERBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        info!("Loading configuration from {config_path}...");
        let mut config = Config::load(&config_path)?;

        if let Ok(port) = env::var("BANNERBOARD_SERVER_PORT") {
            config.server.port = port.parse().map_err(|_| {
                ConfigError::Invalid(format!("BANNERBOARD_SERVER_PORT must be a port number (got {port:?})"))
            })?;
        }

        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("bannerboard-async")
            .build()
            .map_err(|e| AppError::Fatal(e.to_string()))?;

        info!("Connecting to database...");
        let database = runtime.block_on(SqliteDatabase::new(
            &config.database.url,
            config.database.max_connections,
        ))?;

        let board = Board::new(database, &config)?;
        runtime.block_on(board.init(config.banners.seed_example))?;

        info!(
            "Loaded {} banners into the cache",
            board.banners.cache().snapshot().len()
        );

        Ok(Self {
            context: ServerContext::new(board, config),
            runtime,
        })
    }

    fn run(self) -> Result<(), AppError> {
        self.runtime
            .block_on(run_server(self.context))
            .map_err(|e| AppError::Fatal(e.to_string()))
    }
}

impl AppError {
    fn hint(&self) -> String {
        match self {
            AppError::Config(_) => format!("Make sure the config file exists (set BANNERBOARD_CONFIG to use another path than {DEFAULT_CONFIG_PATH}) and sets keys.jwt and keys.password."),
            AppError::Database(_) => "This is a database error. Make sure the database url points to a writable location, then try again.".to_string(),
            AppError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn main() {
    logging::init_logger(env::var_os("BANNERBOARD_DEBUG").is_some());

    let result = App::new().and_then(|app| {
        info!("Initialized successfully.");
        app.run()
    });

    if let Err(error) = result {
        error!(
            "{} Read the error below to troubleshoot the issue.",
            "bannerboard failed to start!".bold().red()
        );
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
        std::process::exit(1);
    }
}
