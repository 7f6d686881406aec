//! # Billwise CLI Library
//!
//! Everything behind the `billwise` binary: configuration, the error type,
//! the create-project flow and the commands.
//!
//! ## Module Organization
//! ```text
//! billwise_cli/
//! ├── lib.rs          ◄─── You are here (logging, startup, dispatch)
//! ├── cli.rs          ◄─── clap argument types
//! ├── config.rs       ◄─── AppConfig (TOML + environment)
//! ├── error.rs        ◄─── ApiError returned by every command
//! ├── flow.rs         ◄─── ProjectFlow<S: RecordStore>
//! └── commands/
//!     ├── totals.rs   ◄─── invoice totals table
//!     ├── validate.rs ◄─── draft validation report
//!     ├── extract.rs  ◄─── extraction payload → drafts
//!     ├── import.rs   ◄─── validate, reconcile, persist
//!     ├── clients.rs  ◄─── client search
//!     ├── draft.rs    ◄─── pending draft show/clear
//!     └── settings.rs ◄─── config show/init
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize Logging (stderr, RUST_LOG or the default filter)        │
//! │  2. Load AppConfig (--config or platform default, then environment)    │
//! │  3. Open what the command needs:                                       │
//! │     • Database (SQLite, WAL, migrations) for import / clients          │
//! │     • FileDraftStore for import / draft                                │
//! │  4. Run the command; errors become an exit code                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod flow;

use billwise_db::{Database, DbConfig, FileDraftStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use billwise_core::validation::validate_record_id;
use cli::{Cli, ClientCommands, Commands, ConfigCommands, DraftCommands};
use commands::import::{ImportOptions, InquirePrompter};
use config::AppConfig;
use flow::ProjectFlow;

pub use error::{ApiError, ApiResult, ErrorCode};

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=billwise=trace` - Show trace for billwise crates only
/// - Default: INFO, DEBUG for billwise crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,billwise=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens the record store named by the config.
pub async fn open_database(config: &AppConfig) -> ApiResult<Database> {
    let db_config = DbConfig::new(&config.database.path).max_connections(config.database.max_connections);
    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");
    Ok(db)
}

pub fn draft_store(config: &AppConfig) -> FileDraftStore {
    FileDraftStore::new(&config.drafts.path)
}

/// Runs one parsed command line.
pub async fn run(cli: Cli) -> ApiResult<()> {
    if let Commands::Config {
        command: ConfigCommands::Init { force },
    } = cli.command
    {
        return commands::settings::init(cli.config, force).map(|_| ());
    }

    let config = AppConfig::load(cli.config)?;

    match cli.command {
        Commands::Totals { file, json } => commands::totals::run(&config, &file, json),
        Commands::Validate { file } => commands::validate::run(&file),
        Commands::Extract { file } => commands::extract::run(&config, &file),
        Commands::Import {
            file,
            client_id,
            resolution,
            no_input,
        } => {
            if let Some(id) = &client_id {
                validate_record_id(id).map_err(|e| ApiError::invalid_input(format!("--client-id: {}", e)))?;
            }
            let db = open_database(&config).await?;
            let flow = match client_id {
                Some(id) => ProjectFlow::new(db).for_client(id),
                None => ProjectFlow::new(db),
            };
            let options = ImportOptions {
                file,
                resolution,
                interactive: !no_input,
            };
            let result = commands::import::run(&flow, &draft_store(&config), &config, &options, &InquirePrompter).await;
            flow.store().close().await;
            result
        }
        Commands::Clients {
            command: ClientCommands::Search { query },
        } => {
            let db = open_database(&config).await?;
            let result = commands::clients::run(&db, &query).await;
            db.close().await;
            result
        }
        Commands::Draft { command } => {
            let drafts = draft_store(&config);
            match command {
                DraftCommands::Show => commands::draft::show(&drafts),
                DraftCommands::Clear => commands::draft::clear(&drafts),
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::settings::show(&config),
            ConfigCommands::Init { .. } => Ok(()),
        },
    }
}
