//! Command-line arguments.

use std::path::PathBuf;

use billwise_core::ResolutionChoice;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "billwise", version, about = "Invoice totals, project drafts and client records")]
pub struct Cli {
    /// Config file (defaults to billwise.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute invoice totals from an invoice JSON file
    Totals {
        file: PathBuf,

        /// Print rounded totals as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Check a project draft JSON file
    Validate { file: PathBuf },

    /// Normalize an extraction payload and print the drafts
    Extract { file: PathBuf },

    /// Save drafts from a payload or draft file (or resume the pending draft)
    Import {
        /// Extraction payload or engagement draft; omit to resume
        file: Option<PathBuf>,

        /// Add the project to this existing client
        #[arg(long)]
        client_id: Option<String>,

        /// Answer for a duplicate: add-to-client, create-new-client,
        /// update-existing, create-version, delete-and-replace
        #[arg(long)]
        resolution: Option<ResolutionChoice>,

        /// Never prompt; fail when a decision is needed
        #[arg(long)]
        no_input: bool,
    },

    /// Client records
    Clients {
        #[command(subcommand)]
        command: ClientCommands,
    },

    /// The pending (unsaved) draft
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// Show or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ClientCommands {
    /// Search clients by name or email
    Search { query: String },
}

#[derive(Debug, Subcommand)]
pub enum DraftCommands {
    Show,
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from([
            "billwise",
            "import",
            "payload.json",
            "--client-id",
            "c1",
            "--resolution",
            "create-version",
            "--no-input",
        ])
        .unwrap();

        match cli.command {
            Commands::Import {
                file,
                client_id,
                resolution,
                no_input,
            } => {
                assert_eq!(file, Some(PathBuf::from("payload.json")));
                assert_eq!(client_id.as_deref(), Some("c1"));
                assert_eq!(resolution, Some(ResolutionChoice::CreateVersion));
                assert!(no_input);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_resolution_is_rejected() {
        assert!(Cli::try_parse_from(["billwise", "import", "--resolution", "merge-all"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["billwise", "draft", "show", "--config", "/tmp/b.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/b.toml")));
        assert!(matches!(cli.command, Commands::Draft { command: DraftCommands::Show }));
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["billwise", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Init { force: true }
            }
        ));
    }
}
