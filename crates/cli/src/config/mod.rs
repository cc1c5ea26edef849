//! Command-line configuration

use clap::Parser;

use crate::{
    commands::Command,
    config::{
        account::AccountArgs, backend::BackendArgs, observability::LoggingConfig,
        tuning::TuningArgs,
    },
};

pub(crate) mod account;
pub(crate) mod backend;
pub(crate) mod observability;
pub(crate) mod tuning;

/// Inkvault marketplace client configuration
#[derive(Debug, Parser)]
#[command(name = "inkvault", about = "Inkvault marketplace client", long_about = None)]
pub(crate) struct CliConfig {
    /// Backend connection settings.
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Account used to sign in.
    #[command(flatten)]
    pub account: AccountArgs,

    /// Catalog and maintenance tunables.
    #[command(flatten)]
    pub tuning: TuningArgs,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
