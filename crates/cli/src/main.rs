//! Inkvault marketplace command-line client

use std::{
    io::{self, Write},
    process::ExitCode,
};

use inkvault_app::context::AppContext;
use tracing::{debug, error};

use crate::config::CliConfig;

mod commands;
mod config;
mod logging;
mod output;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(error) => {
            _ = error.print();

            return ExitCode::from(2);
        }
    };

    if let Err(error) = logging::init_subscriber(&config.logging) {
        _ = writeln!(io::stderr(), "failed to initialise logging: {error}");

        return ExitCode::FAILURE;
    }

    let ctx = match AppContext::from_config(config.backend.to_config(), config.tuning.settings()) {
        Ok(ctx) => ctx,
        Err(error) => {
            error!(%error, "startup failed");

            return ExitCode::FAILURE;
        }
    };

    let result = commands::run(&ctx, &config.account, config.command, &mut io::stdout().lock()).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            debug!(?error, kind = ?error.kind(), "command failed");

            _ = writeln!(io::stderr(), "{}", error.user_message());

            ExitCode::FAILURE
        }
    }
}
