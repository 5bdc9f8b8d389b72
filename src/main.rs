//! vkg-provider - declarative Google Calendar event resources
//!
//! This binary implements the provider protocol, communicating with the
//! orchestrator via JSON over stdin/stdout: one request per line, one
//! response per line. Logs go to stderr, filtered by `VKG_LOG`.
//!
//! Configuration:
//!   ~/.config/vkg/provider.toml

mod catalog;
mod commands;
mod config;
mod convert;
mod credentials;
mod google;
#[cfg(test)]
mod testing;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::commands::Provider;
use crate::config::ProviderConfig;
use crate::google::GoogleCalendar;

const LOG_ENV: &str = "VKG_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match ProviderConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let provider: Provider<GoogleCalendar> = Provider::new(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                return ExitCode::FAILURE;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = provider.handle_line(&line).await;

        if let Err(e) = writeln!(stdout, "{}", response).and_then(|_| stdout.flush()) {
            error!("Failed to write response: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
