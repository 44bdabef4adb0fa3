//! rackctl - bare metal site configuration CLI.
//!
//! This is the entry point for the `rackctl` binary.

mod args;
mod commands;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use rackctl_control::ConfigError;
use tracing_subscriber::EnvFilter;

use args::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "warn,rackctl=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    let store = cli.store();
    tracing::debug!(
        profile = %store.profile_path().display(),
        kubeconfig = %store.kubeconfig_path().display(),
        "Using configuration files"
    );

    let mut stdout = io::stdout().lock();
    match commands::run(cli.command, &store, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<ConfigError>().map_or(1, ConfigError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
