//! # userinfo-realm-cli
//!
//! Operator tool for the userinfo realm: run one authentication decision
//! against a configured provider, inspect which principal a set of headers
//! asserts, or print the effective configuration.
//!
//! ```text
//! userinfo-realm check -H 'Authorization: Basic YWxpY2U6dG9rZW4=' --config realm.toml
//! userinfo-realm extract -H 'User: alice' -H 'Password: token'
//! userinfo-realm show-config
//! ```

pub mod cli;
pub mod error;
pub mod logging;

use clap::Parser;

pub use cli::{Cli, Command, LogFormat};
pub use error::{CliError, CliResult};

/// Parse arguments, set up logging and run the selected command
///
/// # Errors
///
/// Returns an error if logging cannot be installed or the command fails.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_format)?;

    if let Err(e) = cli.command.execute().await {
        for hint in e.suggestions() {
            eprintln!("hint: {hint}");
        }
        return Err(e.into());
    }
    Ok(())
}
