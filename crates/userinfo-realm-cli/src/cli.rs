//! Command-line interface

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::debug;
use userinfo_realm::{OAuthRealm, Realm, RealmConfig, extract_token};

use crate::error::{CliError, CliResult};

/// userinfo-realm - run OAuth2 userinfo authentication decisions
#[derive(Parser, Debug)]
#[command(
    name = "userinfo-realm",
    version,
    about = "Run OAuth2 userinfo realm authentication decisions from the command line"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (-v, -vv, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log line format
    #[arg(
        long,
        value_enum,
        default_value = "text",
        global = true,
        env = "USERINFO_REALM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract credentials from headers and authenticate them
    Check(CheckArgs),

    /// Show which principal the headers assert, without contacting the provider
    Extract(HeaderArgs),

    /// Print the effective realm configuration (secrets omitted)
    ShowConfig(ConfigArgs),
}

/// Request headers
#[derive(Args, Debug, Clone)]
pub struct HeaderArgs {
    /// Request header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

impl HeaderArgs {
    /// Headers as a map; later duplicates win
    pub fn to_map(&self) -> HashMap<String, String> {
        self.headers.iter().cloned().collect()
    }
}

/// Configuration source
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file (TOML, YAML or JSON); defaults to environment variables
    #[arg(short, long, env = "USERINFO_REALM_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Load the realm configuration
    ///
    /// # Errors
    ///
    /// Returns the realm's configuration error.
    pub fn load(&self) -> CliResult<RealmConfig> {
        let config = match &self.config {
            Some(path) => RealmConfig::from_file(path)?,
            None => RealmConfig::from_env()?,
        };
        Ok(config)
    }
}

/// Arguments for `check`
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub headers: HeaderArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the exchange timeout, in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

/// Parse a `Name: value` header argument
///
/// # Errors
///
/// Returns a message when there is no colon or the name is empty.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header '{raw}' must be of the form 'Name: value'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header '{raw}' has an empty name"));
    }
    Ok((name.to_string(), value.trim_start().to_string()))
}

impl Command {
    /// Run the command, printing JSON to stdout
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the command fails or authentication is rejected.
    pub async fn execute(self) -> CliResult<()> {
        match self {
            Self::Check(args) => check(args).await,
            Self::Extract(args) => extract(&args),
            Self::ShowConfig(args) => show_config(&args),
        }
    }
}

async fn check(args: CheckArgs) -> CliResult<()> {
    let mut config = args.config.load()?;
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }
    let realm = OAuthRealm::new(config)?;
    debug!(realm = realm.name(), "Realm ready");

    let headers = args.headers.to_map();
    let token = realm
        .extract_token(&headers)?
        .ok_or(CliError::NoCredentials)?;

    match realm.authenticate(&token).await {
        Ok(user) => {
            print_json(&json!({ "authenticated": true, "user": user }))?;
            Ok(())
        }
        Err(e) => {
            print_json(&json!({
                "authenticated": false,
                "kind": e.kind().as_str(),
                "message": e.client_message(),
            }))?;
            Err(CliError::Rejected {
                kind: e.kind(),
                source: e,
            })
        }
    }
}

fn extract(args: &HeaderArgs) -> CliResult<()> {
    let token = extract_token(&args.to_map())?.ok_or(CliError::NoCredentials)?;
    print_json(&json!({
        "principal": token.principal(),
        "empty_credential": token.has_empty_credential(),
    }))
}

fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let config = args.load()?;
    print_json(&json!({
        "config": config,
        "client_secret_set": config.client_secret.is_some(),
        "authorization_url": config.authorization_url()?.as_str(),
        "token_url": config.token_url()?.as_str(),
    }))
}

fn print_json(value: &serde_json::Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Authorization: Basic YWxpY2U6cHc=").unwrap(),
            ("Authorization".to_string(), "Basic YWxpY2U6cHc=".to_string())
        );
        assert_eq!(
            parse_header("Password: prefix:secret").unwrap(),
            ("Password".to_string(), "prefix:secret".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_cli_parsing_check() {
        let cli = Cli::try_parse_from([
            "userinfo-realm",
            "-vv",
            "check",
            "-H",
            "User: alice",
            "-H",
            "Password: secret",
            "--config",
            "realm.toml",
            "--timeout",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Text);
        let Command::Check(args) = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(args.timeout, Some(5));
        assert_eq!(args.config.config, Some(PathBuf::from("realm.toml")));
        let headers = args.headers.to_map();
        assert_eq!(headers.get("User").map(String::as_str), Some("alice"));
        assert_eq!(headers.get("Password").map(String::as_str), Some("secret"));
    }

    #[test]
    fn test_cli_parsing_extract_and_global_flags() {
        let cli = Cli::try_parse_from([
            "userinfo-realm",
            "extract",
            "--header",
            "Authorization: Basic YWxpY2U6cHc=",
            "--log-format",
            "json",
            "-q",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Extract(_)));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["userinfo-realm", "-q", "-v", "show-config"]).is_err());
    }

    #[test]
    fn test_malformed_header_argument_rejected() {
        assert!(Cli::try_parse_from(["userinfo-realm", "extract", "-H", "bogus"]).is_err());
    }

    #[test]
    fn test_extract_without_credentials() {
        let args = HeaderArgs {
            headers: vec![("Accept".to_string(), "*/*".to_string())],
        };
        assert!(matches!(extract(&args), Err(CliError::NoCredentials)));
    }

    #[test]
    fn test_extract_reports_principal() {
        let args = HeaderArgs {
            headers: vec![
                ("User".to_string(), "alice".to_string()),
                ("Password".to_string(), "pw".to_string()),
            ],
        };
        assert!(extract(&args).is_ok());
    }
}
