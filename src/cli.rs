//! Command-line interface for flarerelay
//!
//! Provides argument parsing and subcommand handling for the flarerelay binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// JSON relay in front of Cloudflare Workers AI and OpenRouter
#[derive(Parser)]
#[command(name = "flarerelay")]
#[command(version)]
#[command(about = "JSON relay in front of Cloudflare Workers AI and OpenRouter")]
#[command(
    long_about = "flarerelay accepts small JSON generation requests, forwards them to \
    Cloudflare Workers AI or OpenRouter and relays the answer, optionally decoding \
    the model's output as JSON. Credentials are read from the environment."
)]
pub struct Cli {
    /// Optional TOML configuration file (environment variables override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on (overrides config file and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# flarerelay configuration
# =========================
#
# Every setting is optional. Environment variables override this file:
#
#   CLOUDFLARE_ACCOUNT_ID | CF_ACCOUNT_ID
#   CLOUDFLARE_API_TOKEN  | CF_TOKEN | CLOUDFLARE_AUTH_TOKEN
#   CLOUDFLARE_MODEL
#   OPENROUTER_API_KEY    | OR_API_KEY
#   OPENROUTER_PERPLEXITY_MODEL
#   PORT
#
# Prefer the environment for credentials.

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"
port = 8787

# Upstream request timeout in seconds (1-300). Leave unset for no timeout.
# request_timeout_seconds = 60

[cloudflare]
# account_id = "your-account-id"
# api_token = "your-api-token"

# Models starting with "@" (e.g. "@cf/...", "@hf/...") are run directly;
# anything else goes through the generic responses endpoint.
model = "@cf/meta/llama-3.1-8b-instruct-fast"
sentiment_model = "@cf/huggingface/distilbert-sst-2-int8"
base_url = "https://api.cloudflare.com/client/v4"

[openrouter]
# api_key = "your-openrouter-key"
model = "perplexity/sonar"
base_url = "https://openrouter.ai/api/v1"

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments() {
        let cli = Cli::parse_from(["flarerelay"]);
        assert!(cli.config.is_none());
        assert!(cli.port.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_and_port() {
        let cli = Cli::parse_from(["flarerelay", "--config", "relay.toml", "--port", "9090"]);
        assert_eq!(cli.config, Some(PathBuf::from("relay.toml")));
        assert_eq!(cli.port, Some(9090));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["flarerelay", "config", "-o", "relay.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "relay.toml"
        ));
    }

    #[test]
    fn template_is_a_valid_config() {
        let config = Config::from_str(generate_config_template())
            .expect("template should parse and validate");
        assert_eq!(config.server.port, 8787);
        assert!(config.cloudflare.credentials().is_err());
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[server]"));
        assert!(template.contains("[cloudflare]"));
        assert!(template.contains("[openrouter]"));
        assert!(template.contains("[observability]"));
    }
}
