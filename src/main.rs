//! OpenSRS client CLI entry point.
//!
//! Runs single registrar operations and prints the decoded attributes as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use opensrs_client::config::{ENV_API_KEY, ENV_ENDPOINT, ENV_USERNAME};
use opensrs_client::tools::{self, ToolCall};
use opensrs_client::{AttributeValue, ClientConfig, Environment, XcpClient};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "opensrs")]
#[command(author, version, about = "Client for the OpenSRS XCP API")]
struct Args {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reseller username
    #[arg(long, env = ENV_USERNAME)]
    username: Option<String>,

    /// API key used to sign requests
    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint URL, overrides --env
    #[arg(long, env = ENV_ENDPOINT)]
    endpoint: Option<String>,

    /// Registrar environment (production, test)
    #[arg(long = "env")]
    environment: Option<Environment>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the reseller balance
    Balance,
    /// List domains expiring inside a date window
    Domains {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        exp_from: String,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        exp_to: String,
        #[arg(long, default_value_t = tools::DEFAULT_LIST_LIMIT)]
        limit: u32,
    },
    /// Show the DNS zone of a domain
    Zone { domain: String },
    /// Insert or update one A record, keeping all other records
    UpsertA {
        domain: String,
        /// Subdomain, empty or "@" for the apex
        #[arg(long, default_value = "")]
        subdomain: String,
        #[arg(long)]
        ip: String,
    },
    /// List available tools
    Tools,
    /// Invoke a tool by name with JSON arguments
    CallTool {
        name: String,
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Send an arbitrary object/action pair
    Raw {
        object: String,
        action: String,
        /// Attributes as a JSON object
        #[arg(long, default_value = "{}")]
        attrs: String,
    },
    /// Print example configuration and exit
    ExampleConfig,
    /// Validate configuration and exit
    Validate,
}

fn print_example_config() {
    let example = r#"# OpenSRS client configuration example
username: "reseller"
# Prefer OPENSRS_API_KEY in the environment over storing the key here
api_key: ""
# production or test
environment: production
# Overrides the environment's endpoint when set
# endpoint: "https://rr-n1-tor.opensrs.net:55443/"
# Request timeout (ms)
timeout_ms: 70000
"#;
    println!("{}", example);
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(environment) = args.environment {
        config.environment = environment;
    }
    // clap already folded the OPENSRS_* variables into these
    config.apply_overrides(
        args.username.clone(),
        args.api_key.clone(),
        args.endpoint.clone(),
    );
    Ok(config)
}

fn connect(args: &Args) -> Result<XcpClient> {
    let config = load_config(args)?;
    XcpClient::from_config(&config).context("Failed to create OpenSRS client")
}

fn parse_json(input: &str, what: &str) -> Result<serde_json::Value> {
    serde_json::from_str(input).with_context(|| format!("Invalid JSON for {}", what))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let output = match &args.command {
        Command::ExampleConfig => {
            print_example_config();
            return Ok(());
        }
        Command::Tools => serde_json::to_value(tools::catalog())?,
        Command::Validate => {
            let config = load_config(&args)?;
            config.validate().context("Configuration is invalid")?;
            info!(endpoint = %config.endpoint(), "Configuration is valid");
            return Ok(());
        }
        Command::Balance => connect(&args)?.get_balance().await?.to_json(),
        Command::Domains {
            exp_from,
            exp_to,
            limit,
        } => connect(&args)?
            .get_domains_by_expiredate(exp_from, exp_to, *limit)
            .await?
            .to_json(),
        Command::Zone { domain } => connect(&args)?.get_dns_zone(domain).await?.to_json(),
        Command::UpsertA {
            domain,
            subdomain,
            ip,
        } => {
            let subdomain = if subdomain == "@" { "" } else { subdomain.as_str() };
            let call = ToolCall::UpsertARecord {
                domain: domain.clone(),
                subdomain: subdomain.to_string(),
                ip_address: ip.clone(),
            };
            call.execute(&connect(&args)?).await?
        }
        Command::CallTool { name, args: tool_args } => {
            let tool_args = parse_json(tool_args, "--args")?;
            let call = ToolCall::parse(name, &tool_args)?;
            call.execute(&connect(&args)?).await?
        }
        Command::Raw {
            object,
            action,
            attrs,
        } => {
            let attributes = match AttributeValue::from_json(&parse_json(attrs, "--attrs")?) {
                AttributeValue::Mapping(map) => map,
                _ => anyhow::bail!("--attrs must be a JSON object"),
            };
            let outcome = connect(&args)?.call(object, action, &attributes).await?;
            serde_json::json!({
                "response_code": outcome.response_code,
                "response_text": outcome.response_text,
                "attributes": outcome.attributes,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
