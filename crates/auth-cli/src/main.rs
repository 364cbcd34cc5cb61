//! authctl - sign in to a GraphQL API and run authenticated operations.

mod commands;
mod navigator;
mod output;

use std::path::PathBuf;

use auth_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use output::OutputFormat;
use tracing::debug;

/// authctl command-line interface.
#[derive(Parser)]
#[command(name = "authctl")]
#[command(about = "Sign in to a GraphQL API and run authenticated operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(long, env = "AUTHCTL_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Base directory for config, credentials and logs. Defaults to ~/.authctl
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// GraphQL endpoint, overriding the configured one
    #[arg(long, global = true)]
    graphql_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account and log in
    Register {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,
        /// First name
        #[arg(long)]
        first_name: Option<String>,
        /// Last name
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Logout and clear stored credentials
    Logout,

    /// Ask the server who the stored credentials belong to
    Whoami,

    /// Show the local session without contacting the server
    Status,

    /// Run a GraphQL operation with the stored credentials
    Query {
        /// Operation name
        name: String,
        /// Operation document
        #[arg(short, long, conflicts_with = "file")]
        document: Option<String>,
        /// Read the operation document from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Variable as KEY=VALUE; VALUE is parsed as JSON when possible
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
        /// Send as a mutation
        #[arg(long)]
        mutation: bool,
        /// Bypass the response cache
        #[arg(long)]
        network_only: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };

    // Load configuration
    let mut config = Config::load(&paths)?;
    if let Some(url) = cli.graphql_url {
        config.graphql_url = url;
        config.validate()?;
    }

    // Initialize logging
    init_logging(
        resolve_log_level(cli.log_level.as_deref(), &config),
        Some(paths.log_file()),
        true,
    );
    debug!(
        graphql_url = %config.graphql_url,
        base_dir = %paths.base_dir().display(),
        "Configuration loaded"
    );

    let ctx = commands::Context::new(paths, &config)?;
    let format = cli.format;

    match cli.command {
        Commands::Login { email } => commands::login(&ctx, email, &format).await?,
        Commands::Register {
            email,
            first_name,
            last_name,
        } => commands::register(&ctx, email, first_name, last_name, &format).await?,
        Commands::Logout => commands::logout(&ctx, &format),
        Commands::Whoami => commands::whoami(&ctx, &format).await?,
        Commands::Status => commands::status(&ctx, &format),
        Commands::Query {
            name,
            document,
            file,
            vars,
            mutation,
            network_only,
        } => {
            let request = commands::QueryRequest {
                name,
                document,
                file,
                vars,
                mutation,
                network_only,
            };
            commands::query(&ctx, request).await?
        }
    }

    Ok(())
}

/// The `--log-level` flag wins over the configured level.
fn resolve_log_level<'a>(flag: Option<&'a str>, config: &'a Config) -> &'a str {
    flag.map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(config.log_level.as_str())
}
