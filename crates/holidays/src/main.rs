mod client;
mod config;
mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use holidays_logging::{init_tracing, LogFormat};

use client::ClientArgs;
use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(
    name = "holidays",
    about = "Shared holiday tracker: API server and command-line client",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the API server
    Serve(ServeArgs),

    #[command(flatten)]
    Client(ClientCommand),
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// List all holidays
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Add a holiday
    Add {
        name: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Flip a holiday between upcoming and celebrated
    Toggle {
        id: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Add one like to a holiday
    Like {
        id: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Delete a holiday
    Delete {
        id: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Create an account
    Register {
        username: String,

        #[arg(long, env = "HOLIDAYS_PASSWORD", hide_env_values = true)]
        password: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Sign in and print a bearer token
    Login {
        username: String,

        #[arg(long, env = "HOLIDAYS_PASSWORD", hide_env_values = true)]
        password: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// End the current session
    Logout {
        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Config file (default: ./holidays.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    port: Option<u16>,

    /// Database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormatChoice>,

    /// Allowed browser origin; repeat to allow several. Replaces the configured list.
    #[arg(long = "allow-origin")]
    allow_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

impl ServeArgs {
    /// Layer command-line overrides over the file configuration.
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = self.database {
            config.database = Some(database);
        }
        if let Some(format) = self.log_format {
            config.log_format = format.into();
        }
        if !self.allow_origins.is_empty() {
            config.allowed_origins = self.allow_origins;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let working_dir = std::env::current_dir().context("Failed to get current directory")?;
            let file_config = ServerConfig::resolve(args.config.as_deref(), &working_dir)?;
            let config = args.apply(file_config);

            let _guard = init_tracing(&config.log_level, config.log_format, config.log_dir.as_deref());
            serve::handle_serve_command(config).await
        }
        Commands::Client(command) => {
            let _guard = init_tracing("warn", LogFormat::Compact, None);
            run_client_command(command).await
        }
    }
}

async fn run_client_command(command: ClientCommand) -> Result<()> {
    match command {
        ClientCommand::List { json, client } => client::handle_list_command(&client, json).await,
        ClientCommand::Add { name, client } => client::handle_add_command(&client, &name).await,
        ClientCommand::Toggle { id, client } => client::handle_toggle_command(&client, &id).await,
        ClientCommand::Like { id, client } => client::handle_like_command(&client, &id).await,
        ClientCommand::Delete { id, client } => client::handle_delete_command(&client, &id).await,
        ClientCommand::Register {
            username,
            password,
            client,
        } => client::handle_register_command(&client, &username, &password).await,
        ClientCommand::Login {
            username,
            password,
            client,
        } => client::handle_login_command(&client, &username, &password).await,
        ClientCommand::Logout { client } => client::handle_logout_command(&client).await,
    }
}
