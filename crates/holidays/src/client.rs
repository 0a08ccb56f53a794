use anyhow::{Context, Result};
use colored::Colorize;

use holidays_client::{HttpClient, Record, SyncedRecords};

/// Connection settings shared by the client subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of the holidays server
    #[arg(long, env = "HOLIDAYS_SERVER", default_value = "http://localhost:3003")]
    pub server: String,

    /// Bearer token from `holidays login`
    #[arg(long, env = "HOLIDAYS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl ClientArgs {
    fn client(&self) -> HttpClient {
        let client = HttpClient::new(&self.server);
        match &self.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }

    fn signed_in_client(&self) -> Result<HttpClient> {
        if self.token.is_none() {
            anyhow::bail!("Not signed in. Run 'holidays login' and set HOLIDAYS_TOKEN.");
        }
        Ok(self.client())
    }

    async fn loaded(&self, require_token: bool) -> Result<SyncedRecords<HttpClient>> {
        let client = if require_token {
            self.signed_in_client()?
        } else {
            self.client()
        };
        let synced = SyncedRecords::new(client);
        synced
            .load()
            .await
            .with_context(|| format!("Failed to load records from {}", self.server))?;
        Ok(synced)
    }
}

pub async fn handle_list_command(args: &ClientArgs, json: bool) -> Result<()> {
    let synced = args.loaded(false).await?;
    let records = synced.records();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No holidays yet. Add one with 'holidays add <name>'.");
        return Ok(());
    }
    print_records_table(&records);
    Ok(())
}

pub async fn handle_add_command(args: &ClientArgs, name: &str) -> Result<()> {
    let synced = args.loaded(true).await?;
    let record = synced.create(name).await.context("Failed to add holiday")?;
    eprintln!("{} Added {}", "+".bright_green(), record.name.bold());
    println!("{}", record.id);
    Ok(())
}

pub async fn handle_toggle_command(args: &ClientArgs, id: &str) -> Result<()> {
    let synced = args.loaded(true).await?;
    let record = synced.toggle(id).await.context("Failed to toggle holiday")?;
    let state = if record.completed {
        "celebrated".bright_green()
    } else {
        "upcoming".bright_cyan()
    };
    eprintln!("{} is now {}", record.name.bold(), state);
    Ok(())
}

pub async fn handle_like_command(args: &ClientArgs, id: &str) -> Result<()> {
    let synced = args.loaded(true).await?;
    let record = synced.like(id).await.context("Failed to like holiday")?;
    eprintln!("{} has {} like(s)", record.name.bold(), record.popularity);
    Ok(())
}

pub async fn handle_delete_command(args: &ClientArgs, id: &str) -> Result<()> {
    let synced = args.loaded(true).await?;
    let name = synced.get(id).map(|r| r.name);
    synced.delete(id).await.context("Failed to delete holiday")?;
    eprintln!(
        "{} Deleted {}",
        "-".bright_red(),
        name.as_deref().unwrap_or(id).bold()
    );
    Ok(())
}

pub async fn handle_register_command(args: &ClientArgs, username: &str, password: &str) -> Result<()> {
    let account = args
        .client()
        .register(username, password)
        .await
        .context("Failed to register")?;
    eprintln!(
        "{} Registered {}. Sign in with 'holidays login {}'.",
        "+".bright_green(),
        account.username.bold(),
        account.username
    );
    Ok(())
}

pub async fn handle_login_command(args: &ClientArgs, username: &str, password: &str) -> Result<()> {
    let client = args.client();
    let token = client
        .sign_in(username, password)
        .await
        .context("Failed to sign in")?;
    eprintln!(
        "{} Signed in as {}",
        "->".bright_green(),
        client.current_user().as_deref().unwrap_or(username).bold()
    );
    eprintln!("  {} export HOLIDAYS_TOKEN={}", "->".dimmed(), token);
    println!("{}", token);
    Ok(())
}

pub async fn handle_logout_command(args: &ClientArgs) -> Result<()> {
    let client = args.signed_in_client()?;
    client.sign_out().await.context("Failed to sign out")?;
    eprintln!("Signed out. Unset HOLIDAYS_TOKEN to forget the token.");
    Ok(())
}

fn print_records_table(records: &[Record]) {
    println!(
        "{:<36}  {:<10} {:<6} {}",
        "ID".dimmed(),
        "STATUS".dimmed(),
        "LIKES".dimmed(),
        "NAME".dimmed(),
    );

    for r in records {
        let status = if r.completed {
            format!("{:<10}", "done").bright_green().to_string()
        } else {
            format!("{:<10}", "upcoming").bright_cyan().to_string()
        };
        println!("{:<36}  {} {:<6} {}", r.id, status, r.popularity, r.name);
    }
}
