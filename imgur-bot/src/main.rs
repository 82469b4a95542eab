use anyhow::{Context, Result};
use botkit::config::{load_config, BotConfig, Configuration};
use botkit::credentials::{AccessTokenRecord, TokenStore};
use botkit::transport::HttpTransport;
use botkit::Bot;
use clap::Parser;
use imgur_bot::authorize::{self, REDIRECT_TIMEOUT};
use imgur_bot::cli::{self, Cli, Commands};
use imgur_bot::jobs::all_jobs;
use imgur_bot::{Imgur, ImgurProvider};
use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

const ENCRYPTION_KEY_VAR: &str = "BOT_ENCRYPTION_KEY";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgur_bot=info,botkit=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Jobs = cli.command {
        for job in all_jobs().jobs() {
            println!("{:<8} {}", job.name(), job.usage());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli.config)?;
    info!(
        config = %cli.config.display(),
        applications = config.applications.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Job {
            name,
            account,
            args,
        } => run_job(&config, &name, &account, &args).await,
        Commands::Authorize { account, manual } => {
            let store = open_store(&config)?;
            let imgur = build_adapter(&config, &account)?;
            let record = if manual {
                let url = imgur.bot().access_token_url(&imgur.bot().configuration().scopes);
                println!("Open this URL, then paste the URL you were redirected to:\n\n  {}\n", url);
                let redirect_url = read_line().context("Failed to read redirect URL")?;
                authorize::authorize_from_redirect_url(&imgur, redirect_url.trim()).await?
            } else {
                authorize::authorize_with_listener(&imgur, REDIRECT_TIMEOUT, |url| {
                    println!("Open this URL to authorize '{}':\n\n  {}\n", account.app, url);
                })
                .await?
            };
            save_token(&store, &account, &record)?;
            println!("Authorized '{}' as '{}'", account.app, record_user(&record, &account));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Refresh { account } => {
            let store = open_store(&config)?;
            let imgur = build_adapter(&config, &account)?;
            let stored = store
                .get(&account.app, &account.user)?
                .with_context(|| format!("No stored token for {}/{}", account.app, account.user))?;
            imgur.bot().set_access_token(stored);

            let record = imgur.bot().refresh_access_token().await?;
            save_token(&store, &account, &record)?;
            println!("Refreshed token for '{}/{}'", account.app, account.user);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logout { account } => {
            let store = open_store(&config)?;
            if store.delete(&account.app, &account.user)? {
                info!(application = %account.app, user = %account.user, "Token deleted");
                println!("Logged out '{}/{}'", account.app, account.user);
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("No stored token for {}/{}", account.app, account.user);
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Users { app } => {
            config.select(&app)?;
            let store = open_store(&config)?;
            for user in store.list_users(&app)? {
                println!("{}", user);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Jobs => Ok(ExitCode::SUCCESS),
    }
}

async fn run_job(
    config: &BotConfig,
    name: &str,
    account: &cli::Account,
    args: &[String],
) -> Result<ExitCode> {
    let imgur = build_adapter(config, account)?;
    if let Some(record) = load_token(config, account, imgur.bot().configuration())? {
        imgur.bot().set_access_token(record);
    }

    match all_jobs().dispatch(name, &imgur, args).await {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(data.json())?);
            info!(
                job = %name,
                remaining_requests = imgur.bot().remaining_requests(),
                "Job finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Job '{}' failed: {}", name, e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn build_adapter(config: &BotConfig, account: &cli::Account) -> Result<Imgur> {
    let configuration = config.select(&account.app)?;
    let transport = HttpTransport::new().context("Failed to build HTTP client")?;
    let bot = Bot::new(Arc::new(ImgurProvider), Arc::new(transport), configuration)
        .with_request_timeout(config.request_timeout());
    Ok(Imgur::from_bot(bot))
}

fn open_store(config: &BotConfig) -> Result<TokenStore> {
    let key = std::env::var(ENCRYPTION_KEY_VAR)
        .with_context(|| format!("{} is required (base64-encoded 32-byte key)", ENCRYPTION_KEY_VAR))?;
    TokenStore::new(&config.token_db, &key).context("Failed to open token store")
}

/// Stored token for the account, else the pre-issued token from the
/// configuration file.
fn load_token(
    config: &BotConfig,
    account: &cli::Account,
    configuration: &Configuration,
) -> Result<Option<AccessTokenRecord>> {
    if std::env::var(ENCRYPTION_KEY_VAR).is_ok() {
        let store = open_store(config)?;
        if let Some(record) = store.get(&account.app, &account.user)? {
            return Ok(Some(record));
        }
    } else {
        warn!("{} not set, skipping token store", ENCRYPTION_KEY_VAR);
    }

    Ok(configuration
        .access_token
        .as_ref()
        .filter(|token| !token.is_empty())
        .map(|token| AccessTokenRecord::bearer(token.clone(), account.user.clone())))
}

fn save_token(store: &TokenStore, account: &cli::Account, record: &AccessTokenRecord) -> Result<()> {
    store
        .store(&account.app, &account.user, record)
        .with_context(|| format!("Failed to store token for {}/{}", account.app, account.user))
}

fn record_user<'a>(record: &'a AccessTokenRecord, account: &'a cli::Account) -> &'a str {
    if record.user.is_empty() {
        &account.user
    } else {
        &record.user
    }
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
