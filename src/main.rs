//! ircwarden CLI entry point

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ircwarden::{Bot, BotError, Cli, Commands, SessionConfig, Store};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Logs go to stderr so stdout stays free for command output
fn init_tracing(cli: &Cli) {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = cli.log_directive().parse() {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> ircwarden::Result<SessionConfig> {
    match &cli.config {
        Some(path) => SessionConfig::load_from(path),
        None => SessionConfig::load(),
    }
}

fn open_store(config: &SessionConfig) -> ircwarden::Result<Store> {
    let path = config.resolved_store_path().ok_or_else(|| BotError::Store {
        message: "No store path configured and no data directory available".to_string(),
    })?;
    Store::open(&path)
}

fn run(cli: &Cli) -> ircwarden::Result<String> {
    let config = load_config(cli)?;
    match cli.command() {
        Commands::Run => run_session(config),
        Commands::IssuePin { username } => {
            let store = open_store(&config)?;
            let pin = store.issue_pin(&username)?;
            Ok(format!("{}\n", pin))
        }
    }
}

fn run_session(config: SessionConfig) -> ircwarden::Result<String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| BotError::Config {
        message: format!("Failed to create tokio runtime: {}", e),
    })?;

    tracing::info!(
        "Starting ircwarden v{} as {}",
        env!("CARGO_PKG_VERSION"),
        config.nick
    );

    // The bot still runs without a store; account commands then report it
    let store = match open_store(&config) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            tracing::warn!("Account store unavailable: {}", e);
            None
        }
    };

    let result = runtime.block_on(async move {
        let mut bot = Bot::from_config(config);
        if let Some(store) = store {
            bot = bot.with_store(store);
        }
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        bot.run(stdin).await
    });

    // stdin is read on a blocking thread that cannot be interrupted
    runtime.shutdown_timeout(Duration::from_secs(1));

    let report = result?;
    tracing::info!("Shut down after {} generation(s)", report.generations);
    Ok(String::new())
}
