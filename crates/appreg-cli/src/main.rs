mod cli;
mod commands;
mod config;
mod observability;
mod output;
mod store;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use commands::{Registry, applications, checks, secrets};
use output::print_error;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        // A check or validation reported a negative outcome.
        Ok(false) => std::process::exit(2),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<bool> {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    let format = cli.format.unwrap_or_default();
    let config = config::load(cli.config.as_deref())?;
    let snapshot = config::resolve_snapshot(cli.store.as_deref(), &config);

    let cancel = CancellationToken::new();
    let registry = Registry::open(snapshot, &config, cancel.clone())?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    match &cli.command {
        Commands::Create(args) => applications::create(&registry, args, format).await?,
        Commands::List(args) => applications::list(&registry, args, format).await?,
        Commands::Show(args) => applications::show(&registry, &args.client_id, format).await?,
        Commands::Delete(args) => applications::delete(&registry, &args.client_id).await?,
        Commands::Grant(args) => applications::grant(&registry, args, format).await?,
        Commands::Revoke(args) => applications::revoke(&registry, args, format).await?,
        Commands::SetSecret(args) => secrets::set_secret(&registry, args).await?,
        Commands::Validate(args) => return applications::validate(&registry, args, format).await,
        Commands::VerifySecret(args) => return secrets::verify_secret(&registry, args, format).await,
        Commands::CheckPermission(args) => {
            return checks::check_permission(&registry, args, format).await;
        }
        Commands::CheckRedirect(args) => {
            return checks::check_redirect(&registry, args, format).await;
        }
        Commands::CheckLogoutRedirect(args) => {
            return checks::check_logout_redirect(&registry, args, format).await;
        }
    }

    Ok(true)
}
