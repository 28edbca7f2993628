mod check;
mod subscriptions;

use clap::{Args, Parser, Subcommand};
use pricewatch_core::{parse_threshold, Target, UserId};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricewatch-cli")]
#[command(about = "Marketplace price-watch operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch a target once and show what a watch cycle would see
    Check {
        #[command(flatten)]
        target: TargetArgs,
        /// Maximum price in rubles
        #[arg(long, value_parser = threshold_arg)]
        threshold: Decimal,
    },
    /// Inspect or edit stored subscriptions
    Subscriptions {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },
    /// List the configured categories
    Categories,
}

#[derive(Debug, Subcommand)]
enum SubscriptionCommands {
    /// List every subscription
    List,
    /// Create or replace a user's subscription
    Set {
        /// Telegram chat id
        #[arg(long, allow_negative_numbers = true)]
        user: UserId,
        #[command(flatten)]
        target: TargetArgs,
        /// Maximum price in rubles
        #[arg(long, value_parser = threshold_arg)]
        threshold: Decimal,
    },
    /// Remove a user's subscription
    Remove {
        /// Telegram chat id
        #[arg(long, allow_negative_numbers = true)]
        user: UserId,
    },
}

/// Exactly one of `--category` or `--query`.
#[derive(Debug, Args, PartialEq, Eq)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Catalog category id
    #[arg(long)]
    category: Option<u32>,
    /// Free-text search query
    #[arg(long)]
    query: Option<String>,
}

impl TargetArgs {
    fn into_target(self) -> anyhow::Result<Target> {
        match (self.category, self.query) {
            (Some(id), _) => Ok(Target::Category(id)),
            (None, Some(query)) => Ok(Target::query(&query)?),
            (None, None) => anyhow::bail!("either --category or --query is required"),
        }
    }
}

fn threshold_arg(raw: &str) -> Result<Decimal, String> {
    parse_threshold(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = pricewatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let catalog = pricewatch_core::load_categories_or_builtin(&config.categories_path)?;

    match cli.command {
        Commands::Check { target, threshold } => {
            check::run_check(&config, catalog, target.into_target()?, threshold).await
        }
        Commands::Subscriptions { command } => match command {
            SubscriptionCommands::List => subscriptions::run_list(&config, &catalog).await,
            SubscriptionCommands::Set {
                user,
                target,
                threshold,
            } => {
                subscriptions::run_set(&config, &catalog, user, target.into_target()?, threshold)
                    .await
            }
            SubscriptionCommands::Remove { user } => {
                subscriptions::run_remove(&config, user).await
            }
        },
        Commands::Categories => {
            for category in catalog.iter() {
                println!(
                    "{:>6}  {:<28} {:<16} {:?}",
                    category.id, category.name, category.shard, category.format
                );
            }
            Ok(())
        }
    }
}
