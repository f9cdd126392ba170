use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fridgekeep_core::Household;

mod commands;
mod config;

use commands::{
    AccountCommand, ConfigCommand, FridgeCommand, IngredientCommand, NotificationCommand,
    StatsCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "fridge")]
#[command(version)]
#[command(about = "Keep track of what's in your fridges", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, sign in and manage your account
    Account(AccountCommand),

    /// Manage fridges, compartments and members
    Fridges(FridgeCommand),

    /// Track ingredients
    Item(IngredientCommand),

    /// Read notifications
    Inbox(NotificationCommand),

    /// Show usage statistics
    Stats(StatsCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fridgekeep_core=warn,fridge=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;
    tracing::debug!(data_dir = %config.data_dir.value.display(), "Loaded configuration");

    let household = Household::open(config.data_dir.value.clone());

    match &cli.command {
        Some(Commands::Account(cmd)) => cmd.run(&household),
        Some(Commands::Fridges(cmd)) => {
            household.ingredients.refresh_states()?;
            cmd.run(&household, &config)
        }
        Some(Commands::Item(cmd)) => {
            household.ingredients.refresh_states()?;
            cmd.run(&household)
        }
        Some(Commands::Inbox(cmd)) => cmd.run(&household),
        Some(Commands::Stats(cmd)) => cmd.run(&household),
        Some(Commands::Config(cmd)) => cmd.run(&config),
        None => {
            println!("Use --help to see available commands");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_item_add() {
        let cli = Cli::try_parse_from([
            "fridge", "item", "add", "Kitchen", "Milk", "--days", "2", "--unit", "L",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Item(_))));
    }

    #[test]
    fn test_item_add_rejects_non_finite_quantity() {
        for bad in ["NaN", "inf"] {
            assert!(Cli::try_parse_from([
                "fridge", "item", "add", "Kitchen", "Milk", "--days", "2", "--quantity", bad,
            ])
            .is_err());
        }
    }

    #[test]
    fn test_login_takes_no_password_argument() {
        assert!(Cli::try_parse_from(["fridge", "account", "login", "--email", "a@x.com"]).is_ok());
        assert!(Cli::try_parse_from([
            "fridge", "account", "login", "--email", "a@x.com", "--password", "pw",
        ])
        .is_err());
    }

    #[test]
    fn test_item_add_requires_expiration() {
        assert!(Cli::try_parse_from(["fridge", "item", "add", "Kitchen", "Milk"]).is_err());
        assert!(Cli::try_parse_from([
            "fridge", "item", "add", "Kitchen", "Milk", "--days", "2", "--expires", "2025-01-01",
        ])
        .is_err());
    }
}
