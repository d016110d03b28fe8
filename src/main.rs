mod book;
mod cli;
mod db;
mod error;
mod fmt;
mod logging;
mod migrations;
mod models;
mod reports;
mod settings;
mod source;

use clap::Parser;

use cli::{Cli, Commands};
use migrations::MigrationPlan;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Migrate {
            book,
            categories,
            balances,
            transactions,
            as_of,
        } => cli::import::run(
            &book,
            MigrationPlan {
                categories,
                opening_balances: balances,
                transactions,
                ..Default::default()
            },
            as_of,
        ),
        Commands::Categories { file, book } => cli::import::run(
            &book,
            MigrationPlan {
                categories: Some(file),
                ..Default::default()
            },
            None,
        ),
        Commands::Balances { file, book, as_of } => cli::import::run(
            &book,
            MigrationPlan {
                opening_balances: Some(file),
                ..Default::default()
            },
            as_of,
        ),
        Commands::Transactions { file, book } => cli::import::run(
            &book,
            MigrationPlan {
                transactions: Some(file),
                ..Default::default()
            },
            None,
        ),
        Commands::Accounts { book } => cli::accounts::list(&book),
        Commands::Report { book } => cli::report::balance(&book),
        Commands::Check { book } => cli::report::check(&book),
        Commands::Config {
            currency,
            liability_sign,
            data_dir,
        } => cli::config::run(currency, liability_sign, data_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
