pub mod accounts;
pub mod config;
pub mod import;
pub mod report;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::book::Book;
use crate::error::Result;
use crate::models::LiabilitySign;
use crate::settings::{load_settings, resolve_book_path, Settings};
use crate::source::parse_date;

fn parse_date_arg(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("expected YYYY-MM-DD or MM/DD/YYYY, got '{raw}'"))
}

#[derive(Parser)]
#[command(name = "movebooks", about = "Move budgeting-tool CSV exports into a double-entry ledger book.")]
pub struct Cli {
    /// Log every created account and posted transaction.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to write and how to read amounts. Shared by every importing command.
#[derive(Args, Debug, Clone)]
pub struct BookArgs {
    /// Book file; a bare file name lands in the configured data directory
    #[arg(long)]
    pub book: String,
    /// Replace the book file instead of adding to it
    #[arg(long)]
    pub overwrite: bool,
    /// Currency for a new book (default from settings)
    #[arg(long)]
    pub currency: Option<String>,
    /// How the export writes liability balances (default from settings)
    #[arg(long = "liability-sign", value_enum)]
    pub liability_sign: Option<LiabilitySign>,
}

impl BookArgs {
    /// Opens the book, creating it when missing or when `--overwrite` is given.
    pub fn open(&self, settings: &Settings) -> Result<Book> {
        let path = resolve_book_path(settings, &self.book);
        let currency = self.currency.as_deref().unwrap_or(&settings.currency);
        if self.overwrite || !path.exists() {
            Book::create(&path, currency, self.overwrite)
        } else {
            Book::open(&path)
        }
    }

    pub fn liability_sign(&self, settings: &Settings) -> LiabilitySign {
        self.liability_sign.unwrap_or(settings.liability_sign)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full migration: categories, then opening balances, then transactions.
    Migrate {
        #[command(flatten)]
        book: BookArgs,
        /// Category CSV (columns: Category, Type)
        #[arg(long)]
        categories: Option<String>,
        /// Opening balance CSV (columns: Account, Type, Balance), named YYYY-MM-DD_*.csv
        #[arg(long)]
        balances: Option<String>,
        /// Transaction CSV (columns: Date, Account, Category, Amount, [Description], [Memo])
        #[arg(long)]
        transactions: Option<String>,
        /// As-of date for opening balances, overriding the file name
        #[arg(long = "as-of", value_parser = parse_date_arg)]
        as_of: Option<NaiveDate>,
    },
    /// Import income and expense categories only.
    Categories {
        /// Category CSV
        file: String,
        #[command(flatten)]
        book: BookArgs,
    },
    /// Import opening balances only.
    Balances {
        /// Opening balance CSV
        file: String,
        #[command(flatten)]
        book: BookArgs,
        /// As-of date, overriding the file name
        #[arg(long = "as-of", value_parser = parse_date_arg)]
        as_of: Option<NaiveDate>,
    },
    /// Import transactions only. Their accounts and categories must already exist.
    Transactions {
        /// Transaction CSV
        file: String,
        #[command(flatten)]
        book: BookArgs,
    },
    /// List the account tree with balances.
    Accounts {
        /// Book file
        #[arg(long)]
        book: String,
    },
    /// Show balance sheet totals.
    Report {
        /// Book file
        #[arg(long)]
        book: String,
    },
    /// Verify every transaction balances and the accounting equation holds.
    Check {
        /// Book file
        #[arg(long)]
        book: String,
    },
    /// Show settings, or update them when any option is given.
    Config {
        /// Default currency for new books
        #[arg(long)]
        currency: Option<String>,
        /// Default liability sign convention
        #[arg(long = "liability-sign", value_enum)]
        liability_sign: Option<LiabilitySign>,
        /// Directory for books given by bare file name
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
}

/// Opens an existing book for the read-only commands.
pub(crate) fn open_existing(book: &str) -> Result<Book> {
    let settings = load_settings()?;
    Book::open(&resolve_book_path(&settings, book))
}
