use chrono::NaiveDate;

use crate::error::Result;
use crate::migrations::{self, CategorySummary, ImportSummary, MigrationPlan, MigrationReport};
use crate::settings::load_settings;
use crate::source::CsvSource;

use super::BookArgs;

/// Every file name is resolved against the working directory.
pub fn run(args: &BookArgs, mut plan: MigrationPlan, as_of: Option<NaiveDate>) -> Result<()> {
    let settings = load_settings()?;
    plan.liability_sign = args.liability_sign(&settings);
    let source = CsvSource::new(".").with_as_of_date(as_of);

    let book = args.open(&settings)?;
    let report = book.scoped(|book| migrations::run(book, &source, &plan))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &MigrationReport) {
    if let Some(summary) = &report.categories {
        print_categories(summary);
    }
    if let Some(summary) = &report.opening_balances {
        print_import("Opening balances", summary);
    }
    if let Some(summary) = &report.transactions {
        print_import("Transactions", summary);
    }
}

fn print_categories(summary: &CategorySummary) {
    if summary.duplicate_file {
        println!("Categories: this file has already been imported (duplicate checksum).");
        return;
    }
    println!("Categories: {} accounts created", summary.created.len());
}

fn print_import(label: &str, summary: &ImportSummary) {
    if summary.duplicate_file {
        println!("{label}: this file has already been imported (duplicate checksum).");
        return;
    }
    println!(
        "{label}: {} accounts created, {} transactions posted, {} skipped",
        summary.accounts_created, summary.transactions_posted, summary.skipped
    );
}
