use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::{MoveError, Result};
use crate::fmt::money;
use crate::reports::{balance_sheet, unbalanced_transactions};

use super::open_existing;

fn amount_cell(cents: i64) -> Cell {
    Cell::new(money(cents)).set_alignment(CellAlignment::Right)
}

pub fn balance(book: &str) -> Result<()> {
    let book = open_existing(book)?;
    let sheet = balance_sheet(&book)?;

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Assets".bold()), amount_cell(sheet.assets)]);
    table.add_row(vec![Cell::new("Liabilities".bold()), amount_cell(sheet.liabilities)]);
    table.add_row(vec![Cell::new("Equity".bold()), amount_cell(sheet.equity)]);
    table.add_row(vec![Cell::new(""), Cell::new("")]);
    table.add_row(vec![Cell::new("Income".green()), amount_cell(sheet.income)]);
    table.add_row(vec![Cell::new("Expense".red()), amount_cell(sheet.expense)]);
    let net_label = if sheet.net_income() >= 0 {
        "NET".green().bold()
    } else {
        "NET".red().bold()
    };
    table.add_row(vec![Cell::new(net_label), amount_cell(sheet.net_income())]);

    println!("Balance Sheet ({})\n{table}", book.currency());
    book.close()
}

pub fn check(book: &str) -> Result<()> {
    let book = open_existing(book)?;
    let bad = unbalanced_transactions(&book)?;
    let sheet = balance_sheet(&book)?;
    let transactions = book.transactions()?.len();
    book.close()?;

    for txn in &bad {
        println!(
            "{} {} '{}' is off by {}",
            "UNBALANCED".red().bold(),
            txn.post_date,
            txn.description,
            money(txn.total())
        );
    }
    if !sheet.is_balanced() {
        println!(
            "{} assets {} != liabilities {} + equity {} + net income {}",
            "EQUATION".red().bold(),
            money(sheet.assets),
            money(sheet.liabilities),
            money(sheet.equity),
            money(sheet.net_income())
        );
    }
    if !bad.is_empty() || !sheet.is_balanced() {
        return Err(MoveError::CheckFailed(format!(
            "{} unbalanced transaction(s) out of {transactions}",
            bad.len()
        )));
    }
    println!("{} {transactions} transactions balance", "OK".green().bold());
    Ok(())
}
