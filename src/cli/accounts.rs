use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::reports::account_tree;

use super::open_existing;

pub fn list(book: &str) -> Result<()> {
    let book = open_existing(book)?;
    let lines = account_tree(&book)?;

    let mut table = Table::new();
    table.set_header(vec!["Account", "Type", "Balance"]);
    for line in &lines {
        table.add_row(vec![
            Cell::new(format!("{}{}", "  ".repeat(line.depth), line.name)),
            Cell::new(line.account_type),
            Cell::new(money(line.balance)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Accounts ({})\n{table}", book.currency());
    book.close()
}
