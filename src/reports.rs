use crate::book::Book;
use crate::error::Result;
use crate::models::{AccountType, Transaction, SEP};

// ---------------------------------------------------------------------------
// Account tree
// ---------------------------------------------------------------------------

pub struct AccountLine {
    pub name: String,
    pub depth: usize,
    pub account_type: AccountType,
    /// Natural-sign subtree balance.
    pub balance: i64,
}

pub fn account_tree(book: &Book) -> Result<Vec<AccountLine>> {
    book.accounts()?
        .into_iter()
        .map(|a| -> Result<AccountLine> {
            let balance = book.balance(&a.full_name)?;
            Ok(AccountLine {
                depth: a.full_name.matches(SEP).count(),
                name: a.name,
                account_type: a.account_type,
                balance,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Balance sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq)]
pub struct BalanceSheet {
    pub assets: i64,
    pub liabilities: i64,
    pub equity: i64,
    pub income: i64,
    pub expense: i64,
}

impl BalanceSheet {
    pub fn net_income(&self) -> i64 {
        self.income - self.expense
    }

    /// Assets = Liabilities + Equity + (Income - Expense).
    pub fn is_balanced(&self) -> bool {
        self.assets == self.liabilities + self.equity + self.net_income()
    }
}

/// Totals every top-level account by type, in natural sign.
pub fn balance_sheet(book: &Book) -> Result<BalanceSheet> {
    let mut sheet = BalanceSheet::default();
    for account in book.accounts()? {
        if account.parent_id != Some(book.root_id()) {
            continue;
        }
        let balance = book.balance(&account.full_name)?;
        match account.account_type {
            AccountType::Asset => sheet.assets += balance,
            AccountType::Liability => sheet.liabilities += balance,
            AccountType::Equity => sheet.equity += balance,
            AccountType::Income => sheet.income += balance,
            AccountType::Expense => sheet.expense += balance,
            AccountType::Root => {}
        }
    }
    Ok(sheet)
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

/// Stored transactions whose splits do not net to zero or that have fewer than
/// two splits. Only a damaged or hand-edited book has any.
pub fn unbalanced_transactions(book: &Book) -> Result<Vec<Transaction>> {
    Ok(book
        .transactions()?
        .into_iter()
        .filter(|t| t.total() != 0 || t.splits.len() < 2)
        .collect())
}
