use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{MoveError, Result};

pub const ASSETS_ROOT: &str = "Assets";
pub const LIABILITIES_ROOT: &str = "Liabilities";
pub const INCOME_ROOT: &str = "Income";
pub const EXPENSE_ROOT: &str = "Expense";
pub const OPENING_BALANCES: &str = "Equity:Opening Balances";

/// Separator between account names in a full path.
pub const SEP: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Root,
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Root => "ROOT",
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ROOT" => Some(Self::Root),
            "ASSET" => Some(Self::Asset),
            "LIABILITY" => Some(Self::Liability),
            "EQUITY" => Some(Self::Equity),
            "INCOME" => Some(Self::Income),
            "EXPENSE" => Some(Self::Expense),
            _ => None,
        }
    }

    /// +1 for debit-normal accounts, -1 for credit-normal ones.
    pub fn natural_sign(&self) -> i64 {
        match self {
            Self::Root | Self::Asset | Self::Expense => 1,
            Self::Liability | Self::Equity | Self::Income => -1,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    /// Colon-joined names from the top-level account down, root excluded.
    pub full_name: String,
    pub account_type: AccountType,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub account_id: i64,
    /// Minor units; positive debits, negative credits.
    pub amount: i64,
    pub memo: Option<String>,
}

impl Split {
    pub fn new(account_id: i64, amount: i64) -> Self {
        Self {
            account_id,
            amount,
            memo: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub post_date: NaiveDate,
    pub description: String,
    pub splits: Vec<Split>,
}

impl Transaction {
    pub fn total(&self) -> i64 {
        self.splits.iter().map(|s| s.amount).sum()
    }
}

// ---------------------------------------------------------------------------
// Source records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn parse(category: &str, flag: &str) -> Result<Self> {
        match flag.trim().to_lowercase().as_str() {
            "income" | "i" => Ok(Self::Income),
            "expense" | "expenses" | "e" => Ok(Self::Expense),
            _ => Err(MoveError::UnknownCategoryType {
                category: category.to_string(),
                flag: flag.to_string(),
            }),
        }
    }

    pub fn root(&self) -> &'static str {
        match self {
            Self::Income => INCOME_ROOT,
            Self::Expense => EXPENSE_ROOT,
        }
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Income => AccountType::Income,
            Self::Expense => AccountType::Expense,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    Asset,
    Liability,
}

impl BalanceKind {
    pub fn parse(account: &str, flag: &str) -> Result<Self> {
        match flag.trim().to_lowercase().as_str() {
            "asset" | "assets" => Ok(Self::Asset),
            "liability" | "liabilities" => Ok(Self::Liability),
            _ => Err(MoveError::UnknownBalanceType {
                account: account.to_string(),
                flag: flag.to_string(),
            }),
        }
    }

    pub fn root(&self) -> &'static str {
        match self {
            Self::Asset => ASSETS_ROOT,
            Self::Liability => LIABILITIES_ROOT,
        }
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Asset => AccountType::Asset,
            Self::Liability => AccountType::Liability,
        }
    }
}

/// How an export writes liability balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LiabilitySign {
    /// Negative means money owed (the sign it contributes to net worth).
    #[default]
    NetWorth,
    /// Positive means money owed.
    Owed,
}

impl LiabilitySign {
    /// Converts a source amount to net-worth sign, which is also its debit sign.
    pub fn normalize(&self, kind: BalanceKind, amount: i64) -> i64 {
        match (self, kind) {
            (Self::Owed, BalanceKind::Liability) => -amount,
            _ => amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRecord {
    pub account: String,
    pub kind: BalanceKind,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningBalances {
    pub as_of_date: NaiveDate,
    pub data: Vec<BalanceRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub account: String,
    pub category: String,
    /// Net-worth sign relative to `account`: negative is money leaving it.
    pub amount: i64,
    pub description: String,
    pub memo: Option<String>,
}

/// Joins `name` under `root` unless it already starts with that root.
pub fn under_root(root: &str, name: &str) -> String {
    let name = name.trim().trim_matches(SEP);
    if name == root || name.starts_with(&format!("{root}{SEP}")) {
        name.to_string()
    } else {
        format!("{root}{SEP}{name}")
    }
}
