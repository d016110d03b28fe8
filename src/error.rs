use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoveError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{source_name}: {source}")]
    SourceIo {
        source_name: String,
        source: std::io::Error,
    },

    #[error("{source_name}: missing column '{column}'")]
    MissingColumn { source_name: String, column: String },

    #[error("{source_name} line {line}: missing value for '{field}'")]
    MissingField {
        source_name: String,
        line: u64,
        field: String,
    },

    #[error("{source_name} line {line}: invalid amount '{raw}'")]
    InvalidAmount {
        source_name: String,
        line: u64,
        raw: String,
    },

    #[error("{source_name} line {line}: invalid date '{raw}'")]
    InvalidDate {
        source_name: String,
        line: u64,
        raw: String,
    },

    #[error("Unknown category type '{flag}' for category '{category}'")]
    UnknownCategoryType { category: String, flag: String },

    #[error("Unknown balance type '{flag}' for account '{account}'")]
    UnknownBalanceType { account: String, flag: String },

    #[error("No as-of date for opening balances in '{0}' (expected a YYYY-MM-DD file name prefix)")]
    MissingAsOfDate(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Category '{0}' exists under both Income and Expense")]
    AmbiguousCategory(String),

    #[error("Account '{0}' exists under both Assets and Liabilities")]
    AmbiguousAccount(String),

    #[error("Transaction '{description}' moves money from {account} to itself")]
    SameAccount {
        account: String,
        description: String,
    },

    #[error("Account '{path}' already exists as {existing}, not {requested}")]
    AccountTypeMismatch {
        path: String,
        existing: String,
        requested: String,
    },

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("Transaction '{description}' on {date} does not balance (off by {total} cents)")]
    Unbalanced {
        date: String,
        description: String,
        total: i64,
    },

    #[error("Transaction '{0}' needs at least two splits")]
    TooFewSplits(String),

    #[error("Invalid account name: '{0}'")]
    InvalidAccountName(String),

    #[error("Book already exists: {0} (pass --overwrite to replace it)")]
    BookExists(String),

    #[error("No book found at {0}")]
    BookNotFound(String),

    #[error("Corrupt book: {0}")]
    CorruptBook(String),

    #[error("Book check failed: {0}")]
    CheckFailed(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, MoveError>;
