use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::db::{get_connection, init_db};
use crate::error::{MoveError, Result};
use crate::models::{Account, AccountType, Split, Transaction, SEP};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A ledger book backed by a single SQLite file: an account tree plus balanced
/// transactions.
pub struct Book {
    conn: Connection,
    root_id: i64,
    currency: String,
}

/// Result of [`Book::ensure_account`]: the account at the requested path and every
/// account that had to be created on the way there, outermost first.
#[derive(Debug)]
pub struct EnsuredAccount {
    pub account: Account,
    pub created: Vec<Account>,
}

impl Book {
    /// Creates a new book file. An existing file is only replaced when `overwrite`.
    pub fn create(path: &Path, currency: &str, overwrite: bool) -> Result<Self> {
        if path.exists() {
            if !overwrite {
                return Err(MoveError::BookExists(path.display().to_string()));
            }
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = get_connection(path)?;
        init_db(&conn, currency)?;
        debug!(path = %path.display(), currency, "created book");
        Self::from_connection(conn)
    }

    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MoveError::BookNotFound(path.display().to_string()));
        }
        let conn = get_connection(path)?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn in_memory(currency: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_db(&conn, currency)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let root_id: i64 = conn.query_row(
            "SELECT id FROM accounts WHERE parent_id IS NULL AND account_type = 'ROOT'",
            [],
            |row| row.get(0),
        )?;
        let currency: String = conn.query_row(
            "SELECT value FROM book WHERE key = 'currency'",
            [],
            |row| row.get(0),
        )?;
        Ok(Self {
            conn,
            root_id,
            currency,
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn root_id(&self) -> i64 {
        self.root_id
    }

    /// Runs `f` and closes the book afterwards, on success and on failure alike.
    /// An error from `f` wins over an error from closing.
    pub fn scoped<T>(mut self, f: impl FnOnce(&mut Book) -> Result<T>) -> Result<T> {
        let outcome = f(&mut self);
        let closed = self.close();
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!(error = %close_err, "failed to close book after an aborted run");
                Err(e)
            }
        }
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| MoveError::Db(e))
    }

    /// Runs `f` inside a savepoint: either everything it wrote stays, or nothing does.
    pub fn atomic<T>(&mut self, f: impl FnOnce(&mut Book) -> Result<T>) -> Result<T> {
        self.conn.execute_batch("SAVEPOINT movebooks_atomic")?;
        match f(&mut *self) {
            Ok(value) => {
                self.conn.execute_batch("RELEASE movebooks_atomic")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO movebooks_atomic; RELEASE movebooks_atomic")
                {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    fn child(&self, parent_id: i64, name: &str) -> Result<Option<(i64, AccountType)>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, account_type FROM accounts WHERE parent_id = ?1 AND name = ?2",
                rusqlite::params![parent_id, name],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, key)| Ok((id, stored_type(id, &key)?)))
            .transpose()
    }

    fn insert_account(&self, parent_id: i64, name: &str, account_type: AccountType) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO accounts (name, account_type, parent_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, account_type.key(), parent_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Looks up an account by its full colon path, e.g. `Assets:Current Assets:Checking`.
    pub fn find_account(&self, path: &str) -> Result<Option<Account>> {
        let segments = split_path(path)?;
        let mut parent_id = self.root_id;
        let mut found = None;
        for name in &segments {
            match self.child(parent_id, name)? {
                Some((id, account_type)) => {
                    found = Some((id, account_type, parent_id));
                    parent_id = id;
                }
                None => return Ok(None),
            }
        }
        Ok(found.map(|(id, account_type, parent)| Account {
            id,
            name: segments.last().cloned().unwrap_or_default(),
            full_name: segments.join(&SEP.to_string()),
            account_type,
            parent_id: Some(parent),
        }))
    }

    /// Like [`Book::find_account`] but a missing account is an error.
    pub fn account(&self, path: &str) -> Result<Account> {
        self.find_account(path)?
            .ok_or_else(|| MoveError::UnknownAccount(path.to_string()))
    }

    /// Creates exactly one account. Its parent must already exist and no sibling may
    /// share its name.
    pub fn create_account(&mut self, path: &str, account_type: AccountType) -> Result<Account> {
        let segments = split_path(path)?;
        let full_name = segments.join(&SEP.to_string());
        if self.find_account(&full_name)?.is_some() {
            return Err(MoveError::DuplicateAccount(full_name));
        }
        let (name, parents) = segments
            .split_last()
            .ok_or_else(|| MoveError::InvalidAccountName(path.to_string()))?;
        let parent_id = if parents.is_empty() {
            self.root_id
        } else {
            self.account(&parents.join(&SEP.to_string()))?.id
        };
        let id = self.insert_account(parent_id, name, account_type)?;
        debug!(account = %full_name, %account_type, "created account");
        Ok(Account {
            id,
            name: name.clone(),
            full_name,
            account_type,
            parent_id: Some(parent_id),
        })
    }

    /// Look-up-or-create: walks `path` from the top, creating every missing account
    /// with `account_type`. Existing accounts on the path must have the same type.
    pub fn ensure_account(&mut self, path: &str, account_type: AccountType) -> Result<EnsuredAccount> {
        let segments = split_path(path)?;
        let mut parent_id = self.root_id;
        let mut walked: Vec<&str> = Vec::with_capacity(segments.len());
        let mut created = Vec::new();
        let mut last = None;

        for name in &segments {
            walked.push(name.as_str());
            let full_name = walked.join(&SEP.to_string());
            let id = match self.child(parent_id, name)? {
                Some((id, existing)) => {
                    if existing != account_type {
                        return Err(MoveError::AccountTypeMismatch {
                            path: full_name,
                            existing: existing.to_string(),
                            requested: account_type.to_string(),
                        });
                    }
                    id
                }
                None => {
                    let account = self.create_account(&full_name, account_type)?;
                    let id = account.id;
                    created.push(account);
                    id
                }
            };
            last = Some(Account {
                id,
                name: name.clone(),
                full_name,
                account_type,
                parent_id: Some(parent_id),
            });
            parent_id = id;
        }

        let account = last.ok_or_else(|| MoveError::InvalidAccountName(path.to_string()))?;
        Ok(EnsuredAccount { account, created })
    }

    /// Every account except the hidden root, ordered by full name.
    pub fn accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, account_type, parent_id FROM accounts ORDER BY id")?;
        let rows: Vec<(i64, String, String, Option<i64>)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let by_id: HashMap<i64, (&str, Option<i64>)> = rows
            .iter()
            .map(|(id, name, _, parent)| (*id, (name.as_str(), *parent)))
            .collect();

        let mut accounts = Vec::with_capacity(rows.len());
        for (id, name, key, parent_id) in &rows {
            if *id == self.root_id {
                continue;
            }
            let mut names = vec![name.as_str()];
            let mut cursor = *parent_id;
            while let Some(pid) = cursor {
                if pid == self.root_id {
                    break;
                }
                let Some((parent_name, grandparent)) = by_id.get(&pid) else {
                    break;
                };
                names.push(*parent_name);
                cursor = *grandparent;
            }
            names.reverse();
            accounts.push(Account {
                id: *id,
                name: name.clone(),
                full_name: names.join(&SEP.to_string()),
                account_type: stored_type(*id, key)?,
                parent_id: *parent_id,
            });
        }
        accounts.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(accounts)
    }

    /// Sum of every split posted to the account and its descendants, debit-positive.
    fn raw_balance(&self, account_id: i64) -> Result<i64> {
        let total: i64 = self.conn.query_row(
            "WITH RECURSIVE subtree(id) AS ( \
                 SELECT ?1 \
                 UNION ALL \
                 SELECT a.id FROM accounts a JOIN subtree s ON a.parent_id = s.id \
             ) \
             SELECT COALESCE(SUM(sp.amount), 0) FROM splits sp JOIN subtree s ON sp.account_id = s.id",
            [account_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Aggregated subtree balance in the account's natural sign, so liabilities,
    /// equity and income read positive when they hold credits.
    pub fn balance(&self, path: &str) -> Result<i64> {
        let account = self.account(path)?;
        Ok(self.raw_balance(account.id)? * account.account_type.natural_sign())
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Validates and stores a transaction. Nothing is written unless it has two or
    /// more splits against existing accounts summing to zero.
    pub fn post_transaction(&mut self, txn: &Transaction, import_id: Option<i64>) -> Result<i64> {
        let date = txn.post_date.format(DATE_FORMAT).to_string();
        if txn.splits.len() < 2 {
            return Err(MoveError::TooFewSplits(txn.description.clone()));
        }
        let total = txn.total();
        if total != 0 {
            return Err(MoveError::Unbalanced {
                date,
                description: txn.description.clone(),
                total,
            });
        }
        for split in &txn.splits {
            let exists: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1 AND parent_id IS NOT NULL)",
                [split.account_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(MoveError::UnknownAccount(format!("#{}", split.account_id)));
            }
        }

        let sp = self.conn.savepoint()?;
        sp.execute(
            "INSERT INTO transactions (post_date, description, currency, import_id) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![date, txn.description, self.currency, import_id],
        )?;
        let txn_id = sp.last_insert_rowid();
        for split in &txn.splits {
            sp.execute(
                "INSERT INTO splits (transaction_id, account_id, amount, memo) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![txn_id, split.account_id, split.amount, split.memo],
            )?;
        }
        sp.commit()?;
        debug!(id = txn_id, %date, description = %txn.description, "posted transaction");
        Ok(txn_id)
    }

    /// All transactions with their splits, ordered by post date.
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, post_date, description FROM transactions ORDER BY post_date, id")?;
        let headers: Vec<(i64, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut split_stmt = self
            .conn
            .prepare("SELECT transaction_id, account_id, amount, memo FROM splits ORDER BY id")?;
        let mut splits: HashMap<i64, Vec<Split>> = HashMap::new();
        let rows = split_stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Split {
                    account_id: row.get(1)?,
                    amount: row.get(2)?,
                    memo: row.get(3)?,
                },
            ))
        })?;
        for row in rows {
            let (txn_id, split) = row?;
            splits.entry(txn_id).or_default().push(split);
        }

        headers
            .into_iter()
            .map(|(id, date, description)| -> Result<Transaction> {
                let post_date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|_| {
                    MoveError::CorruptBook(format!("transaction {id} has post date '{date}'"))
                })?;
                Ok(Transaction {
                    id: Some(id),
                    post_date,
                    description,
                    splits: splits.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Import records
    // -----------------------------------------------------------------------

    pub fn is_imported(&self, kind: &str, checksum: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM imports WHERE kind = ?1 AND checksum = ?2")?;
        Ok(stmt.exists(rusqlite::params![kind, checksum])?)
    }

    pub fn record_import(
        &mut self,
        kind: &str,
        source_name: &str,
        record_count: usize,
        checksum: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO imports (kind, source_name, record_count, checksum) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![kind, source_name, record_count as i64, checksum],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

fn stored_type(id: i64, key: &str) -> Result<AccountType> {
    AccountType::from_key(key)
        .ok_or_else(|| MoveError::CorruptBook(format!("account {id} has type '{key}'")))
}

fn split_path(path: &str) -> Result<Vec<String>> {
    let segments: Vec<String> = path.split(SEP).map(|s| s.trim().to_string()).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MoveError::InvalidAccountName(path.to_string()));
    }
    Ok(segments)
}
