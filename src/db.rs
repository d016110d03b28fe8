use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS book (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    account_type TEXT NOT NULL,
    parent_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (parent_id) REFERENCES accounts(id),
    UNIQUE (parent_id, name)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    post_date TEXT NOT NULL,
    description TEXT NOT NULL,
    currency TEXT NOT NULL,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS splits (
    id INTEGER PRIMARY KEY,
    transaction_id INTEGER NOT NULL,
    account_id INTEGER NOT NULL,
    amount INTEGER NOT NULL,
    memo TEXT,
    FOREIGN KEY (transaction_id) REFERENCES transactions(id),
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS splits_account ON splits (account_id);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    source_name TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    checksum TEXT
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Creates the tables, the root account and the book currency. Safe to call on an
/// initialized book; an existing currency is left alone.
pub fn init_db(conn: &Connection, currency: &str) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    // NULL parent ids never collide under UNIQUE, so the root is guarded by hand.
    let roots: i64 = conn.query_row(
        "SELECT count(*) FROM accounts WHERE parent_id IS NULL",
        [],
        |row| row.get(0),
    )?;
    if roots == 0 {
        conn.execute(
            "INSERT INTO accounts (name, account_type, parent_id) VALUES ('Root Account', 'ROOT', NULL)",
            [],
        )?;
    }
    conn.execute(
        "INSERT OR IGNORE INTO book (key, value) VALUES ('currency', ?1)",
        [currency],
    )?;
    Ok(())
}
