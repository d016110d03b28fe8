use tracing::{info, warn};

use crate::book::Book;
use crate::error::{MoveError, Result};
use crate::models::{
    under_root, Account, AccountType, LiabilitySign, Split, Transaction, ASSETS_ROOT,
    EXPENSE_ROOT, INCOME_ROOT, LIABILITIES_ROOT, OPENING_BALANCES,
};
use crate::source::DataSource;

const KIND_CATEGORIES: &str = "categories";
const KIND_BALANCES: &str = "opening_balances";
const KIND_TRANSACTIONS: &str = "transactions";

#[derive(Debug, Default)]
pub struct CategorySummary {
    pub created: Vec<Account>,
    pub duplicate_file: bool,
}

impl CategorySummary {
    pub fn count(&self, account_type: AccountType) -> usize {
        self.created
            .iter()
            .filter(|a| a.account_type == account_type)
            .count()
    }
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub accounts_created: usize,
    pub transactions_posted: usize,
    /// Rows that needed no posting, e.g. zero opening balances.
    pub skipped: usize,
    pub duplicate_file: bool,
}

/// Returns the source checksum, or `None` in the outer option when this exact
/// source was already imported as `kind`.
fn check_duplicate(
    book: &Book,
    source: &dyn DataSource,
    kind: &str,
    name: &str,
) -> Result<Option<Option<String>>> {
    let checksum = source.checksum(name)?;
    if let Some(sum) = &checksum {
        if book.is_imported(kind, sum)? {
            warn!(source = name, kind, "already imported, skipping");
            return Ok(None);
        }
    }
    Ok(Some(checksum))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Creates an `Income:` or `Expense:` account for every category row. Existing
/// accounts are reused, so running this twice creates nothing the second time.
pub fn category_accounts(
    source: &dyn DataSource,
    name: &str,
    book: &mut Book,
) -> Result<CategorySummary> {
    let Some(checksum) = check_duplicate(book, source, KIND_CATEGORIES, name)? else {
        return Ok(CategorySummary {
            duplicate_file: true,
            ..Default::default()
        });
    };
    let records = source.categories(name)?;

    let summary = book.atomic(|book| {
        book.record_import(KIND_CATEGORIES, name, records.len(), checksum.as_deref())?;
        let mut summary = CategorySummary::default();
        for record in &records {
            let path = under_root(record.kind.root(), &record.name);
            let ensured = book.ensure_account(&path, record.kind.account_type())?;
            summary.created.extend(ensured.created);
        }
        Ok(summary)
    })?;

    info!(
        source = name,
        rows = records.len(),
        income = summary.count(AccountType::Income),
        expense = summary.count(AccountType::Expense),
        "imported categories"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Opening balances
// ---------------------------------------------------------------------------

/// Creates asset and liability accounts and posts each opening balance against
/// `Equity:Opening Balances`, dated at the source's as-of date.
pub fn opening_balances(
    source: &dyn DataSource,
    name: &str,
    book: &mut Book,
    liability_sign: LiabilitySign,
) -> Result<ImportSummary> {
    let Some(checksum) = check_duplicate(book, source, KIND_BALANCES, name)? else {
        return Ok(ImportSummary {
            duplicate_file: true,
            ..Default::default()
        });
    };
    let balances = source.opening_balances(name)?;

    let summary = book.atomic(|book| {
        let import_id =
            book.record_import(KIND_BALANCES, name, balances.data.len(), checksum.as_deref())?;
        let mut summary = ImportSummary::default();

        let equity = book.ensure_account(OPENING_BALANCES, AccountType::Equity)?;
        summary.accounts_created += equity.created.len();

        for record in &balances.data {
            let path = under_root(record.kind.root(), &record.account);
            let ensured = book.ensure_account(&path, record.kind.account_type())?;
            summary.accounts_created += ensured.created.len();

            let amount = liability_sign.normalize(record.kind, record.amount);
            if amount == 0 {
                summary.skipped += 1;
                continue;
            }
            let txn = Transaction {
                id: None,
                post_date: balances.as_of_date,
                description: format!("Opening balance: {path}"),
                splits: vec![
                    Split::new(ensured.account.id, amount),
                    Split::new(equity.account.id, -amount),
                ],
            };
            book.post_transaction(&txn, Some(import_id))?;
            summary.transactions_posted += 1;
        }
        Ok(summary)
    })?;

    info!(
        source = name,
        as_of = %balances.as_of_date,
        accounts = summary.accounts_created,
        posted = summary.transactions_posted,
        "imported opening balances"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Resolves the money side of a transaction: an exact full path wins, then a path
/// relative to `Assets` or `Liabilities`. Only asset and liability accounts qualify.
fn resolve_account(book: &Book, name: &str) -> Result<Account> {
    let money_side =
        |a: &Account| matches!(a.account_type, AccountType::Asset | AccountType::Liability);
    if let Some(account) = book.find_account(name)?.filter(money_side) {
        return Ok(account);
    }
    let asset = book.find_account(&under_root(ASSETS_ROOT, name))?.filter(money_side);
    let liability = book.find_account(&under_root(LIABILITIES_ROOT, name))?.filter(money_side);
    match (asset, liability) {
        (Some(_), Some(_)) => Err(MoveError::AmbiguousAccount(name.to_string())),
        (Some(account), None) | (None, Some(account)) => Ok(account),
        (None, None) => Err(MoveError::UnknownAccount(name.to_string())),
    }
}

/// Resolves the category side: an exact full path wins (this is how transfers
/// name another asset or liability), then `Income:<name>` or `Expense:<name>`.
fn resolve_category(book: &Book, name: &str) -> Result<Account> {
    if let Some(account) = book.find_account(name)? {
        return Ok(account);
    }
    let income = book.find_account(&under_root(INCOME_ROOT, name))?;
    let expense = book.find_account(&under_root(EXPENSE_ROOT, name))?;
    match (income, expense) {
        (Some(_), Some(_)) => Err(MoveError::AmbiguousCategory(name.to_string())),
        (Some(account), None) | (None, Some(account)) => Ok(account),
        (None, None) => Err(MoveError::UnknownCategory(name.to_string())),
    }
}

/// Posts one balanced transaction per row between its account and its category.
/// Every referenced account must already exist; nothing is created here.
pub fn transactions(source: &dyn DataSource, name: &str, book: &mut Book) -> Result<ImportSummary> {
    let Some(checksum) = check_duplicate(book, source, KIND_TRANSACTIONS, name)? else {
        return Ok(ImportSummary {
            duplicate_file: true,
            ..Default::default()
        });
    };
    let records = source.transactions(name)?;

    let summary = book.atomic(|book| {
        let import_id =
            book.record_import(KIND_TRANSACTIONS, name, records.len(), checksum.as_deref())?;
        let mut summary = ImportSummary::default();
        for record in &records {
            let account = resolve_account(book, &record.account)?;
            let category = resolve_category(book, &record.category)?;
            if category.id == account.id {
                return Err(MoveError::SameAccount {
                    account: account.full_name,
                    description: record.description.clone(),
                });
            }
            let txn = Transaction {
                id: None,
                post_date: record.date,
                description: record.description.clone(),
                splits: vec![
                    Split {
                        account_id: account.id,
                        amount: record.amount,
                        memo: record.memo.clone(),
                    },
                    Split::new(category.id, -record.amount),
                ],
            };
            book.post_transaction(&txn, Some(import_id))?;
            summary.transactions_posted += 1;
        }
        Ok(summary)
    })?;

    info!(source = name, posted = summary.transactions_posted, "imported transactions");
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Whole run
// ---------------------------------------------------------------------------

/// Which sources to import in one run. Steps left as `None` are skipped.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub categories: Option<String>,
    pub opening_balances: Option<String>,
    pub transactions: Option<String>,
    pub liability_sign: LiabilitySign,
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub categories: Option<CategorySummary>,
    pub opening_balances: Option<ImportSummary>,
    pub transactions: Option<ImportSummary>,
}

/// Categories and opening balances first, so transactions find their accounts.
pub fn run(book: &mut Book, source: &dyn DataSource, plan: &MigrationPlan) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();
    if let Some(name) = &plan.categories {
        report.categories = Some(category_accounts(source, name, book)?);
    }
    if let Some(name) = &plan.opening_balances {
        report.opening_balances = Some(opening_balances(source, name, book, plan.liability_sign)?);
    }
    if let Some(name) = &plan.transactions {
        report.transactions = Some(transactions(source, name, book)?);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BalanceKind, BalanceRecord, CategoryKind, CategoryRecord, OpeningBalances,
        TransactionRecord,
    };
    use crate::source::{CsvSource, StaticSource};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn categories() -> Vec<CategoryRecord> {
        let income = [
            "Income",
            "Employment",
            "Employment:Salary",
            "Investments",
            "Investments:Dividends",
            "Investments:Interest",
            "Gifts Received",
        ];
        let expense = [
            "Expense",
            "Auto",
            "Auto:Fuel",
            "Auto:Insurance",
            "Home",
            "Home:Rent",
            "Home:Utilities",
            "Home:Internet",
            "Groceries",
            "Dining Out",
            "Clothing",
            "Entertainment",
            "Healthcare",
            "Gifts",
            "Travel",
            "Education",
            "Charity",
        ];
        let record = |name: &str, kind| CategoryRecord {
            name: name.to_string(),
            kind,
        };
        income
            .iter()
            .map(|n| record(*n, CategoryKind::Income))
            .chain(expense.iter().map(|n| record(*n, CategoryKind::Expense)))
            .collect()
    }

    fn balances() -> OpeningBalances {
        use BalanceKind::{Asset, Liability};
        let rows: [(&str, BalanceKind, i64); 21] = [
            ("Assets", Asset, 0),
            ("Assets:Current Assets", Asset, 0),
            ("Current Assets:Checking", Asset, 250_000),
            ("Current Assets:Savings", Asset, 1_000_000),
            ("Current Assets:Cash", Asset, 12_050),
            ("Current Assets:Emergency Fund", Asset, 300_000),
            ("Investments", Asset, 0),
            ("Investments:Brokerage", Asset, 1_500_000),
            ("Investments:Retirement", Asset, 4_200_000),
            ("Fixed Assets", Asset, 0),
            ("Fixed Assets:House", Asset, 30_000_000),
            ("Fixed Assets:Car", Asset, 1_200_000),
            ("Liabilities", Liability, 0),
            ("Credit Cards", Liability, 0),
            ("Credit Cards:Visa", Liability, -125_075),
            ("Credit Cards:Mastercard", Liability, -30_000),
            ("Credit Cards:Store Card", Liability, 4_510),
            ("Loans", Liability, 0),
            ("Loans:Mortgage", Liability, -25_000_000),
            ("Loans:Car Loan", Liability, -800_000),
            ("Loans:Student Loan", Liability, -1_500_000),
        ];
        OpeningBalances {
            as_of_date: date("2017-12-31"),
            data: rows
                .iter()
                .map(|(account, kind, amount)| BalanceRecord {
                    account: account.to_string(),
                    kind: *kind,
                    amount: *amount,
                })
                .collect(),
        }
    }

    fn all_transactions() -> Vec<TransactionRecord> {
        let rows = [
            ("2018-01-03", "Current Assets:Checking", "Employment:Salary", 300_000, "ACME PAYROLL"),
            ("2018-01-05", "Current Assets:Checking", "Home:Rent", -120_000, "LANDLORD"),
            ("2018-01-07", "Credit Cards:Visa", "Groceries", -8_540, "CORNER MARKET"),
            ("2018-01-09", "Assets:Current Assets:Checking", "Liabilities:Credit Cards:Visa", -50_000, "VISA PAYMENT"),
            ("2018-01-12", "Credit Cards:Visa", "Auto:Fuel", -4_000, "GAS STATION"),
            ("2018-01-15", "Current Assets:Savings", "Investments:Interest", 1_234, "INTEREST"),
            ("2018-01-20", "Current Assets:Cash", "Dining Out", -2_350, "TAQUERIA"),
        ];
        rows.iter()
            .map(|(d, account, category, amount, description)| TransactionRecord {
                date: date(d),
                account: account.to_string(),
                category: category.to_string(),
                amount: *amount,
                description: description.to_string(),
                memo: None,
            })
            .collect()
    }

    fn detailed_book() -> Book {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            categories: categories(),
            opening_balances: Some(balances()),
            ..Default::default()
        };
        category_accounts(&source, "categories.csv", &mut book).unwrap();
        opening_balances(&source, "balances.csv", &mut book, LiabilitySign::NetWorth).unwrap();
        book
    }

    fn top_level(book: &Book) -> Vec<Account> {
        book.accounts()
            .unwrap()
            .into_iter()
            .filter(|a| a.parent_id == Some(book.root_id()))
            .collect()
    }

    #[test]
    fn test_opening_balances() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            opening_balances: Some(balances()),
            ..Default::default()
        };

        let summary = opening_balances(&source, "2017-12-31_balances.csv", &mut book, LiabilitySign::NetWorth)
            .unwrap();

        // 21 balance accounts plus Equity and Equity:Opening Balances.
        assert_eq!(book.accounts().unwrap().len(), 23);
        assert_eq!(summary.accounts_created, 23);
        assert_eq!(summary.transactions_posted, 14);
        assert_eq!(summary.skipped, 7);

        let assets = book.balance(ASSETS_ROOT).unwrap();
        let liabilities = book.balance(LIABILITIES_ROOT).unwrap();
        let equity = book.balance("Equity").unwrap();
        assert_eq!(assets, liabilities + equity);
        assert!(assets > 0);
        assert_eq!(liabilities, 27_450_565);

        for txn in book.transactions().unwrap() {
            assert_eq!(txn.post_date, date("2017-12-31"));
            assert_eq!(txn.total(), 0);
        }
    }

    #[test]
    fn test_opening_balances_owed_sign() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            opening_balances: Some(OpeningBalances {
                as_of_date: date("2017-12-31"),
                data: vec![
                    BalanceRecord {
                        account: "Checking".to_string(),
                        kind: BalanceKind::Asset,
                        amount: 100_000,
                    },
                    BalanceRecord {
                        account: "Visa".to_string(),
                        kind: BalanceKind::Liability,
                        amount: 40_000,
                    },
                ],
            }),
            ..Default::default()
        };
        opening_balances(&source, "b.csv", &mut book, LiabilitySign::Owed).unwrap();

        assert_eq!(book.balance("Liabilities:Visa").unwrap(), 40_000);
        assert_eq!(book.balance("Equity").unwrap(), 60_000);
        assert_eq!(
            book.balance(ASSETS_ROOT).unwrap(),
            book.balance(LIABILITIES_ROOT).unwrap() + book.balance("Equity").unwrap()
        );
    }

    #[test]
    fn test_category_accounts() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            categories: categories(),
            ..Default::default()
        };

        let summary = category_accounts(&source, "categories.csv", &mut book).unwrap();

        let roots: Vec<String> = top_level(&book).into_iter().map(|a| a.name).collect();
        assert_eq!(roots, vec!["Expense", "Income"]);

        let accounts = book.accounts().unwrap();
        let types: Vec<AccountType> = accounts.iter().map(|a| a.account_type).collect();
        assert_eq!(types.iter().filter(|t| **t == AccountType::Income).count(), 7);
        assert_eq!(types.iter().filter(|t| **t == AccountType::Expense).count(), 17);
        assert_eq!(types.len(), 24);

        let groups = accounts
            .iter()
            .filter(|a| a.parent_id != Some(book.root_id()))
            .filter(|a| accounts.iter().any(|c| c.parent_id == Some(a.id)))
            .count();
        assert_eq!(groups, 4);

        assert_eq!(summary.count(AccountType::Income), 7);
        assert_eq!(summary.count(AccountType::Expense), 17);
        assert!(book.transactions().unwrap().is_empty());
    }

    #[test]
    fn test_category_accounts_is_idempotent() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            categories: categories(),
            ..Default::default()
        };
        category_accounts(&source, "categories.csv", &mut book).unwrap();
        let again = category_accounts(&source, "categories.csv", &mut book).unwrap();
        assert!(again.created.is_empty());
        assert_eq!(book.accounts().unwrap().len(), 24);
    }

    #[test]
    fn test_category_accounts_accepts_full_paths() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            categories: vec![CategoryRecord {
                name: "Expense:Pets".to_string(),
                kind: CategoryKind::Expense,
            }],
            ..Default::default()
        };
        category_accounts(&source, "c.csv", &mut book).unwrap();
        assert!(book.find_account("Expense:Pets").unwrap().is_some());
        assert!(book.find_account("Expense:Expense:Pets").unwrap().is_none());
    }

    #[test]
    fn test_transactions() {
        let mut book = detailed_book();
        let before = book.transactions().unwrap().len();
        let source = StaticSource {
            transactions: all_transactions(),
            ..Default::default()
        };

        let summary = transactions(&source, "transactions.csv", &mut book).unwrap();
        assert_eq!(summary.transactions_posted, 7);

        let imported: Vec<Transaction> = book
            .transactions()
            .unwrap()
            .into_iter()
            .filter(|t| t.post_date > date("2017-12-31"))
            .collect();
        assert_eq!(imported.len(), 7);
        assert_eq!(book.transactions().unwrap().len(), before + 7);
        for txn in &imported {
            assert_eq!(txn.total(), 0);
            assert_eq!(txn.splits.len(), 2);
        }
        let dates: Vec<NaiveDate> = all_transactions().iter().map(|r| r.date).collect();
        let posted: Vec<NaiveDate> = imported.iter().map(|t| t.post_date).collect();
        assert_eq!(posted, dates);

        assert_eq!(book.balance("Expense:Groceries").unwrap(), 8_540);
        assert_eq!(book.balance("Income:Employment").unwrap(), 300_000);
        // Visa: opened owing 1,250.75, charged 85.40 + 40.00, paid 500.00.
        assert_eq!(book.balance("Liabilities:Credit Cards:Visa").unwrap(), 125_075 + 8_540 + 4_000 - 50_000);
        assert_eq!(book.balance("Assets:Current Assets:Checking").unwrap(), 250_000 + 300_000 - 120_000 - 50_000);
    }

    #[test]
    fn test_transactions_unknown_account_is_rejected() {
        let mut book = detailed_book();
        let mut rows = all_transactions();
        rows[3].account = "Current Assets:Piggy Bank".to_string();
        let source = StaticSource {
            transactions: rows,
            ..Default::default()
        };
        let before = book.accounts().unwrap().len();
        let err = transactions(&source, "transactions.csv", &mut book).unwrap_err();
        assert!(matches!(err, MoveError::UnknownAccount(ref a) if a == "Current Assets:Piggy Bank"));
        assert_eq!(book.accounts().unwrap().len(), before);
        // The whole file rolls back, including the rows before the bad one.
        assert!(book.transactions().unwrap().iter().all(|t| t.post_date == date("2017-12-31")));
    }

    #[test]
    fn test_transactions_unknown_category_is_rejected() {
        let mut book = detailed_book();
        let mut rows = all_transactions();
        rows[0].category = "Lottery".to_string();
        let source = StaticSource {
            transactions: rows,
            ..Default::default()
        };
        let err = transactions(&source, "transactions.csv", &mut book).unwrap_err();
        assert!(matches!(err, MoveError::UnknownCategory(ref c) if c == "Lottery"));
    }

    #[test]
    fn test_transactions_category_cannot_be_an_account_side() {
        let mut book = detailed_book();
        let mut rows = all_transactions();
        rows[0].account = "Expense:Groceries".to_string();
        let source = StaticSource {
            transactions: rows,
            ..Default::default()
        };
        assert!(matches!(
            transactions(&source, "t.csv", &mut book),
            Err(MoveError::UnknownAccount(_))
        ));
    }

    #[test]
    fn test_root_named_category_is_the_root() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            categories: vec![
                CategoryRecord {
                    name: "Income".to_string(),
                    kind: CategoryKind::Income,
                },
                CategoryRecord {
                    name: "Income".to_string(),
                    kind: CategoryKind::Expense,
                },
            ],
            ..Default::default()
        };
        let summary = category_accounts(&source, "c.csv", &mut book).unwrap();
        let created: Vec<&str> = summary.created.iter().map(|a| a.full_name.as_str()).collect();
        assert_eq!(created, vec!["Income", "Expense", "Expense:Income"]);
        assert!(book.find_account("Income:Income").unwrap().is_none());
    }

    #[test]
    fn test_account_under_both_roots_is_ambiguous() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            categories: vec![CategoryRecord {
                name: "Groceries".to_string(),
                kind: CategoryKind::Expense,
            }],
            opening_balances: Some(OpeningBalances {
                as_of_date: date("2017-12-31"),
                data: vec![
                    BalanceRecord {
                        account: "Card".to_string(),
                        kind: BalanceKind::Asset,
                        amount: 9_000,
                    },
                    BalanceRecord {
                        account: "Card".to_string(),
                        kind: BalanceKind::Liability,
                        amount: -5_000,
                    },
                ],
            }),
            transactions: vec![TransactionRecord {
                date: date("2018-01-02"),
                account: "Card".to_string(),
                category: "Groceries".to_string(),
                amount: -1_000,
                description: "MARKET".to_string(),
                memo: None,
            }],
        };
        category_accounts(&source, "c.csv", &mut book).unwrap();
        opening_balances(&source, "b.csv", &mut book, LiabilitySign::NetWorth).unwrap();

        let err = transactions(&source, "t.csv", &mut book).unwrap_err();
        assert!(matches!(err, MoveError::AmbiguousAccount(ref a) if a == "Card"));
        assert_eq!(book.balance("Assets:Card").unwrap(), 9_000);

        // A full path still picks one side.
        let mut rows = source.transactions.clone();
        rows[0].account = "Liabilities:Card".to_string();
        let explicit = StaticSource {
            transactions: rows,
            ..Default::default()
        };
        transactions(&explicit, "t2.csv", &mut book).unwrap();
        assert_eq!(book.balance("Liabilities:Card").unwrap(), 6_000);
    }

    #[test]
    fn test_transaction_against_its_own_account_is_rejected() {
        let mut book = detailed_book();
        let mut rows = all_transactions();
        rows[0].category = "Assets:Current Assets:Checking".to_string();
        let source = StaticSource {
            transactions: rows,
            ..Default::default()
        };
        let err = transactions(&source, "t.csv", &mut book).unwrap_err();
        assert!(matches!(
            err,
            MoveError::SameAccount { ref account, .. } if account == "Assets:Current Assets:Checking"
        ));
    }

    #[test]
    fn test_ambiguous_category() {
        let mut book = detailed_book();
        book.ensure_account("Income:Gifts", AccountType::Income).unwrap();
        let mut rows = all_transactions();
        rows[0].category = "Gifts".to_string();
        let source = StaticSource {
            transactions: rows,
            ..Default::default()
        };
        assert!(matches!(
            transactions(&source, "t.csv", &mut book),
            Err(MoveError::AmbiguousCategory(_))
        ));
    }

    #[test]
    fn test_run_in_order() {
        let mut book = Book::in_memory("USD").unwrap();
        let source = StaticSource {
            categories: categories(),
            opening_balances: Some(balances()),
            transactions: all_transactions(),
        };
        let plan = MigrationPlan {
            categories: Some("categories.csv".to_string()),
            opening_balances: Some("2017-12-31_balances.csv".to_string()),
            transactions: Some("transactions.csv".to_string()),
            liability_sign: LiabilitySign::NetWorth,
        };
        let report = run(&mut book, &source, &plan).unwrap();
        assert_eq!(report.transactions.unwrap().transactions_posted, 7);
        assert_eq!(report.opening_balances.unwrap().transactions_posted, 14);
        assert!(report.categories.is_some());
        assert_eq!(book.transactions().unwrap().len(), 21);
    }

    #[test]
    fn test_csv_source_is_not_imported_twice() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("categories.csv"), "Category,Type\nSalary,Income\nRent,Expense\n")
            .unwrap();
        std::fs::write(
            dir.path().join("transactions.csv"),
            "Date,Account,Category,Amount\n2018-01-03,Checking,Salary,100.00\n",
        )
        .unwrap();
        let source = CsvSource::new(dir.path());
        let mut book = Book::in_memory("USD").unwrap();
        book.ensure_account("Assets:Checking", AccountType::Asset).unwrap();

        category_accounts(&source, "categories.csv", &mut book).unwrap();
        let first = transactions(&source, "transactions.csv", &mut book).unwrap();
        assert_eq!(first.transactions_posted, 1);

        let second = transactions(&source, "transactions.csv", &mut book).unwrap();
        assert!(second.duplicate_file);
        assert_eq!(second.transactions_posted, 0);
        assert_eq!(book.transactions().unwrap().len(), 1);
    }
}
