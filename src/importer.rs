use std::io::Read;
use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::categorizer::Categorizer;
use crate::error::{PenniesError, Result};
use crate::models::{NewTransaction, ParsedTransaction, TransactionKind};
use crate::money::Money;
use crate::store::Ledger;

pub const IMPORT_NOTE: &str = "Imported from CSV";

const MIN_COLUMNS: usize = 8;
const COL_DATE: usize = 0;
const COL_TYPE: usize = 1;
const COL_DESCRIPTION: usize = 4;
const COL_DEBIT: usize = 5;
const COL_CREDIT: usize = 6;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reorder `DD/MM/YYYY` into `YYYY-MM-DD`. Anything that does not split into
/// exactly three parts is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('/').collect();
    match parts.as_slice() {
        [d, m, y] => format!("{y}-{m}-{d}"),
        _ => raw.to_string(),
    }
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// True when a row with the same date, amount and merchant is already in the
/// ledger. Exact, case-sensitive comparison on all three.
pub fn is_duplicate(store: &impl Ledger, date: &str, amount: Money, merchant: &str) -> Result<bool> {
    Ok(store.count_matching(date, amount, merchant)? > 0)
}

// ---------------------------------------------------------------------------
// Statement parser
// ---------------------------------------------------------------------------

/// Banks fill the unused amount column with either nothing or a bare `0`.
fn is_blank(amount: &str) -> bool {
    amount.is_empty() || amount == "0"
}

/// Parse a bank statement. The first row is a header and is always skipped.
/// Rows with fewer than eight columns, or with neither a debit nor a credit,
/// are dropped. An amount of `0` counts as no amount. A populated credit column makes the row income even when
/// the debit column is also populated.
pub fn parse_statement<R: Read>(reader: R) -> Result<Vec<ParsedTransaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for result in rdr.records() {
        let Ok(record) = result else { continue };
        if record.len() < MIN_COLUMNS {
            continue;
        }
        let debit = record[COL_DEBIT].trim();
        let credit = record[COL_CREDIT].trim();

        let (kind, amount) = if !is_blank(credit) {
            (TransactionKind::Income, credit)
        } else if !is_blank(debit) {
            (TransactionKind::Expense, debit)
        } else {
            continue;
        };

        rows.push(ParsedTransaction {
            date: normalize_date(&record[COL_DATE]),
            bank_type: record[COL_TYPE].to_string(),
            description: record[COL_DESCRIPTION].to_string(),
            amount: amount.to_string(),
            kind,
        });
    }
    Ok(rows)
}

pub fn parse_statement_file(file_path: &Path) -> Result<Vec<ParsedTransaction>> {
    if !file_path.is_file() {
        return Err(PenniesError::FileNotFound(file_path.to_path_buf()));
    }
    let file = std::fs::File::open(file_path)?;
    parse_statement(std::io::BufReader::new(file))
}

// ---------------------------------------------------------------------------
// Import pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportStats {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

enum RowOutcome {
    Imported,
    Duplicate,
}

fn import_row(
    store: &impl Ledger,
    categorizer: &Categorizer,
    txn: &ParsedTransaction,
) -> Result<RowOutcome> {
    let amount = Money::parse_decimal(&txn.amount)?;
    if is_duplicate(store, &txn.date, amount, &txn.description)? {
        tracing::debug!(date = %txn.date, merchant = %txn.description, "skipping duplicate");
        return Ok(RowOutcome::Duplicate);
    }
    let category_id = categorizer.categorize(store, &txn.description)?;
    store.insert_transaction(&NewTransaction {
        spent_on: txn.date.clone(),
        amount,
        category_id,
        merchant: txn.description.clone(),
        note: Some(IMPORT_NOTE.to_string()),
        kind: txn.kind,
    })?;
    Ok(RowOutcome::Imported)
}

/// Persist every parsed row that is not already in the ledger. A failure on
/// one row is recorded in `errors` and does not stop the rest of the batch.
pub fn import_transactions(
    store: &impl Ledger,
    categorizer: &Categorizer,
    transactions: &[ParsedTransaction],
) -> ImportStats {
    let mut stats = ImportStats {
        total: transactions.len(),
        ..Default::default()
    };
    for txn in transactions {
        match import_row(store, categorizer, txn) {
            Ok(RowOutcome::Imported) => stats.imported += 1,
            Ok(RowOutcome::Duplicate) => stats.skipped += 1,
            Err(e) => {
                tracing::warn!(merchant = %txn.description, error = %e, "row import failed");
                stats.errors.push(format!("Error importing {}: {e}", txn.description));
            }
        }
    }
    stats
}

/// Parse `file_path`, import its rows and record the batch in `imports`.
/// An unreadable file fails before anything is written.
pub fn import_file(conn: &Connection, categorizer: &Categorizer, file_path: &Path) -> Result<ImportStats> {
    let parsed = parse_statement_file(file_path)?;
    let checksum = compute_checksum(file_path)?;
    tracing::info!(file = %file_path.display(), rows = parsed.len(), "importing statement");

    let stats = import_transactions(conn, categorizer, &parsed);

    let min_date = parsed.iter().map(|r| r.date.as_str()).min();
    let max_date = parsed.iter().map(|r| r.date.as_str()).max();
    conn.execute(
        "INSERT INTO imports (filename, record_count, imported, skipped, error_count, date_range_start, date_range_end, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            stats.total as i64,
            stats.imported as i64,
            stats.skipped as i64,
            stats.errors.len() as i64,
            min_date,
            max_date,
            checksum,
        ],
    )?;

    tracing::info!(
        imported = stats.imported,
        skipped = stats.skipped,
        errors = stats.errors.len(),
        "import finished"
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Import history
// ---------------------------------------------------------------------------

pub struct ImportRecord {
    pub id: i64,
    pub filename: String,
    pub import_date: String,
    pub record_count: i64,
    pub imported: i64,
    pub skipped: i64,
    pub error_count: i64,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub checksum: Option<String>,
}

pub fn import_history(conn: &Connection) -> Result<Vec<ImportRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, import_date, record_count, imported, skipped, error_count, \
         date_range_start, date_range_end, checksum FROM imports ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ImportRecord {
                id: row.get(0)?,
                filename: row.get(1)?,
                import_date: row.get(2)?,
                record_count: row.get(3)?,
                imported: row.get(4)?,
                skipped: row.get(5)?,
                error_count: row.get(6)?,
                date_range_start: row.get(7)?,
                date_range_end: row.get(8)?,
                checksum: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
