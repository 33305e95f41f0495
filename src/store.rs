//! The datastore operations the import pipeline and categorizer depend on.
//!
//! Components receive a `&impl Ledger` rather than opening their own
//! connection, so the pipeline can run against SQLite or a test double.

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Category, NewTransaction};
use crate::money::Money;

pub trait Ledger {
    fn insert_transaction(&self, txn: &NewTransaction) -> Result<i64>;

    /// Number of rows whose date, amount and merchant all equal the arguments.
    fn count_matching(&self, date: &str, amount: Money, merchant: &str) -> Result<i64>;

    fn list_categories(&self) -> Result<Vec<Category>>;

    fn find_category_by_name(&self, name: &str) -> Result<Option<i64>>;
}

impl Ledger for Connection {
    fn insert_transaction(&self, txn: &NewTransaction) -> Result<i64> {
        self.execute(
            "INSERT INTO expenses (spent_on, amount_pennies, category_id, merchant, note, transaction_type) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                txn.spent_on,
                txn.amount,
                txn.category_id,
                txn.merchant,
                txn.note,
                txn.kind,
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn count_matching(&self, date: &str, amount: Money, merchant: &str) -> Result<i64> {
        let mut stmt = self.prepare_cached(
            "SELECT COUNT(*) FROM expenses WHERE spent_on = ?1 AND amount_pennies = ?2 AND merchant = ?3",
        )?;
        let count = stmt.query_row(rusqlite::params![date, amount, merchant], |row| row.get(0))?;
        Ok(count)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.prepare("SELECT id, name FROM categories ORDER BY name ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn find_category_by_name(&self, name: &str) -> Result<Option<i64>> {
        let mut stmt = self.prepare_cached("SELECT id FROM categories WHERE name = ?1")?;
        let id = stmt.query_row([name], |row| row.get(0)).optional()?;
        Ok(id)
    }
}
