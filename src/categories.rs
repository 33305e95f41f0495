use rusqlite::{Connection, OptionalExtension};

use crate::db::OTHER_CATEGORY;
use crate::error::{PenniesError, Result};
use crate::models::{Category, Transaction};
use crate::money::Money;
use crate::store::Ledger;

pub const DEFAULT_TOP_EXPENSES: usize = 10;

pub fn add_category(conn: &Connection, name: &str) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PenniesError::EmptyCategoryName);
    }
    if conn.find_category_by_name(name)?.is_some() {
        return Err(PenniesError::DuplicateCategory(name.to_string()));
    }
    conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
    Ok(Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn require_category(conn: &Connection, name: &str) -> Result<Category> {
    let id = conn
        .find_category_by_name(name)?
        .ok_or_else(|| PenniesError::UnknownCategory(name.to_string()))?;
    Ok(Category {
        id,
        name: name.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Uncategorized merchants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MerchantSort {
    #[default]
    Count,
    Total,
    Merchant,
}

impl MerchantSort {
    fn order_clause(&self) -> &'static str {
        match self {
            Self::Count => "ORDER BY count DESC, merchant ASC",
            Self::Total => "ORDER BY total DESC, merchant ASC",
            Self::Merchant => "ORDER BY merchant ASC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MerchantGroup {
    pub merchant: String,
    pub count: i64,
    pub total: Money,
    pub transaction_ids: Vec<i64>,
}

/// Transactions sitting in "Other", grouped by merchant. Empty when the
/// "Other" category does not exist.
pub fn uncategorized_merchants(conn: &Connection, sort: MerchantSort) -> Result<Vec<MerchantGroup>> {
    let Some(other_id) = conn.find_category_by_name(OTHER_CATEGORY)? else {
        return Ok(Vec::new());
    };
    let sql = format!(
        "SELECT merchant, COUNT(*) as count, SUM(amount_pennies) as total, GROUP_CONCAT(id) \
         FROM expenses WHERE category_id = ?1 GROUP BY merchant {}",
        sort.order_clause()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([other_id], |row| {
            let ids: String = row.get(3)?;
            Ok(MerchantGroup {
                merchant: row.get(0)?,
                count: row.get(1)?,
                total: row.get(2)?,
                transaction_ids: ids.split(',').filter_map(|id| id.parse().ok()).collect(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Recategorization
// ---------------------------------------------------------------------------

fn ensure_category_exists(conn: &Connection, category_id: i64) -> Result<()> {
    let exists = conn
        .query_row("SELECT 1 FROM categories WHERE id = ?1", [category_id], |_| Ok(()))
        .optional()?;
    exists.ok_or_else(|| PenniesError::UnknownCategory(format!("id {category_id}")))
}

/// Move the given transactions to `category_id`. Returns the number of rows
/// changed; ids that do not exist are ignored.
pub fn recategorize(conn: &Connection, ids: &[i64], category_id: i64) -> Result<usize> {
    ensure_category_exists(conn, category_id)?;
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("UPDATE expenses SET category_id = ? WHERE id IN ({placeholders})");
    let mut params: Vec<i64> = Vec::with_capacity(ids.len() + 1);
    params.push(category_id);
    params.extend_from_slice(ids);
    let updated = conn.execute(&sql, rusqlite::params_from_iter(params))?;
    tracing::info!(updated, category_id, "recategorized transactions");
    Ok(updated)
}

/// Move every transaction with exactly this merchant text to `category_id`.
pub fn recategorize_merchant(conn: &Connection, merchant: &str, category_id: i64) -> Result<usize> {
    ensure_category_exists(conn, category_id)?;
    let updated = conn.execute(
        "UPDATE expenses SET category_id = ?1 WHERE merchant = ?2",
        rusqlite::params![category_id, merchant],
    )?;
    tracing::info!(updated, merchant, category_id, "recategorized merchant");
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Top expenses per category
// ---------------------------------------------------------------------------

/// Largest expense-kind transactions in the named category.
pub fn top_category_expenses(conn: &Connection, category: &str, limit: usize) -> Result<Vec<Transaction>> {
    let category = require_category(conn, category)?;
    let mut stmt = conn.prepare(
        "SELECT id, spent_on, amount_pennies, merchant, note \
         FROM expenses WHERE category_id = ?1 AND transaction_type = 'expense' \
         ORDER BY amount_pennies DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![category.id, limit as i64], |row| {
            Ok(Transaction {
                id: row.get(0)?,
                spent_on: row.get(1)?,
                amount: row.get(2)?,
                merchant: row.get(3)?,
                note: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
