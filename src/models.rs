use std::fmt;
use std::str::FromStr;

use crate::error::PenniesError;
use crate::money::Money;

/// Whether a transaction took money out of the account or brought it in.
/// Ordered so that `Expense` sorts before `Income`, matching the textual order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = PenniesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(PenniesError::Other(format!("Unknown transaction type: {other}"))),
        }
    }
}

impl rusqlite::ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for TransactionKind {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse()
            .map_err(|e: PenniesError| rusqlite::types::FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A stored expense as listed in per-category views.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub spent_on: String,
    pub amount: Money,
    pub merchant: String,
    pub note: Option<String>,
}

/// A ledger row that has not been inserted yet.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub spent_on: String,
    pub amount: Money,
    pub category_id: i64,
    pub merchant: String,
    pub note: Option<String>,
    pub kind: TransactionKind,
}

/// Intermediate representation from the statement parser before DB insert.
/// `amount` is the raw decimal text from the debit or credit column.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub date: String,
    pub bank_type: String,
    pub description: String,
    pub amount: String,
    pub kind: TransactionKind,
}
