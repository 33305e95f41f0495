use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categories::{
    add_category, recategorize, recategorize_merchant, require_category, top_category_expenses,
    uncategorized_merchants, MerchantSort,
};
use crate::cli::open_db;
use crate::error::{PenniesError, Result};
use crate::money::Money;
use crate::store::Ledger;

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name"]);
    for cat in conn.list_categories()? {
        table.add_row(vec![Cell::new(cat.id), Cell::new(cat.name)]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn add(name: &str) -> Result<()> {
    let conn = open_db()?;
    let cat = add_category(&conn, name)?;
    println!("Added category: {} (id {})", cat.name, cat.id);
    Ok(())
}

pub fn uncategorized(sort: MerchantSort) -> Result<()> {
    let conn = open_db()?;
    let groups = uncategorized_merchants(&conn, sort)?;
    if groups.is_empty() {
        println!("{}", "All transactions are categorized.".green());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Merchant", "Count", "Total", "IDs"]);
    for g in &groups {
        let ids: Vec<String> = g.transaction_ids.iter().map(|id| id.to_string()).collect();
        table.add_row(vec![
            Cell::new(&g.merchant),
            Cell::new(g.count),
            Cell::new(g.total),
            Cell::new(ids.join(",")),
        ]);
    }
    let transactions: i64 = groups.iter().map(|g| g.count).sum();
    let total: Money = groups.iter().map(|g| g.total).sum();
    println!(
        "Uncategorized (Other): {} merchants, {} transactions, {}\n{table}",
        groups.len(),
        transactions,
        total
    );
    Ok(())
}

pub fn top(name: &str, limit: usize) -> Result<()> {
    let conn = open_db()?;
    let rows = top_category_expenses(&conn, name, limit)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Merchant", "Amount", "Note"]);
    for t in rows {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.spent_on),
            Cell::new(t.merchant),
            Cell::new(t.amount),
            Cell::new(t.note.unwrap_or_default()),
        ]);
    }
    println!("Top expenses in {name}\n{table}");
    Ok(())
}

pub fn recategorize_cmd(category: &str, merchant: Option<&str>, ids: Option<&[i64]>) -> Result<()> {
    let conn = open_db()?;
    let target = require_category(&conn, category)?;
    let updated = match (merchant, ids) {
        (Some(m), _) => recategorize_merchant(&conn, m, target.id)?,
        (None, Some(ids)) => recategorize(&conn, ids, target.id)?,
        (None, None) => {
            return Err(PenniesError::Other(
                "either --merchant or --ids is required".to_string(),
            ))
        }
    };
    println!("{updated} transaction(s) moved to {}", target.name);
    Ok(())
}
