use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::analytics;
use crate::cli::open_db;
use crate::error::Result;
use crate::money::Money;

fn avg(val: f64) -> String {
    Money::from_minor(val.round() as i64).to_string()
}

fn signed(val: Money) -> String {
    if val >= Money::ZERO {
        val.to_string().green().to_string()
    } else {
        val.to_string().red().to_string()
    }
}

pub fn trends() -> Result<()> {
    let conn = open_db()?;
    let rows = analytics::get_monthly_trends(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Month", "Expenses", "Income", "Net", "Count"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.month),
            Cell::new(r.expenses),
            Cell::new(r.income),
            Cell::new(signed(r.income - r.expenses)),
            Cell::new(r.count),
        ]);
    }
    println!("Monthly Trends\n{table}");
    Ok(())
}

pub fn breakdown() -> Result<()> {
    let conn = open_db()?;
    let rows = analytics::get_category_breakdown(&conn)?;
    let total: Money = rows.iter().map(|r| r.total).sum();

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count", "Average"]);
    for r in &rows {
        let pct = if total > Money::ZERO {
            r.total.minor() as f64 / total.minor() as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(&r.category),
            Cell::new(r.total),
            Cell::new(format!("{pct:.1}%")),
            Cell::new(r.transaction_count),
            Cell::new(avg(r.average)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(total),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("Expense Breakdown\n{table}");
    Ok(())
}

pub fn category_trends(months: u32) -> Result<()> {
    let conn = open_db()?;
    let rows = analytics::get_category_trends(&conn, months)?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Type", "Month", "Total"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(r.category),
            Cell::new(r.kind),
            Cell::new(r.month),
            Cell::new(r.total),
        ]);
    }
    println!("Category Trends (last {months} months)\n{table}");
    Ok(())
}

pub fn merchants(limit: usize) -> Result<()> {
    let conn = open_db()?;
    let rows = analytics::get_top_merchants(&conn, limit)?;

    let mut table = Table::new();
    table.set_header(vec!["Merchant", "Count", "Total"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(r.merchant),
            Cell::new(r.transaction_count),
            Cell::new(r.total),
        ]);
    }
    println!("Top Merchants\n{table}");
    Ok(())
}

pub fn weekdays() -> Result<()> {
    let conn = open_db()?;
    let rows = analytics::get_weekday_analysis(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Day", "Count", "Total", "Average"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(r.weekday),
            Cell::new(r.transaction_count),
            Cell::new(r.total),
            Cell::new(avg(r.average)),
        ]);
    }
    println!("Weekday Analysis\n{table}");
    Ok(())
}

pub fn stats() -> Result<()> {
    let conn = open_db()?;
    let s = analytics::get_spending_stats(&conn)?;
    let opt = |m: Option<Money>| m.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());

    let mut table = Table::new();
    table.set_header(vec!["Statistic", "Value"]);
    table.add_row(vec![Cell::new("Transactions"), Cell::new(s.total_transactions)]);
    table.add_row(vec![Cell::new("Total spent"), Cell::new(s.total_spent)]);
    table.add_row(vec![Cell::new("Total income"), Cell::new(s.total_income)]);
    table.add_row(vec![
        Cell::new("Average expense"),
        Cell::new(s.average_transaction.map(avg).unwrap_or_else(|| "-".to_string())),
    ]);
    table.add_row(vec![Cell::new("Smallest expense"), Cell::new(opt(s.smallest_transaction))]);
    table.add_row(vec![Cell::new("Largest expense"), Cell::new(opt(s.largest_transaction))]);
    println!("Spending Stats\n{table}");
    Ok(())
}

pub fn compare() -> Result<()> {
    let conn = open_db()?;
    let Some(cmp) = analytics::get_monthly_comparison(&conn)? else {
        println!("Not enough recent activity to compare months.");
        return Ok(());
    };

    let change = format!("{:+.1}%", cmp.percent_change);
    // Spending more than last month is the bad direction.
    let change = if cmp.difference > Money::ZERO {
        change.red()
    } else {
        change.green()
    };

    let mut table = Table::new();
    table.set_header(vec!["Month", "Spent"]);
    table.add_row(vec![Cell::new(&cmp.previous.month), Cell::new(cmp.previous.total)]);
    table.add_row(vec![Cell::new(&cmp.current.month), Cell::new(cmp.current.total)]);
    table.add_row(vec![Cell::new("Difference".bold()), Cell::new(cmp.difference)]);
    table.add_row(vec![Cell::new("Change".bold()), Cell::new(change)]);
    println!("Monthly Comparison\n{table}");
    Ok(())
}

pub fn daily(days: u32) -> Result<()> {
    let conn = open_db()?;
    let rows = analytics::get_daily_spending(&conn, days)?;

    let mut table = Table::new();
    table.set_header(vec!["Date", "Total"]);
    for r in rows {
        table.add_row(vec![Cell::new(r.date), Cell::new(r.total)]);
    }
    println!("Daily Totals (last {days} days)\n{table}");
    Ok(())
}

pub fn summary() -> Result<()> {
    let conn = open_db()?;
    let totals = analytics::get_totals(&conn)?;
    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Total income".green()), Cell::new(totals.income)]);
    table.add_row(vec![Cell::new("Total spent".red()), Cell::new(totals.spent)]);
    table.add_row(vec![Cell::new("NET".bold()), Cell::new(signed(totals.net))]);
    println!("Summary\n{table}");
    Ok(())
}
