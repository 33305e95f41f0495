use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::importer::{import_file, import_history};
use crate::settings::load_settings;

pub fn run(file: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let categorizer = load_settings().categorizer()?;
    let conn = open_db()?;

    let stats = import_file(&conn, &categorizer, &file_path)?;

    println!(
        "{} transactions read: {} imported, {} skipped (duplicates)",
        stats.total, stats.imported, stats.skipped
    );
    if !stats.errors.is_empty() {
        println!("{}", format!("{} rows failed:", stats.errors.len()).red().bold());
        for err in &stats.errors {
            println!("  {err}");
        }
    }
    Ok(())
}

pub fn history() -> Result<()> {
    let conn = open_db()?;
    let records = import_history(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "File", "Imported At", "Rows", "New", "Dupes", "Errors", "Range", "Checksum"]);
    for r in records {
        let range = match (r.date_range_start, r.date_range_end) {
            (Some(start), Some(end)) => format!("{start} \u{2192} {end}"),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.filename),
            Cell::new(r.import_date),
            Cell::new(r.record_count),
            Cell::new(r.imported),
            Cell::new(r.skipped),
            Cell::new(r.error_count),
            Cell::new(range),
            Cell::new(r.checksum.map(|c| c.chars().take(12).collect::<String>()).unwrap_or_default()),
        ]);
    }
    println!("Import History\n{table}");
    Ok(())
}
