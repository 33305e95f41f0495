pub mod categories;
pub mod import;
pub mod init;
pub mod report;

use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;

use crate::analytics::{DEFAULT_DAILY_DAYS, DEFAULT_MERCHANT_LIMIT, DEFAULT_TREND_MONTHS};
use crate::categories::{MerchantSort, DEFAULT_TOP_EXPENSES};
use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::get_db_path;

#[derive(Parser)]
#[command(name = "pennies", about = "Personal finance tracker: import bank statements and see where the money goes.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for pennies data (default: ~/Documents/pennies)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a bank statement CSV and auto-categorize its transactions.
    Import {
        /// Path to the CSV statement
        file: String,
    },
    /// List previous statement imports.
    History,
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Move transactions to another category.
    Recategorize {
        /// Target category name
        #[arg(long)]
        category: String,
        /// Move every transaction with this exact merchant text
        #[arg(long, conflicts_with = "ids", required_unless_present = "ids")]
        merchant: Option<String>,
        /// Comma-separated transaction ids
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<i64>>,
    },
    /// Spending analytics.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// List all categories.
    List,
    /// Add a new category.
    Add {
        /// Category name, e.g. 'Work Income'
        name: String,
    },
    /// Show merchants whose transactions landed in "Other".
    Uncategorized {
        #[arg(long, value_enum, default_value_t = SortArg::Count)]
        sort: SortArg,
    },
    /// Largest expenses in a category.
    Top {
        name: String,
        #[arg(long, default_value_t = DEFAULT_TOP_EXPENSES)]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income and expenses per month (last 12 active months).
    Trends,
    /// Expense totals per category.
    Breakdown,
    /// Monthly totals per category and kind.
    CategoryTrends {
        #[arg(long, default_value_t = DEFAULT_TREND_MONTHS)]
        months: u32,
    },
    /// Merchants with the largest totals.
    Merchants {
        #[arg(long, default_value_t = DEFAULT_MERCHANT_LIMIT)]
        limit: usize,
    },
    /// Activity by day of week.
    Weekdays,
    /// Overall spending statistics.
    Stats,
    /// This month against last month.
    Compare,
    /// Totals per day.
    Daily {
        #[arg(long, default_value_t = DEFAULT_DAILY_DAYS)]
        days: u32,
    },
    /// Total spent, earned and net balance.
    Summary,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    Count,
    Total,
    Merchant,
}

impl From<SortArg> for MerchantSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Count => MerchantSort::Count,
            SortArg::Total => MerchantSort::Total,
            SortArg::Merchant => MerchantSort::Merchant,
        }
    }
}

pub(crate) fn open_db() -> Result<Connection> {
    let conn = get_connection(&get_db_path())?;
    init_db(&conn)?;
    Ok(conn)
}
