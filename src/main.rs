mod analytics;
mod categories;
mod categorizer;
mod cli;
mod db;
mod error;
mod importer;
mod models;
mod money;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{CategoriesCommands, Cli, Commands, ReportCommands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file } => cli::import::run(&file),
        Commands::History => cli::import::history(),
        Commands::Categories { command } => match command {
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::Add { name } => cli::categories::add(&name),
            CategoriesCommands::Uncategorized { sort } => {
                cli::categories::uncategorized(sort.into())
            }
            CategoriesCommands::Top { name, limit } => cli::categories::top(&name, limit),
        },
        Commands::Recategorize {
            category,
            merchant,
            ids,
        } => cli::categories::recategorize_cmd(&category, merchant.as_deref(), ids.as_deref()),
        Commands::Report { command } => match command {
            ReportCommands::Trends => cli::report::trends(),
            ReportCommands::Breakdown => cli::report::breakdown(),
            ReportCommands::CategoryTrends { months } => cli::report::category_trends(months),
            ReportCommands::Merchants { limit } => cli::report::merchants(limit),
            ReportCommands::Weekdays => cli::report::weekdays(),
            ReportCommands::Stats => cli::report::stats(),
            ReportCommands::Compare => cli::report::compare(),
            ReportCommands::Daily { days } => cli::report::daily(days),
            ReportCommands::Summary => cli::report::summary(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
