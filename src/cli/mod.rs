use std::fs::File;
use std::io::{BufReader, Read, Write};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::Value;
use uuid::Uuid;

use crate::application::{
    monthly_from_records, summarize_records, BudgetService, DashboardReport, TransactionFilter,
};
use crate::domain::{
    category_lookup, format_cents, parse_calendar_date, Category, CategoryRecord, DateRange,
    ExpenseSlice, MonthlyBucket, OwnerId, SummaryResult, Transaction, TransactionRecord,
};
use crate::io::{read_records_json, Exporter, ImportOptions, Importer};

/// Owner used when none is configured (single-user setups).
pub const DEFAULT_OWNER: &str = "00000000-0000-0000-0000-000000000000";

/// Budgetbook - Personal Budget Tracker
#[derive(Parser)]
#[command(name = "budgetbook")]
#[command(about = "Record income and expenses by category and see where the money goes")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BUDGETBOOK_DATABASE", default_value = "budgetbook.db")]
    pub database: String,

    /// Owner whose records are read and written
    #[arg(long, env = "BUDGETBOOK_OWNER", default_value = DEFAULT_OWNER)]
    pub owner: Uuid,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Record an income or expense
    Add {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Transaction type: income, expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        transaction_type: String,

        /// Category id
        #[arg(short, long)]
        category: i64,

        /// Description of the transaction
        #[arg(short, long)]
        description: Option<String>,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Change fields of an existing transaction
    Edit {
        /// Transaction id
        id: i64,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New type: income, expense
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// New category id
        #[arg(short, long)]
        category: Option<i64>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction id
        id: i64,
    },

    /// List transactions, newest first
    List {
        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Income, expenses and balance
    Summary {
        #[command(flatten)]
        range: RangeArgs,

        /// Summarize a JSON file of transaction records instead of the database
        #[arg(short, long)]
        input: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Expenses grouped by category
    Breakdown {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Income vs expenses for the last six active months
    Monthly {
        /// Read a JSON file of transaction records instead of the database
        #[arg(short, long)]
        input: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Summary, charts and recent transactions in one view
    Dashboard {
        #[command(flatten)]
        range: RangeArgs,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json (default: csv for transactions, json for full)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Import transactions from CSV or JSON
    Import {
        /// What to import: transactions, full
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Format: csv, json (default: json)
        #[arg(short, long)]
        format: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a new category
    Add {
        /// Category name
        name: String,

        /// Category type: income, expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        category_type: String,
    },

    /// List all categories
    List,
}

/// Date range selection shared by report commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to: Option<String>,

    /// Quick filter: this-month, last-3-months, last-12-months, all
    #[arg(long)]
    pub preset: Option<String>,
}

impl RangeArgs {
    /// Resolve to a date range. Explicit bounds override the preset's.
    pub fn resolve(&self, today: NaiveDate, default: DateRange) -> Result<DateRange> {
        let mut range = match self.preset.as_deref() {
            None => default,
            Some(preset) => parse_preset(preset, today)?,
        };
        if let Some(from) = &self.from {
            range.start = Some(parse_date(from).context("Invalid --from date")?);
        }
        if let Some(to) = &self.to {
            range.end = Some(parse_date(to).context("Invalid --to date")?);
        }
        Ok(range)
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let owner = self.owner;
        let today = Local::now().date_naive();
        tracing::debug!(database = %self.database, %owner, "starting");

        match self.command {
            Commands::Init => {
                BudgetService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Category(category_cmd) => {
                let service = BudgetService::connect(&self.database).await?;
                run_category_command(&service, owner, category_cmd).await?;
            }

            Commands::Add {
                amount,
                transaction_type,
                category,
                description,
                date,
            } => {
                let service = BudgetService::connect(&self.database).await?;
                let record = TransactionRecord {
                    amount: Value::String(amount),
                    transaction_type: Some(transaction_type),
                    category_id: Value::from(category),
                    description,
                    date,
                    ..Default::default()
                };
                let draft = record.into_draft(0, today)?;
                let transaction = service.record_transaction(owner, draft).await?;
                println!(
                    "Recorded {} #{}: {} on {}",
                    transaction.transaction_type,
                    transaction.id,
                    format_cents(transaction.amount_cents),
                    transaction.date.format("%Y-%m-%d")
                );
            }

            Commands::Edit {
                id,
                amount,
                transaction_type,
                category,
                description,
                date,
            } => {
                let service = BudgetService::connect(&self.database).await?;
                let existing = service.get_transaction(owner, id).await?;

                let mut record = TransactionRecord::from(&existing);
                if let Some(amount) = amount {
                    record.amount = Value::String(amount);
                }
                if let Some(transaction_type) = transaction_type {
                    record.transaction_type = Some(transaction_type);
                }
                if let Some(category) = category {
                    record.category_id = Value::from(category);
                }
                if let Some(description) = description {
                    record.description = Some(description);
                }
                if let Some(date) = date {
                    record.date = Some(date);
                }

                let draft = record.into_draft(0, today)?;
                let transaction = service.update_transaction(owner, id, draft).await?;
                println!(
                    "Updated #{}: {} {} on {}",
                    transaction.id,
                    transaction.transaction_type,
                    format_cents(transaction.amount_cents),
                    transaction.date.format("%Y-%m-%d")
                );
            }

            Commands::Delete { id } => {
                let service = BudgetService::connect(&self.database).await?;
                service.delete_transaction(owner, id).await?;
                println!("Deleted transaction #{}", id);
            }

            Commands::List { from, to, limit } => {
                let service = BudgetService::connect(&self.database).await?;
                let range = RangeArgs {
                    from,
                    to,
                    preset: None,
                }
                .resolve(today, DateRange::all())?;
                run_list_command(&service, owner, range, limit).await?;
            }

            Commands::Summary {
                range,
                input,
                format,
            } => {
                let range = range.resolve(today, DateRange::all())?;
                let summary = match input {
                    Some(path) => {
                        let records = read_records_json(open_input(Some(path.as_str()))?)?;
                        summarize_records(records, owner, &range, today)?
                    }
                    None => {
                        let service = BudgetService::connect(&self.database).await?;
                        service.get_summary(owner, range).await?
                    }
                };
                print_summary(&summary, &range, &format)?;
            }

            Commands::Breakdown { format } => {
                let service = BudgetService::connect(&self.database).await?;
                let slices = service.get_expense_breakdown(owner).await?;
                print_breakdown(&slices, &format)?;
            }

            Commands::Monthly { input, format } => {
                let buckets = match input {
                    Some(path) => {
                        let records = read_records_json(open_input(Some(path.as_str()))?)?;
                        monthly_from_records(records, owner, today)?
                    }
                    None => {
                        let service = BudgetService::connect(&self.database).await?;
                        service.get_monthly_comparison(owner).await?
                    }
                };
                print_monthly(&buckets, &format)?;
            }

            Commands::Dashboard { range, format } => {
                let service = BudgetService::connect(&self.database).await?;
                let range = range.resolve(today, DateRange::current_month(today))?;
                let report = service.get_dashboard(owner, range).await?;
                let categories = service.list_categories(owner).await?;
                print_dashboard(&report, &categories, &format)?;
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let service = BudgetService::connect(&self.database).await?;
                run_export_command(&service, owner, &export_type, output, format).await?;
            }

            Commands::Import {
                import_type,
                input,
                format,
                dry_run,
            } => {
                let service = BudgetService::connect(&self.database).await?;
                let importer = Importer::new(&service, owner, today);
                let options = ImportOptions { dry_run };
                let reader = open_input(input.as_deref())?;

                let result = match (import_type.as_str(), format.as_deref()) {
                    ("transactions", Some("csv")) => {
                        importer.import_transactions_csv(reader, options).await?
                    }
                    ("transactions", None | Some("json")) => {
                        importer.import_transactions_json(reader, options).await?
                    }
                    ("full", None | Some("json")) => {
                        importer.import_full_json(reader, options).await?
                    }
                    (kind, fmt) => anyhow::bail!(
                        "Unsupported import '{}' with format '{}'. Valid: transactions (csv, json), full (json)",
                        kind,
                        fmt.unwrap_or("json")
                    ),
                };

                if result.dry_run {
                    println!(
                        "Dry run: {} transaction(s) are valid, nothing imported",
                        result.transactions.len()
                    );
                } else {
                    println!("Imported {} transaction(s)", result.transactions.len());
                }
            }
        }

        Ok(())
    }
}

async fn run_category_command(
    service: &BudgetService,
    owner: OwnerId,
    cmd: CategoryCommands,
) -> Result<()> {
    match cmd {
        CategoryCommands::Add {
            name,
            category_type,
        } => {
            let draft = CategoryRecord {
                name: Some(name),
                category_type: Some(category_type),
            }
            .into_draft(0)?;
            let category = service.create_category(owner, draft).await?;
            println!(
                "Created {} category #{}: {}",
                category.category_type, category.id, category.name
            );
        }

        CategoryCommands::List => {
            let categories = service.list_categories(owner).await?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:>6}  {:<24} {:<8}", "ID", "NAME", "TYPE");
                println!("{}", "-".repeat(40));
                for category in categories {
                    println!(
                        "{:>6}  {:<24} {:<8}",
                        category.id,
                        truncate(&category.name, 24),
                        category.category_type
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_list_command(
    service: &BudgetService,
    owner: OwnerId,
    range: DateRange,
    limit: Option<usize>,
) -> Result<()> {
    let transactions = service
        .list_transactions_filtered(owner, TransactionFilter { range, limit })
        .await?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let categories = service.list_categories(owner).await?;
    print_transactions(&transactions, &categories);
    Ok(())
}

async fn run_export_command(
    service: &BudgetService,
    owner: OwnerId,
    export_type: &str,
    output: Option<String>,
    format: Option<String>,
) -> Result<()> {
    let exporter = Exporter::new(service, owner);
    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let count = match (export_type, format.as_deref()) {
        ("transactions", None | Some("csv")) => exporter.export_transactions_csv(writer).await?,
        ("transactions", Some("json")) => exporter.export_transactions_json(writer).await?,
        ("full", None | Some("json")) => {
            let snapshot = exporter.export_full_json(writer).await?;
            snapshot.transactions.len()
        }
        (kind, fmt) => anyhow::bail!(
            "Unsupported export '{}' with format '{}'. Valid: transactions (csv, json), full (json)",
            kind,
            fmt.unwrap_or("default")
        ),
    };

    if let Some(path) = output {
        println!("Exported {} transaction(s) to {}", count, path);
    }
    Ok(())
}

fn print_summary(summary: &SummaryResult, range: &DateRange, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(summary)?),
        "csv" => {
            println!("type,amount");
            println!("income,{}", format_cents(summary.income));
            println!("expenses,{}", format_cents(summary.expenses));
            println!("balance,{}", format_cents(summary.balance));
        }
        _ => {
            println!("Summary");
            println!("Period: {}", describe_range(range));
            println!();
            println!("Income:    {:>15}", format_cents(summary.income));
            println!("Expenses:  {:>15}", format_cents(summary.expenses));
            println!("{}", "-".repeat(26));
            println!("Balance:   {:>15}", format_cents(summary.balance));
        }
    }
    Ok(())
}

fn print_breakdown(slices: &[ExpenseSlice], format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(slices)?),
        "csv" => {
            println!("category_id,category,total,percentage");
            for slice in slices {
                println!(
                    "{},{},{},{:.2}",
                    slice.category_id,
                    slice.label,
                    format_cents(slice.total),
                    slice.percentage
                );
            }
        }
        _ => {
            if slices.is_empty() {
                println!("No expense data available.");
                return Ok(());
            }
            println!("Expenses by Category");
            println!();
            println!("{:<24} {:>12} {:>8}", "CATEGORY", "TOTAL", "PERCENT");
            println!("{}", "-".repeat(46));
            for slice in slices {
                println!(
                    "{:<24} {:>12} {:>7.1}%",
                    truncate(&slice.label, 24),
                    format_cents(slice.total),
                    slice.percentage
                );
            }
        }
    }
    Ok(())
}

fn print_monthly(buckets: &[MonthlyBucket], format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(buckets)?),
        "csv" => {
            println!("month,income,expenses");
            for bucket in buckets {
                println!(
                    "{},{},{}",
                    bucket.label,
                    format_cents(bucket.income),
                    format_cents(bucket.expenses)
                );
            }
        }
        _ => {
            if buckets.is_empty() {
                println!("Not enough data for monthly comparison.");
                return Ok(());
            }
            println!("Monthly Comparison");
            println!();
            println!("{:<10} {:>12} {:>12} {:>12}", "MONTH", "INCOME", "EXPENSES", "NET");
            println!("{}", "-".repeat(49));
            for bucket in buckets {
                println!(
                    "{:<10} {:>12} {:>12} {:>12}",
                    bucket.label,
                    format_cents(bucket.income),
                    format_cents(bucket.expenses),
                    format_cents(bucket.income - bucket.expenses)
                );
            }
        }
    }
    Ok(())
}

fn print_dashboard(report: &DashboardReport, categories: &[Category], format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    print_summary(&report.summary, &report.range, "table")?;
    println!();
    print_breakdown(&report.expense_breakdown, "table")?;
    println!();
    print_monthly(&report.monthly, "table")?;
    println!();
    println!("Recent Transactions");
    println!();
    if report.recent_transactions.is_empty() {
        println!("No transactions found.");
    } else {
        print_transactions(&report.recent_transactions, categories);
    }
    Ok(())
}

fn print_transactions(transactions: &[Transaction], categories: &[Category]) {
    let names = category_lookup(categories);

    println!(
        "{:>6}  {:<12} {:>12} {:<16} DESCRIPTION",
        "ID", "DATE", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(70));

    for transaction in transactions {
        let sign = if transaction.is_income() { "+" } else { "-" };
        let category = names
            .get(&transaction.category_id)
            .copied()
            .unwrap_or(crate::domain::UNKNOWN_CATEGORY);
        println!(
            "{:>6}  {:<12} {:>12} {:<16} {}",
            transaction.id,
            transaction.date.format("%Y-%m-%d"),
            format!("{}{}", sign, format_cents(transaction.amount_cents)),
            truncate(category, 16),
            truncate(transaction.description.as_deref().unwrap_or(""), 30)
        );
    }
}

fn describe_range(range: &DateRange) -> String {
    let bound = |date: Option<NaiveDate>| {
        date.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "...".to_string())
    };
    if range.is_unbounded() {
        "all time".to_string()
    } else {
        format!("{} to {}", bound(range.start), bound(range.end))
    }
}

fn open_input(path: Option<&str>) -> Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(std::io::stdin()),
    })
}

fn parse_preset(preset: &str, today: NaiveDate) -> Result<DateRange> {
    match preset {
        "this-month" => Ok(DateRange::current_month(today)),
        "last-3-months" => Ok(DateRange::trailing_months(today, 3)),
        "last-12-months" => Ok(DateRange::trailing_months(today, 12)),
        "all" => Ok(DateRange::all()),
        other => anyhow::bail!(
            "Invalid preset '{}'. Valid: this-month, last-3-months, last-12-months, all",
            other
        ),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    parse_calendar_date(date_str.trim())
        .ok_or_else(|| anyhow::anyhow!("Date must be in YYYY-MM-DD format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_range_args_default_and_overrides() {
        let today = date("2024-05-20");

        let range = RangeArgs::default()
            .resolve(today, DateRange::current_month(today))
            .unwrap();
        assert_eq!(range, DateRange::current_month(today));

        let range = RangeArgs {
            from: None,
            to: Some("2024-05-10".into()),
            preset: Some("this-month".into()),
        }
        .resolve(today, DateRange::all())
        .unwrap();
        assert_eq!(range.start, Some(date("2024-05-01")));
        assert_eq!(range.end, Some(date("2024-05-10")));
    }

    #[test]
    fn test_range_args_rejects_bad_input() {
        let today = date("2024-05-20");
        let bad_preset = RangeArgs {
            preset: Some("fortnight".into()),
            ..Default::default()
        };
        assert!(bad_preset.resolve(today, DateRange::all()).is_err());

        let bad_date = RangeArgs {
            from: Some("20-05-2024".into()),
            ..Default::default()
        };
        assert!(bad_date.resolve(today, DateRange::all()).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Groceries", 16), "Groceries");
        assert_eq!(truncate("Entertainment and leisure", 10), "Enterta...");
        assert_eq!(truncate("Café Crème Brûlée", 8), "Café ...");
    }

    #[test]
    fn test_describe_range() {
        assert_eq!(describe_range(&DateRange::all()), "all time");
        assert_eq!(
            describe_range(&DateRange::new(Some(date("2024-01-01")), None)),
            "2024-01-01 to ..."
        );
    }

    #[test]
    fn test_cli_parses_owner_and_command() {
        let cli = Cli::try_parse_from([
            "budgetbook",
            "--database",
            "test.db",
            "--owner",
            "6f1c2a9e-2a4b-4c38-9a53-1f6b4f2f0a11",
            "summary",
            "--preset",
            "last-3-months",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.database, "test.db");
        assert_eq!(
            cli.owner,
            Uuid::parse_str("6f1c2a9e-2a4b-4c38-9a53-1f6b4f2f0a11").unwrap()
        );
        assert!(matches!(
            cli.command,
            Commands::Summary { ref format, .. } if format == "json"
        ));
    }
}
