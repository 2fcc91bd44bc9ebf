//! sqlweave — render and run parameterized SQL
//!
//! # Usage
//!
//! ```bash
//! # Show the CREATE TABLE for a schema file
//! sqlweave create books.toml --dialect sqlite
//!
//! # Dry-run a SELECT
//! sqlweave select --from books --columns id,title --where "price<20 & title~'%dune%'"
//!
//! # Execute against a database
//! sqlweave select --from books --execute --database-url sqlite://library.db
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlweave::config::Config;
use sqlweave::prelude::*;

#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(version)]
#[command(about = "Dialect-aware parameterized SQL builder", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlweave create schema.toml --dialect mysql
    sqlweave select --from books,authors --where 'books.authorid==authors.id & price<20'
    sqlweave select --from books --execute --database-url sqlite://library.db")]
struct Cli {
    /// Database connection URL
    #[arg(long, global = true, env = "SQLWEAVE_DATABASE_URL")]
    database_url: Option<String>,

    /// Config file (defaults to ./sqlweave.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target dialect (postgres, mysql, sqlite, sqlserver)
    #[arg(short, long, global = true)]
    dialect: Option<Dialect>,

    /// Run the statement instead of only printing it
    #[arg(short, long, global = true)]
    execute: bool,

    /// Output format for query results
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Give up after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render (and optionally run) CREATE TABLE from a TOML schema
    Create {
        /// Schema file: `name = "..."` plus a `[columns]` table
        schema: PathBuf,
    },
    /// Render (and optionally run) a SELECT
    Select {
        /// Tables to read from
        #[arg(long, value_delimiter = ',', required = true)]
        from: Vec<String>,

        /// Columns to return (all when omitted)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Filter expression, e.g. "a=1 & (b~'%x%' | c>3)"
        #[arg(short = 'w', long = "where")]
        filter: Option<String>,
    },
    /// Show placeholder and type reference per dialect
    Dialects,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sqlweave=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let url = cli.database_url.clone().or_else(|| config.database.url.clone());
    let dialect = config.resolve_dialect(cli.dialect, url.as_deref());

    let stmt = match &cli.command {
        Commands::Dialects => {
            show_dialects();
            return Ok(());
        }
        Commands::Create { schema } => {
            CreateTable::new(dialect, load_schema(schema)?).to_statement()?
        }
        Commands::Select {
            from,
            columns,
            filter,
        } => {
            let mut select = Select::new(dialect)
                .columns(columns.clone())
                .from(from.clone());
            if let Some(expr) = filter {
                select = select.filter(sqlweave::parse_filter(expr)?);
            }
            select.to_statement()?
        }
    };

    print_statement(&stmt, dialect);

    if !cli.execute {
        return Ok(());
    }
    let Some(url) = url else {
        println!();
        println!(
            "{}",
            "⚠ No database URL. Use --database-url or set SQLWEAVE_DATABASE_URL".yellow()
        );
        return Ok(());
    };

    let db = Database::connect_with(&url, dialect, config.database.max_connections).await?;
    let ctx = match cli.timeout {
        Some(secs) => Context::background().with_timeout(std::time::Duration::from_secs(secs)),
        None => Context::background(),
    };

    println!();
    match cli.command {
        Commands::Select { .. } => {
            let rows = db.execute_query(&stmt, &ctx).await?;
            format_output(&rows, &cli.format);
        }
        _ => {
            let affected = db.execute_statement(&stmt, &ctx).await?;
            println!("{} {} rows affected", "✓".green(), affected);
        }
    }

    Ok(())
}

fn load_schema(path: &Path) -> anyhow::Result<TableSchema> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    TableSchema::from_toml(&content)
        .with_context(|| format!("Invalid schema {}", path.display()))
}

fn print_statement(stmt: &Statement, dialect: Dialect) {
    println!(
        "{} {}",
        "Generated SQL".green().bold(),
        format!("({})", dialect).dimmed()
    );
    println!("{}", stmt.sql().white());

    if !stmt.params().is_empty() {
        println!();
        println!("{}", "Parameters:".cyan());
        for (i, param) in stmt.params().iter().enumerate() {
            println!("  {} = {}", i + 1, param.yellow());
        }
    }
}

fn format_output(results: &[RowMap], format: &OutputFormat) {
    if results.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results).unwrap_or_default());
        }
        OutputFormat::Table => {
            let mut columns: Vec<&String> = results[0].keys().collect();
            columns.sort();

            let mut widths: HashMap<&String, usize> =
                columns.iter().map(|c| (*c, c.len())).collect();
            for row in results {
                for (col, val) in row {
                    let len = val_to_string(val).len();
                    if let Some(w) = widths.get_mut(col) {
                        *w = (*w).max(len);
                    }
                }
            }

            let header: Vec<String> = columns
                .iter()
                .map(|c| format!("{:width$}", c, width = widths[*c]))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = columns.iter().map(|c| "─".repeat(widths[*c])).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in results {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        let val = row.get(*c).map(val_to_string).unwrap_or_default();
                        format!("{:width$}", val, width = widths[*c])
                    })
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", results.len().to_string().cyan());
        }
    }
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

fn show_dialects() {
    println!("{}", "Dialect Reference".cyan().bold());
    println!();
    println!(
        "{:10} {:12} {:14} {:10} {}",
        "Dialect".white().bold(),
        "Placeholder".white().bold(),
        "Text(64)".white().bold(),
        "Float".white().bold(),
        "DateTime".white().bold()
    );
    println!("{}", "─".repeat(60).dimmed());

    for dialect in Dialect::ALL {
        let placeholder = match dialect.placeholder(1) {
            Ok(first) if dialect.numbered_placeholders() => format!("{}, ...", first),
            Ok(token) => token,
            Err(e) => e.to_string(),
        };
        let keyword = |ty: ColumnType| ty.to_sql(dialect).unwrap_or_else(|e| e.to_string());
        println!(
            "{:10} {:12} {:14} {:10} {}",
            dialect.to_string().cyan().bold(),
            placeholder.yellow(),
            keyword(ColumnType::varchar(64)),
            keyword(ColumnType::float()),
            keyword(ColumnType::datetime()).dimmed()
        );
    }
}
