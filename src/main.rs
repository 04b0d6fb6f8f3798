// Command-line front end: print the tables and columns each query touches.

use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use colored::*;
use log::debug;
use sql_ref_extractor::{analyze, parse_statement, AnalyzeError, QueryAnalysis};

/// Sample queries printed by `--demo`.
const DEMO_QUERIES: &[&str] = &[
    "SELECT COUNT(deji, users, stadium) FROM users",
    "SELECT MIN(user_name) FROM users WHERE id = 5 AND last_name = unknown \
     OR ekwetu = tamuno AND virus = youHave",
    "SELECT SUM(number) FROM users WHERE NOT present = false",
    "SELECT Country, Uuid FROM test WHERE  id = 4 ORDER BY Date;",
    "SELECT station, office FROM country WHERE NOT id=8 \
     GROUP BY station, industry HAVING strange = true ORDER BY date;",
    "SELECT * FROM users INNER JOIN products ON users.id = products.id WHERE users.price = 4",
    "SELECT Employees.LastName, COUNT(Orders.OrderID) AS NumberOfOrders
     FROM Orders
     INNER JOIN Employees ON Orders.EmployeeID = Employees.EmployeeID
     WHERE LastName = 'Davolio' OR LastName = 'Fuller'
     GROUP BY LastName
     HAVING COUNT(Orders.OrderID) > 25;",
];

#[derive(Parser)]
#[command(
    name = "sql-refs",
    about = "List the tables and columns a SQL SELECT statement references"
)]
struct Cli {
    /// Queries to analyse, each on its own
    query: Vec<String>,

    /// Read `;`-separated queries from a file
    #[arg(long, conflicts_with = "query")]
    file: Option<PathBuf>,

    /// Analyse the built-in sample queries
    #[arg(long, conflicts_with_all = ["query", "file"])]
    demo: bool,

    /// Print results as JSON, one object per line
    #[arg(long)]
    json: bool,

    /// Also print the parsed statement
    #[arg(long)]
    ast: bool,

    /// Print debug logging
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let queries = match collect_queries(&cli) {
        Ok(queries) => queries,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(2);
        }
    };

    if queries.is_empty() {
        eprintln!("No queries provided");
        process::exit(2);
    }

    let mut failed = false;
    for query in &queries {
        if cli.ast {
            if let Ok(stmt) = parse_statement(query) {
                println!("{} {}", "AST:".cyan(), stmt);
            }
        }

        match analyze(query) {
            Ok(analysis) => print_analysis(&cli, query, &analysis),
            Err(e) => {
                failed = true;
                print_failure(&cli, query, &e);
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

/// Gather queries from arguments, `--file`, `--demo` or stdin
fn collect_queries(cli: &Cli) -> anyhow::Result<Vec<String>> {
    if cli.demo {
        return Ok(DEMO_QUERIES.iter().map(|q| q.to_string()).collect());
    }

    if !cli.query.is_empty() {
        return Ok(cli.query.clone());
    }

    let text = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            text
        }
    };

    // String literals containing ';' are not supported here
    let queries: Vec<String> = text
        .split(';')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect();
    debug!("read {} queries", queries.len());
    Ok(queries)
}

fn print_analysis(cli: &Cli, query: &str, analysis: &QueryAnalysis) {
    if cli.json {
        match serde_json::to_string(analysis) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
        return;
    }

    println!("{} {}", "Query:".yellow(), query.trim());
    println!("  {} {}", "Columns:".green(), analysis.columns);
    println!("  {} {}", "Tables:".green(), analysis.tables);
}

fn print_failure(cli: &Cli, query: &str, err: &AnalyzeError) {
    if cli.json {
        let message = match err {
            AnalyzeError::Parse(parse) => parse.message.clone(),
            AnalyzeError::Unsupported { .. } => err.to_string(),
        };
        let kind = if err.is_parse() { "parse" } else { "unsupported" };
        let value = serde_json::json!({ "query": query.trim(), "kind": kind, "error": message });
        println!("{}", value);
        return;
    }

    println!("{} {}", "Query:".yellow(), query.trim());
    match err {
        AnalyzeError::Parse(parse) => println!("{}", parse),
        AnalyzeError::Unsupported { .. } => {
            println!("  {} {}", "Unsupported:".red().bold(), err)
        }
    }
}
