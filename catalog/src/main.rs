use anyhow::{anyhow, Result};
use bookfinder_catalog::{fetch_books, FetchConfig, DEFAULT_ENDPOINT, DEFAULT_QUERIES};
use bookfinder_core::corpus::write_jsonl;
use clap::Parser;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "catalog-fetch")]
#[command(about = "Fetch book records from the catalog API into a JSONL corpus")]
struct Cli {
    /// File with one subject query per line; the built-in subject list is used when omitted
    #[arg(long)]
    queries: Option<String>,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/books.jsonl")]
    output: String,
    /// Volumes endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Maximum number of books to collect
    #[arg(long, default_value_t = 100)]
    limit: usize,
    /// Results requested per query
    #[arg(long, default_value_t = 10)]
    max_results: u32,
    /// Request timeout seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
    /// Pause between queries in milliseconds
    #[arg(long, default_value_t = 300)]
    pause_ms: u64,
    /// User-Agent string
    #[arg(long, default_value = "bookfinder-catalog/0.1")]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let queries = match &args.queries {
        Some(path) => read_queries(path)?,
        None => DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
    };
    if queries.is_empty() {
        return Err(anyhow!("no queries to fetch"));
    }

    let client = reqwest::Client::builder()
        .user_agent(args.user_agent.clone())
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;
    let config = FetchConfig {
        endpoint: args.endpoint.clone(),
        max_results: args.max_results,
        limit: args.limit,
        pause: Duration::from_millis(args.pause_ms),
    };

    let report = fetch_books(&client, &config, &queries).await;

    if let Some(dir) = std::path::Path::new(&args.output).parent() {
        fs::create_dir_all(dir)?;
    }
    write_jsonl(BufWriter::new(File::create(&args.output)?), &report.books)?;

    for failed in &report.failed {
        tracing::warn!(query = %failed.query, reason = %failed.reason, "query not fetched");
    }
    tracing::info!(
        books = report.books.len(),
        failed = report.failed.len(),
        output = %args.output,
        "catalog written"
    );
    Ok(())
}

fn read_queries(path: &str) -> Result<Vec<String>> {
    let mut queries = Vec::new();
    for line in BufReader::new(File::open(path)?).lines() {
        let q = line?.trim().to_string();
        if q.is_empty() || q.starts_with('#') {
            continue;
        }
        queries.push(q);
    }
    Ok(queries)
}
