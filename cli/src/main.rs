use anyhow::{bail, Result};
use bookfinder_core::corpus::load_corpus;
use bookfinder_core::{Document, SearchFilters, Snapshot, SortOrder, DEFAULT_TOP_N};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "bookfinder")]
#[command(about = "Search and recommend books from a JSON/JSONL catalog", long_about = None)]
struct Cli {
    /// Corpus path (file or directory of .json/.jsonl files)
    #[arg(long, global = true, default_value = "./sample_data/books.jsonl")]
    corpus: String,
    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show corpus and index sizes
    Stats,
    /// Rank books against a free-text query
    Search {
        query: String,
        /// Keep only books in this category
        #[arg(long)]
        category: Option<String>,
        /// relevance, rating or year
        #[arg(long, default_value = "relevance")]
        sort: SortOrder,
        /// Show at most this many books
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Books similar to one book, by id or corpus position
    Similar {
        #[arg(long, conflicts_with = "position")]
        id: Option<String>,
        #[arg(long)]
        position: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },
    /// List distinct categories
    Categories,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let snapshot = Snapshot::build(load_corpus(&cli.corpus)?);

    match cli.command {
        Commands::Stats => {
            let stats = snapshot.stats();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("books: {}", snapshot.corpus().len());
                println!("vocabulary: {}", stats.vocabulary_size);
                println!("idf: {}", stats.idf_size);
                println!("vectors: {}", stats.vectors);
            }
        }
        Commands::Search { query, category, sort, limit } => {
            let filters = SearchFilters { category, sort };
            let mut books = filters.apply(snapshot.search(&query)?);
            if let Some(limit) = limit {
                books.truncate(limit);
            }
            print_books(&books, cli.json)?;
        }
        Commands::Similar { id, position, top_n } => {
            let books = match (id, position) {
                (Some(id), _) => snapshot.recommend_by_id(&id, top_n)?,
                (None, Some(position)) => snapshot.recommend(position, top_n)?,
                (None, None) => bail!("pass --id or --position"),
            };
            print_books(&books, cli.json)?;
        }
        Commands::Categories => {
            for category in snapshot.categories() {
                println!("{category}");
            }
        }
    }
    Ok(())
}

fn print_books(books: &[&Document], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(books)?);
        return Ok(());
    }
    for b in books {
        println!("{}\t{}\t{}\t{}", b.id, b.title, b.author, b.category);
    }
    Ok(())
}
