//! Fetches book records from a Google Books compatible volumes endpoint and
//! turns them into corpus documents.

use anyhow::{anyhow, Result};
use bookfinder_core::Document;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/books/v1/volumes";

/// Subjects fetched when no query list is given.
pub const DEFAULT_QUERIES: &[&str] = &[
    "Python programming", "JavaScript", "React", "Data Science", "Machine Learning",
    "Business strategy", "Leadership", "Finance", "Marketing", "Self improvement",
    "Fiction bestseller", "Mystery", "Romance", "Science fiction", "Fantasy",
    "History", "Biography", "Psychology", "Philosophy", "Art",
];

const DESCRIPTION_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: String,
    /// `maxResults` sent with every query.
    pub max_results: u32,
    /// Stop once this many books are collected.
    pub limit: usize,
    /// Pause between queries.
    pub pause: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { endpoint: DEFAULT_ENDPOINT.to_string(), max_results: 10, limit: 100, pause: Duration::from_millis(300) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedQuery {
    pub query: String,
    pub reason: String,
}

/// Books collected so far plus the queries that could not be fetched.
#[derive(Debug, Default, Serialize)]
pub struct FetchReport {
    pub books: Vec<Document>,
    pub failed: Vec<FailedQuery>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run `queries` in order until `config.limit` books are collected.
///
/// A failing query is recorded in the report and the next one is tried.
pub async fn fetch_books(client: &Client, config: &FetchConfig, queries: &[String]) -> FetchReport {
    let mut report = FetchReport::default();
    for (i, query) in queries.iter().enumerate() {
        if report.books.len() >= config.limit {
            break;
        }
        match fetch_volumes(client, config, query).await {
            Ok(json) => {
                let before = report.books.len();
                collect_books(&json, &mut report.books, config.limit);
                tracing::debug!(query = %query, added = report.books.len() - before, "fetched volumes");
            }
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "catalog query failed");
                report.failed.push(FailedQuery { query: query.clone(), reason: format!("{err:#}") });
            }
        }
        if i + 1 < queries.len() && report.books.len() < config.limit && !config.pause.is_zero() {
            tokio::time::sleep(config.pause).await;
        }
    }
    tracing::info!(books = report.books.len(), failed = report.failed.len(), "catalog fetch finished");
    report
}

async fn fetch_volumes(client: &Client, config: &FetchConfig, query: &str) -> Result<Value> {
    let max_results = config.max_results.to_string();
    let url = Url::parse_with_params(
        &config.endpoint,
        &[("q", query), ("maxResults", max_results.as_str()), ("langRestrict", "en")],
    )?;
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(anyhow!("HTTP {}", resp.status()));
    }
    Ok(resp.json().await?)
}

/// Append the volumes of one response to `books`, numbering ids after the
/// books already present, and stop at `limit`.
pub fn collect_books(response: &Value, books: &mut Vec<Document>, limit: usize) {
    let Some(items) = response.get("items").and_then(Value::as_array) else { return };
    for item in items {
        if books.len() >= limit {
            break;
        }
        if let Some(doc) = volume_to_document(item, books.len() + 1) {
            books.push(doc);
        }
    }
}

/// Map one volume to a document with id `b{seq}`. Volumes without a
/// thumbnail are skipped.
pub fn volume_to_document(item: &Value, seq: usize) -> Option<Document> {
    let info = item.get("volumeInfo")?;
    let thumbnail = info.pointer("/imageLinks/thumbnail").and_then(Value::as_str).filter(|s| !s.is_empty())?;

    let text = |key: &str| info.get(key).and_then(Value::as_str);
    let first = |key: &str| info.get(key).and_then(Value::as_array).and_then(|a| a.first()).and_then(Value::as_str);

    let year = text("publishedDate")
        .filter(|d| !d.is_empty())
        .and_then(|d| d.get(..4).unwrap_or(d).parse::<i32>().ok())
        .unwrap_or(2020);
    let rating = info
        .get("averageRating")
        .and_then(Value::as_f64)
        .map(|r| ((r * 10.0).round() / 10.0) as f32)
        .unwrap_or(4.0);
    let description = match text("description").filter(|d| !d.is_empty()) {
        Some(d) => format!("{}...", d.chars().take(DESCRIPTION_CHARS).collect::<String>()),
        None => "No description".to_string(),
    };

    Some(Document {
        id: format!("b{seq}"),
        title: text("title").unwrap_or("Unknown").to_string(),
        author: first("authors").unwrap_or("Unknown").to_string(),
        category: first("categories").unwrap_or("General").to_string(),
        description,
        year: Some(year),
        rating: Some(rating),
        cover: Some(thumbnail.replace("http:", "https:")),
        preview: text("previewLink").filter(|p| !p.is_empty()).map(str::to_string),
    })
}
