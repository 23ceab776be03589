use crate::error::EngineError;
use crate::index::{Document, Index};
use crate::tokenizer::tokenize;
use crate::vector::{cosine_similarity, vectorize};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

pub const COSINE_WEIGHT: f64 = 4.0;
/// Added per query token found in the title.
pub const TITLE_BOOST: f64 = 3.0;
/// Added per query token found in the author.
pub const AUTHOR_BOOST: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredHit {
    pub position: usize,
    pub score: f64,
}

/// Score every document against `query` and return the positive hits, best first.
///
/// `score = 4 * cosine + 3 * title hits + 2 * author hits`, where hits count
/// query tokens with multiplicity. Equal scores keep corpus order.
pub fn rank(query: &str, corpus: &[Document], index: &Index) -> Result<Vec<ScoredHit>, EngineError> {
    if corpus.len() != index.len() {
        return Err(EngineError::mismatch("corpus size", index.len(), corpus.len()));
    }
    let query_tokens = tokenize(query);
    let query_vector = vectorize(&query_tokens, index.vocabulary(), index.idf())?;

    let mut hits: Vec<ScoredHit> = Vec::new();
    for (position, (doc_vector, fields)) in index.vectors().iter().zip(index.fields()).enumerate() {
        let cos_score = cosine_similarity(&query_vector, doc_vector)?;
        let title_hits = query_tokens.iter().filter(|t| fields.title.contains(t.as_str())).count();
        let author_hits = query_tokens.iter().filter(|t| fields.author.contains(t.as_str())).count();
        let score = cos_score * COSINE_WEIGHT + title_hits as f64 * TITLE_BOOST + author_hits as f64 * AUTHOR_BOOST;
        if score > 0.0 {
            hits.push(ScoredHit { position, score });
        }
    }
    // stable: ties keep corpus order
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    tracing::debug!(query, tokens = query_tokens.len(), hits = hits.len(), "ranked query");
    Ok(hits)
}

/// Documents matching `query`, best first.
pub fn search<'a>(query: &str, corpus: &'a [Document], index: &Index) -> Result<Vec<&'a Document>, EngineError> {
    Ok(rank(query, corpus, index)?.into_iter().map(|hit| &corpus[hit.position]).collect())
}

/// Secondary ordering applied after ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Keep ranking order.
    #[default]
    Relevance,
    Rating,
    Year,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relevance" | "score" => Ok(SortOrder::Relevance),
            "rating" => Ok(SortOrder::Rating),
            "year" => Ok(SortOrder::Year),
            other => Err(format!("unknown sort order '{other}', expected relevance, rating or year")),
        }
    }
}

/// Post-filters a caller may apply to [`search`] results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl SearchFilters {
    /// Keep documents in `category` (exact match) and reorder by `sort`.
    ///
    /// Sorts are stable and descending; books without a rating or year go last.
    pub fn apply<'a>(&self, mut books: Vec<&'a Document>) -> Vec<&'a Document> {
        if let Some(category) = &self.category {
            books.retain(|b| &b.category == category);
        }
        match self.sort {
            SortOrder::Relevance => {}
            SortOrder::Rating => books.sort_by(|a, b| match (a.rating, b.rating) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }),
            SortOrder::Year => books.sort_by(|a, b| b.year.cmp(&a.year)),
        }
        books
    }
}
