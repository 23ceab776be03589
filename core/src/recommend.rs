use crate::error::EngineError;
use crate::index::{Document, Index};
use crate::vector::cosine_similarity;

pub const DEFAULT_TOP_N: usize = 4;

/// Up to `top_n` documents closest to the one at `source`, most similar first.
///
/// The source itself is never returned. An out-of-range `source` yields an
/// empty list. There is no similarity cutoff.
pub fn recommend<'a>(
    source: usize,
    corpus: &'a [Document],
    index: &Index,
    top_n: usize,
) -> Result<Vec<&'a Document>, EngineError> {
    if corpus.len() != index.len() {
        return Err(EngineError::mismatch("corpus size", index.len(), corpus.len()));
    }
    let Some(base) = index.vector(source) else {
        tracing::debug!(source, num_docs = index.len(), "recommendation source out of range");
        return Ok(Vec::new());
    };

    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(index.len().saturating_sub(1));
    for (position, candidate) in index.vectors().iter().enumerate() {
        if position == source {
            continue;
        }
        scored.push((position, cosine_similarity(base, candidate)?));
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(scored.into_iter().take(top_n).map(|(position, _)| &corpus[position]).collect())
}

/// Same as [`recommend`], with the source looked up by document id.
pub fn recommend_by_id<'a>(
    id: &str,
    corpus: &'a [Document],
    index: &Index,
    top_n: usize,
) -> Result<Vec<&'a Document>, EngineError> {
    match index.position_of(id) {
        Some(position) => recommend(position, corpus, index, top_n),
        None => {
            tracing::debug!(id, "recommendation source not indexed");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("0", "Rust Programming", "Klabnik", "Tech", "ownership borrowing"),
            Document::new("1", "Baking Bread", "Hollywood", "Food", "flour yeast"),
            Document::new("2", "Rust Programming Patterns", "Blandy", "Tech", "ownership traits"),
            Document::new("3", "Gardening", "Titchmarsh", "Home", "soil seeds"),
        ]
    }

    #[test]
    fn nearest_neighbour_comes_first() {
        let docs = corpus();
        let index = build_index(&docs);
        let recs = recommend(0, &docs, &index, DEFAULT_TOP_N).unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].id, "2");
        assert!(recs.iter().all(|d| d.id != "0"));
    }

    #[test]
    fn zero_similarity_ties_keep_corpus_order() {
        let docs = corpus();
        let index = build_index(&docs);
        let recs = recommend(0, &docs, &index, 3).unwrap();
        let ids: Vec<&str> = recs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["2", "1", "3"]);
    }

    #[test]
    fn truncates_to_top_n() {
        let docs = corpus();
        let index = build_index(&docs);
        assert_eq!(recommend(1, &docs, &index, 2).unwrap().len(), 2);
        assert!(recommend(1, &docs, &index, 0).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_is_empty() {
        let docs = corpus();
        let index = build_index(&docs);
        assert!(recommend(4, &docs, &index, 4).unwrap().is_empty());
        assert!(recommend(usize::MAX, &docs, &index, 4).unwrap().is_empty());
        assert!(recommend(0, &[], &build_index(&[]), 4).unwrap().is_empty());
    }

    #[test]
    fn by_id() {
        let docs = corpus();
        let index = build_index(&docs);
        let recs = recommend_by_id("2", &docs, &index, 1).unwrap();
        assert_eq!(recs[0].id, "0");
        assert!(recommend_by_id("nope", &docs, &index, 4).unwrap().is_empty());
    }
}
