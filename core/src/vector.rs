use crate::error::EngineError;
use crate::index::{IdfTable, Vocabulary};
use std::collections::HashMap;

/// Dense TF-IDF vector of `tokens` over a fixed vocabulary.
///
/// Tokens outside the vocabulary are ignored. Queries must be vectorized with
/// the vocabulary and IDF table of the index they are scored against.
pub fn vectorize(tokens: &[String], vocabulary: &Vocabulary, idf: &IdfTable) -> Result<Vec<f64>, EngineError> {
    if vocabulary.len() != idf.len() {
        return Err(EngineError::mismatch("idf table", vocabulary.len(), idf.len()));
    }
    Ok(weigh(tokens, vocabulary, idf))
}

/// Caller guarantees `vocabulary.len() == idf.len()`.
pub(crate) fn weigh(tokens: &[String], vocabulary: &Vocabulary, idf: &IdfTable) -> Vec<f64> {
    let mut tf: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *tf.entry(token.as_str()).or_insert(0) += 1;
    }
    let mut vector = vec![0.0; vocabulary.len()];
    for (term, count) in tf {
        if let Some(slot) = vocabulary.slot(term) {
            vector[slot] = count as f64 * idf.weights[slot];
        }
    }
    vector
}

/// Cosine of the angle between `a` and `b`.
///
/// Returns 0 when either vector is empty or has zero norm. Vectors of
/// different lengths come from different vocabularies and are rejected.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, EngineError> {
    if a.is_empty() || b.is_empty() {
        return Ok(0.0);
    }
    if a.len() != b.len() {
        return Err(EngineError::mismatch("vector length", a.len(), b.len()));
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    // weights are non-negative; clamp rounding drift above 1
    Ok((dot / (norm_a * norm_b)).clamp(0.0, 1.0))
}
