/// Integrity failures inside the engine.
///
/// Empty input and out-of-range recommendation requests are not errors; they
/// produce empty results. Anything here means two structures that were meant
/// to come from the same index do not agree.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Vectors, tables or corpora built against different vocabularies were combined.
    #[error("index mismatch ({context}): expected length {expected}, found {found}")]
    IndexMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
}

impl EngineError {
    pub(crate) fn mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        EngineError::IndexMismatch { context, expected, found }
    }
}
