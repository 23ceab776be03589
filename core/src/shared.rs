use crate::error::EngineError;
use crate::index::{build_index, Document, Index, IndexStats};
use crate::{recommend, search};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::Arc;
use time::OffsetDateTime;

/// A corpus together with the index built from it.
#[derive(Debug)]
pub struct Snapshot {
    corpus: Vec<Document>,
    index: Index,
    built_at: OffsetDateTime,
}

impl Snapshot {
    pub fn build(corpus: Vec<Document>) -> Self {
        let index = build_index(&corpus);
        Self { corpus, index, built_at: OffsetDateTime::now_utc() }
    }

    pub fn corpus(&self) -> &[Document] {
        &self.corpus
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn built_at(&self) -> OffsetDateTime {
        self.built_at
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.index.position_of(id).map(|position| &self.corpus[position])
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let set: BTreeSet<&str> =
            self.corpus.iter().map(|d| d.category.as_str()).filter(|c| !c.is_empty()).collect();
        set.into_iter().collect()
    }

    pub fn search(&self, query: &str) -> Result<Vec<&Document>, EngineError> {
        search::search(query, &self.corpus, &self.index)
    }

    pub fn recommend(&self, source: usize, top_n: usize) -> Result<Vec<&Document>, EngineError> {
        recommend::recommend(source, &self.corpus, &self.index, top_n)
    }

    pub fn recommend_by_id(&self, id: &str, top_n: usize) -> Result<Vec<&Document>, EngineError> {
        recommend::recommend_by_id(id, &self.corpus, &self.index, top_n)
    }
}

/// Holds the current [`Snapshot`] and swaps in rebuilt ones atomically.
///
/// Readers clone the `Arc` and keep a consistent snapshot for as long as they
/// hold it. Rebuilds are serialized; the write lock is held only for the swap.
#[derive(Debug)]
pub struct SharedCatalog {
    current: RwLock<Arc<Snapshot>>,
    build_lock: Mutex<()>,
}

impl SharedCatalog {
    pub fn new(corpus: Vec<Document>) -> Self {
        Self { current: RwLock::new(Arc::new(Snapshot::build(corpus))), build_lock: Mutex::new(()) }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Build a new index over `corpus` and publish it.
    pub fn rebuild(&self, corpus: Vec<Document>) -> Arc<Snapshot> {
        let _guard = self.build_lock.lock();
        let next = Arc::new(Snapshot::build(corpus));
        *self.current.write() = Arc::clone(&next);
        let stats = next.stats();
        tracing::info!(num_docs = stats.vectors, num_terms = stats.vocabulary_size, "index published");
        next
    }
}

impl Default for SharedCatalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
