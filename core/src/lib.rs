//! In-memory TF-IDF engine for ranking and recommending book records.
//!
//! The index is an immutable value built from a corpus snapshot; searches and
//! recommendations borrow it and never mutate it. See [`shared::SharedCatalog`]
//! for publishing rebuilt indexes to concurrent readers.

pub mod corpus;
pub mod error;
pub mod index;
pub mod recommend;
pub mod search;
pub mod shared;
pub mod tokenizer;
pub mod vector;

pub use error::EngineError;
pub use index::{build_index, Document, IdfTable, Index, IndexStats, Slot, Vocabulary};
pub use recommend::{recommend, recommend_by_id, DEFAULT_TOP_N};
pub use search::{rank, search, ScoredHit, SearchFilters, SortOrder};
pub use shared::{SharedCatalog, Snapshot};
pub use tokenizer::tokenize;
pub use vector::{cosine_similarity, vectorize};
