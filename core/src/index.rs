use crate::tokenizer::tokenize;
use crate::vector::weigh;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// Position of a term inside every vector of one index.
pub type Slot = usize;

/// A catalog record. Only the four text fields take part in ranking; the rest
/// is carried through for callers that display or post-filter results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            category: category.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Title, author, category and description joined by single spaces.
    pub fn indexable_text(&self) -> String {
        [
            self.title.as_str(),
            self.author.as_str(),
            self.category.as_str(),
            self.description.as_str(),
        ]
        .join(" ")
    }
}

/// Term to slot mapping. Slots follow first occurrence in the corpus.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    slots: HashMap<String, Slot>,
    terms: Vec<String>,
}

impl Vocabulary {
    fn insert(&mut self, term: &str) -> Slot {
        if let Some(&slot) = self.slots.get(term) {
            return slot;
        }
        let slot = self.terms.len();
        self.slots.insert(term.to_string(), slot);
        self.terms.push(term.to_string());
        slot
    }

    pub fn slot(&self, term: &str) -> Option<Slot> {
        self.slots.get(term).copied()
    }

    pub fn term(&self, slot: Slot) -> Option<&str> {
        self.terms.get(slot).map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.slots.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in slot order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

/// Smoothed inverse document frequency per vocabulary slot.
#[derive(Debug, Clone, Default)]
pub struct IdfTable {
    pub(crate) weights: Vec<f64>,
}

impl IdfTable {
    /// `ln((n + 1) / (df + 1)) + 1`, strictly positive whenever `df <= n`.
    pub fn smoothed(num_docs: usize, df: u32) -> f64 {
        ((num_docs as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0
    }

    pub fn get(&self, slot: Slot) -> Option<f64> {
        self.weights.get(slot).copied()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Title and author terms of one document, used for field boosting.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldTerms {
    pub title: HashSet<String>,
    pub author: HashSet<String>,
}

/// Sizes reported for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub vocabulary_size: usize,
    pub idf_size: usize,
    pub vectors: usize,
}

/// Vocabulary, IDF table and one TF-IDF vector per corpus position.
#[derive(Debug, Clone, Default)]
pub struct Index {
    vocabulary: Vocabulary,
    idf: IdfTable,
    vectors: Vec<Vec<f64>>,
    fields: Vec<FieldTerms>,
    positions: HashMap<String, usize>,
}

impl Index {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self) -> &IdfTable {
        &self.idf
    }

    /// IDF weight of a term, `None` for terms outside the vocabulary.
    pub fn idf_of(&self, term: &str) -> Option<f64> {
        self.vocabulary.slot(term).and_then(|slot| self.idf.get(slot))
    }

    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }

    pub fn vector(&self, position: usize) -> Option<&[f64]> {
        self.vectors.get(position).map(Vec::as_slice)
    }

    pub(crate) fn fields(&self) -> &[FieldTerms] {
        &self.fields
    }

    /// Corpus position of the first document carrying `id`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            vocabulary_size: self.vocabulary.len(),
            idf_size: self.idf.len(),
            vectors: self.vectors.len(),
        }
    }
}

/// Build a full index over `corpus`.
///
/// Each document is tokenized once; the resulting token lists feed the
/// vocabulary, the document frequencies and the vectors.
pub fn build_index(corpus: &[Document]) -> Index {
    let tokenized: Vec<Vec<String>> = corpus.iter().map(|doc| tokenize(&doc.indexable_text())).collect();

    let mut vocabulary = Vocabulary::default();
    let mut df: Vec<u32> = Vec::new();
    for tokens in &tokenized {
        let mut seen_in_doc: HashSet<Slot> = HashSet::new();
        for term in tokens {
            let slot = vocabulary.insert(term);
            if slot == df.len() {
                df.push(0);
            }
            if seen_in_doc.insert(slot) {
                df[slot] += 1;
            }
        }
    }

    let idf = IdfTable { weights: df.iter().map(|&d| IdfTable::smoothed(corpus.len(), d)).collect() };
    let vectors: Vec<Vec<f64>> = tokenized.iter().map(|tokens| weigh(tokens, &vocabulary, &idf)).collect();

    let fields = corpus
        .iter()
        .map(|doc| FieldTerms {
            title: tokenize(&doc.title).into_iter().collect(),
            author: tokenize(&doc.author).into_iter().collect(),
        })
        .collect();

    let mut positions: HashMap<String, usize> = HashMap::with_capacity(corpus.len());
    for (position, doc) in corpus.iter().enumerate() {
        positions.entry(doc.id.clone()).or_insert(position);
    }

    tracing::info!(num_docs = corpus.len(), num_terms = vocabulary.len(), "index built");
    Index { vocabulary, idf, vectors, fields, positions }
}
