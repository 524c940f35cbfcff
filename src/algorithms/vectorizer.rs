//! TF-IDF vector space fitted over a catalog snapshot.
//!
//! Weights follow `tf(t, d) * idf(t)` with the smoothed
//! `idf(t) = ln((1 + N) / (1 + df(t))) + 1`, and every row is L2-normalized
//! so cosine similarity is a plain dot product.

use super::corpus::{build_corpus, tokenize};
use super::sparse::SparseVector;
use crate::error::{RecError, RecResult};
use crate::models::CatalogItem;
use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Identifies a catalog snapshot: item count plus a hash over every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogFingerprint {
    pub items: usize,
    pub content_hash: u64,
}

impl CatalogFingerprint {
    pub fn of(items: &[CatalogItem]) -> Self {
        let mut hasher = DefaultHasher::new();
        items.hash(&mut hasher);
        Self {
            items: items.len(),
            content_hash: hasher.finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorSpaceIndex {
    fingerprint: CatalogFingerprint,
    /// column -> term, alphabetical
    terms: Vec<String>,
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    item_ids: Vec<String>,
    rows: Vec<SparseVector>,
    row_by_id: HashMap<String, usize>,
}

impl VectorSpaceIndex {
    /// Fits the vocabulary and per-item vectors. Rows line up with `items`.
    pub fn fit(items: &[CatalogItem], max_features: usize) -> RecResult<Self> {
        if max_features == 0 {
            return Err(RecError::IndexBuild(
                "max_features must be at least 1".to_string(),
            ));
        }

        let mut row_by_id = HashMap::with_capacity(items.len());
        for (row, item) in items.iter().enumerate() {
            if row_by_id.insert(item.id.clone(), row).is_some() {
                return Err(RecError::IndexBuild(format!(
                    "duplicate video id {} in catalog snapshot",
                    item.id
                )));
            }
        }

        let corpus = build_corpus(items);
        let tokenized: Vec<Vec<String>> = corpus.par_iter().map(|doc| tokenize(doc)).collect();

        let mut corpus_counts: HashMap<&str, u64> = HashMap::new();
        let mut doc_freq: HashMap<&str, u32> = HashMap::new();
        for tokens in &tokenized {
            let mut seen = HashSet::new();
            for token in tokens {
                *corpus_counts.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut kept: Vec<&str> = corpus_counts.keys().copied().collect();
        if kept.len() > max_features {
            kept.sort_by(|a, b| corpus_counts[b].cmp(&corpus_counts[a]).then(a.cmp(b)));
            kept.truncate(max_features);
        }
        kept.sort_unstable();

        let n = items.len() as f32;
        let idf: Vec<f32> = kept
            .iter()
            .map(|term| {
                let df = doc_freq[term] as f32;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let terms: Vec<String> = kept.iter().map(|term| term.to_string()).collect();
        let vocabulary: HashMap<String, u32> = terms
            .iter()
            .enumerate()
            .map(|(column, term)| (term.clone(), column as u32))
            .collect();

        // Each occurrence contributes idf once; from_pairs sums them into tf * idf.
        let rows: Vec<SparseVector> = tokenized
            .par_iter()
            .map(|tokens| {
                let pairs = tokens
                    .iter()
                    .filter_map(|token| {
                        vocabulary
                            .get(token.as_str())
                            .map(|&column| (column, idf[column as usize]))
                    })
                    .collect();
                let mut row = SparseVector::from_pairs(pairs);
                row.normalize();
                row
            })
            .collect();

        Ok(Self {
            fingerprint: CatalogFingerprint::of(items),
            terms,
            vocabulary,
            idf,
            item_ids: items.iter().map(|item| item.id.clone()).collect(),
            rows,
            row_by_id,
        })
    }

    pub fn fingerprint(&self) -> CatalogFingerprint {
        self.fingerprint
    }

    /// Vocabulary size.
    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn row_of(&self, video_id: &str) -> Option<usize> {
        self.row_by_id.get(video_id).copied()
    }

    pub fn vector(&self, video_id: &str) -> Option<&SparseVector> {
        self.row_of(video_id).map(|row| &self.rows[row])
    }

    pub fn vector_at(&self, row: usize) -> Option<&SparseVector> {
        self.rows.get(row)
    }

    /// `(row, video_id, vector)` in catalog order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &str, &SparseVector)> + '_ {
        self.item_ids
            .iter()
            .zip(self.rows.iter())
            .enumerate()
            .map(|(row, (id, vector))| (row, id.as_str(), vector))
    }

    pub fn term(&self, column: u32) -> Option<&str> {
        self.terms.get(column as usize).map(|t| t.as_str())
    }

    pub fn column_of(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.column_of(term).map(|column| self.idf[column as usize])
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}
