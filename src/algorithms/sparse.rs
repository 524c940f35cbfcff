use nalgebra::DVector;
use std::cmp::Ordering;

/// Sparse vector over the index vocabulary.
///
/// Entries are kept sorted by column so dot products are a linear merge.
/// Only non-zero weights are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vector from `(column, weight)` pairs. Duplicate columns are
    /// summed and zero weights dropped.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_by_key(|(idx, _)| *idx);

        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            match indices.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(idx);
                    values.push(value);
                }
            }
        }

        let mut vector = Self { indices, values };
        vector.prune();
        vector
    }

    pub fn from_dense(dense: &DVector<f32>) -> Self {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (idx, &value) in dense.iter().enumerate() {
            if value != 0.0 {
                indices.push(idx as u32);
                values.push(value);
            }
        }
        Self { indices, values }
    }

    fn prune(&mut self) {
        let mut keep = 0;
        for i in 0..self.indices.len() {
            if self.values[i] != 0.0 {
                self.indices[keep] = self.indices[i];
                self.values[keep] = self.values[i];
                keep += 1;
            }
        }
        self.indices.truncate(keep);
        self.values.truncate(keep);
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, column: u32) -> f32 {
        match self.indices.binary_search(&column) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Column-aligned pairs `(column, self_weight, other_weight)` present in
    /// both vectors.
    fn shared<'a>(&'a self, other: &'a SparseVector) -> impl Iterator<Item = (u32, f32, f32)> + 'a {
        let (mut i, mut j) = (0, 0);
        std::iter::from_fn(move || {
            while i < self.indices.len() && j < other.indices.len() {
                match self.indices[i].cmp(&other.indices[j]) {
                    Ordering::Less => i += 1,
                    Ordering::Greater => j += 1,
                    Ordering::Equal => {
                        let item = (self.indices[i], self.values[i], other.values[j]);
                        i += 1;
                        j += 1;
                        return Some(item);
                    }
                }
            }
            None
        })
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        self.shared(other).map(|(_, a, b)| a * b).sum()
    }

    /// Element-wise product; only shared columns survive.
    pub fn hadamard(&self, other: &SparseVector) -> SparseVector {
        let (indices, values) = self
            .shared(other)
            .map(|(column, a, b)| (column, a * b))
            .filter(|(_, v)| *v != 0.0)
            .unzip();
        Self { indices, values }
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scales to unit length. Zero vectors stay zero.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in self.values.iter_mut() {
                *v /= norm;
            }
        }
    }

    /// Up to `n` strongest columns, weight descending then column ascending.
    pub fn top_terms(&self, n: usize) -> Vec<(u32, f32)> {
        let mut entries: Vec<(u32, f32)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}
