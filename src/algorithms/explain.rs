use super::cold_start::{ColdStartSignal, ColdStartTrigger};
use super::sparse::SparseVector;
use super::vectorizer::VectorSpaceIndex;
use crate::config::ExplanationConfig;

pub const PERSONALIZED_REASON: &str = "Similar to your recent watch and like history";
pub const NO_PROFILE_REASON: &str = "No viewing history yet; showing catalog picks";
pub const SHORTFALL_REASON: &str = "Not enough new similar videos; filling with catalog picks";
pub const RICHNESS_REASON: &str = "Popular, metadata-rich video";
pub const RECENCY_REASON: &str = "Recently published";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Explanation {
    pub reasons: Vec<String>,
    pub overlap_keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    config: ExplanationConfig,
}

impl ExplanationGenerator {
    pub fn new(config: ExplanationConfig) -> Self {
        Self { config }
    }

    /// Terms present in both vectors, ranked by their contribution to the
    /// cosine (`profile_weight * candidate_weight`), ties by term.
    pub fn overlap_keywords(
        &self,
        profile: &SparseVector,
        candidate: &SparseVector,
        index: &VectorSpaceIndex,
    ) -> Vec<String> {
        // Columns are assigned alphabetically, so column order is term order.
        profile
            .hadamard(candidate)
            .top_terms(self.config.max_keywords)
            .into_iter()
            .filter_map(|(column, _)| index.term(column).map(str::to_string))
            .collect()
    }

    pub fn personalized(
        &self,
        profile: &SparseVector,
        row: usize,
        index: &VectorSpaceIndex,
    ) -> Explanation {
        let overlap_keywords = index
            .vector_at(row)
            .map(|candidate| self.overlap_keywords(profile, candidate, index))
            .unwrap_or_default();

        let mut reasons = vec![PERSONALIZED_REASON.to_string()];
        if !overlap_keywords.is_empty() {
            reasons.push(format!("Overlapping keywords: {}", overlap_keywords.join(", ")));
        }

        Explanation {
            reasons,
            overlap_keywords,
        }
    }

    pub fn cold_start(&self, trigger: ColdStartTrigger, signal: ColdStartSignal) -> Explanation {
        let trigger_reason = match trigger {
            ColdStartTrigger::NoProfile => NO_PROFILE_REASON,
            ColdStartTrigger::Shortfall => SHORTFALL_REASON,
        };
        let signal_reason = match signal {
            ColdStartSignal::MetadataRichness => RICHNESS_REASON,
            ColdStartSignal::Recency => RECENCY_REASON,
        };

        Explanation {
            reasons: vec![trigger_reason.to_string(), signal_reason.to_string()],
            overlap_keywords: Vec::new(),
        }
    }
}
