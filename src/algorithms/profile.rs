use super::sparse::SparseVector;
use super::IndexedCatalog;
use crate::config::EventWeights;
use crate::models::{EventType, InteractionEvent};
use nalgebra::DVector;

#[derive(Debug, Clone, PartialEq)]
pub enum UserProfile {
    /// Unit-length weighted centroid of the videos the user engaged with.
    Present(SparseVector),
    /// No positive signal to personalize on.
    Absent,
}

impl UserProfile {
    pub fn is_present(&self) -> bool {
        matches!(self, UserProfile::Present(_))
    }

    pub fn vector(&self) -> Option<&SparseVector> {
        match self {
            UserProfile::Present(vector) => Some(vector),
            UserProfile::Absent => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    weights: EventWeights,
}

impl ProfileBuilder {
    pub fn new(weights: EventWeights) -> Self {
        Self { weights }
    }

    /// Contribution of a single event, or `None` when it says nothing about taste.
    pub fn event_weight(&self, event: &InteractionEvent, duration_seconds: Option<u32>) -> Option<f32> {
        match event.event_type {
            EventType::Like => Some(self.weights.like),
            EventType::Click => Some(self.weights.click),
            EventType::Watch => {
                let completion = match (event.watch_seconds, duration_seconds) {
                    (Some(watched), Some(duration)) if duration > 0 => {
                        (watched as f32 / duration as f32).min(1.0)
                    }
                    _ => self.weights.watch_default_completion,
                };
                Some(self.weights.watch * completion)
            }
            EventType::Skip => None,
        }
    }

    pub fn build(&self, events: &[InteractionEvent], catalog: &IndexedCatalog) -> UserProfile {
        let index = &catalog.index;
        if index.dimension() == 0 {
            return UserProfile::Absent;
        }

        let mut centroid = DVector::<f32>::zeros(index.dimension());
        let mut total_weight = 0.0f32;

        for event in events {
            let Some(row) = index.row_of(&event.video_id) else {
                continue;
            };
            let Some(weight) = self.event_weight(event, catalog.items[row].duration_seconds) else {
                continue;
            };
            let Some(vector) = index.vector_at(row) else {
                continue;
            };
            if weight <= 0.0 {
                continue;
            }

            for (column, value) in vector.iter() {
                centroid[column as usize] += weight * value;
            }
            total_weight += weight;
        }

        if total_weight <= 0.0 {
            return UserProfile::Absent;
        }

        centroid /= total_weight;
        let norm = centroid.norm();
        if norm == 0.0 || !norm.is_finite() {
            return UserProfile::Absent;
        }
        centroid /= norm;

        UserProfile::Present(SparseVector::from_dense(&centroid))
    }
}
