//! Specialization resolver.
//!
//! Maps a free-text symptom description to a ranked list of candidate
//! specializations, best match first. The knowledge source sits behind the
//! [`SymptomSource`] seam so a network-backed service can replace the
//! built-in keyword index; source unavailability surfaces as the recoverable
//! [`QueueError::ResolverUnavailable`], never a crash.

use crate::error::{QueueError, QueueResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A candidate specialization for a symptom description.
///
/// Ephemeral: produced per resolution, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    pub name: String,
    pub description: String,
}

/// Knowledge source behind the resolver.
///
/// Returns candidates with a relevance score; order is irrelevant, the
/// resolver ranks. A remote source reports unavailability as
/// [`QueueError::ResolverUnavailable`].
pub trait SymptomSource: Send + Sync {
    fn candidates(&self, symptom_text: &str) -> QueueResult<Vec<(Specialization, u32)>>;
}

struct IndexEntry {
    name: &'static str,
    description: &'static str,
    keywords: &'static [&'static str],
}

/// Built-in keyword index over common presenting symptoms.
///
/// Scores a specialization by how many of its keywords appear in the
/// lowercased symptom text.
pub struct KeywordSymptomIndex {
    entries: Vec<IndexEntry>,
}

impl KeywordSymptomIndex {
    pub fn new() -> Self {
        Self {
            entries: vec![
                IndexEntry {
                    name: "Cardiology",
                    description: "Heart and circulatory conditions",
                    keywords: &["chest pain", "palpitation", "breathless", "heart"],
                },
                IndexEntry {
                    name: "Dermatology",
                    description: "Skin, hair and nail conditions",
                    keywords: &["rash", "itch", "skin", "eczema", "acne"],
                },
                IndexEntry {
                    name: "Orthopaedics",
                    description: "Bones, joints and musculoskeletal injuries",
                    keywords: &["fracture", "joint", "back pain", "knee", "shoulder"],
                },
                IndexEntry {
                    name: "Neurology",
                    description: "Brain and nervous system disorders",
                    keywords: &["headache", "migraine", "seizure", "numbness", "dizzy"],
                },
                IndexEntry {
                    name: "Gastroenterology",
                    description: "Digestive system conditions",
                    keywords: &["stomach", "nausea", "vomit", "diarrhoea", "abdominal"],
                },
                IndexEntry {
                    name: "ENT",
                    description: "Ear, nose and throat conditions",
                    keywords: &["ear", "throat", "nose", "sinus", "hearing"],
                },
                IndexEntry {
                    name: "Ophthalmology",
                    description: "Eye and vision conditions",
                    keywords: &["eye", "vision", "blurred", "red eye"],
                },
                IndexEntry {
                    name: "General Medicine",
                    description: "Undifferentiated and general complaints",
                    keywords: &["fever", "fatigue", "cough", "cold", "weakness"],
                },
            ],
        }
    }
}

impl Default for KeywordSymptomIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SymptomSource for KeywordSymptomIndex {
    fn candidates(&self, symptom_text: &str) -> QueueResult<Vec<(Specialization, u32)>> {
        let text = symptom_text.to_lowercase();
        Ok(self
            .entries
            .iter()
            .map(|entry| {
                let score = entry
                    .keywords
                    .iter()
                    .filter(|keyword| text.contains(*keyword))
                    .count() as u32;
                (
                    Specialization {
                        name: entry.name.to_owned(),
                        description: entry.description.to_owned(),
                    },
                    score,
                )
            })
            .collect())
    }
}

/// Ranks specializations for a symptom description.
pub struct SpecializationResolver {
    source: Arc<dyn SymptomSource>,
}

impl SpecializationResolver {
    pub fn new(source: Arc<dyn SymptomSource>) -> Self {
        Self { source }
    }

    /// Resolver backed by the built-in keyword index.
    pub fn with_builtin_index() -> Self {
        Self::new(Arc::new(KeywordSymptomIndex::new()))
    }

    /// Resolves a symptom description to specializations ordered by
    /// descending relevance; the first element is the best match.
    ///
    /// Empty or whitespace-only input yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Propagates `QueueError::ResolverUnavailable` from a source that cannot
    /// be reached; callers treat this as recoverable and may retry.
    pub fn resolve(&self, symptom_text: &str) -> QueueResult<Vec<Specialization>> {
        if symptom_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = self.source.candidates(symptom_text).map_err(|e| match e {
            QueueError::ResolverUnavailable(_) => e,
            other => QueueError::ResolverUnavailable(other.to_string()),
        })?;

        scored.retain(|(_, score)| *score > 0);
        // Stable sort keeps the index's own order for equal scores.
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(scored.into_iter().map(|(spec, _)| spec).collect())
    }
}
