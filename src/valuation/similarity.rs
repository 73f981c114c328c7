use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{CandidateSale, PropertyFeatures};

const MAX_AGE_DIFFERENCE_YEARS: f64 = 50.0;
const MAX_BEDROOM_DIFFERENCE: f64 = 5.0;
const MAX_BATHROOM_DIFFERENCE: f64 = 3.0;

/// Feature dimensions contributing to a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFactor {
    Size,
    Distance,
    Age,
    Rooms,
    Recency,
}

/// Per-deployment weighting of the similarity factors. Weights must sum to
/// 1; factors unknown on either side are skipped and the remainder is
/// renormalized at scoring time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub size: f64,
    pub distance: f64,
    pub age: f64,
    pub rooms: f64,
    pub recency: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            size: 0.30,
            distance: 0.25,
            age: 0.15,
            rooms: 0.15,
            recency: 0.15,
        }
    }
}

impl SimilarityWeights {
    pub fn is_normalized(&self) -> bool {
        let sum = self.size + self.distance + self.age + self.rooms + self.recency;
        (sum - 1.0).abs() < 1e-6
    }
}

/// Request-scoped facts the decay functions depend on. "Now" arrives here
/// so identical inputs always reproduce the identical score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringContext {
    pub radius_miles: f64,
    pub max_age_days: i64,
    pub as_of: NaiveDate,
}

/// One factor's contribution, kept for audit trails and reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityComponent {
    pub factor: SimilarityFactor,
    pub weight: f64,
    pub sub_score: f64,
}

/// Composite similarity in [0, 100] plus the per-factor trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub total: f64,
    pub components: Vec<SimilarityComponent>,
}

/// Stateless scorer applying the configured weights to a candidate.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
}

impl SimilarityScorer {
    pub fn new(weights: SimilarityWeights) -> Self {
        Self { weights }
    }

    /// Score a candidate against the subject. Each sub-score is a decay of
    /// the relative difference in [0, 1]; the weighted sum is renormalized
    /// over the factors actually comparable and scaled to 100.
    pub fn score(
        &self,
        subject: &PropertyFeatures,
        candidate: &CandidateSale,
        ctx: &ScoringContext,
    ) -> SimilarityScore {
        let mut components = Vec::new();

        if let Some(sub) = size_sub_score(subject, &candidate.features) {
            components.push(SimilarityComponent {
                factor: SimilarityFactor::Size,
                weight: self.weights.size,
                sub_score: sub,
            });
        }
        if let Some(sub) = distance_sub_score(subject, &candidate.features, ctx) {
            components.push(SimilarityComponent {
                factor: SimilarityFactor::Distance,
                weight: self.weights.distance,
                sub_score: sub,
            });
        }
        if let Some(sub) = age_sub_score(subject, &candidate.features) {
            components.push(SimilarityComponent {
                factor: SimilarityFactor::Age,
                weight: self.weights.age,
                sub_score: sub,
            });
        }
        if let Some(sub) = rooms_sub_score(subject, &candidate.features) {
            components.push(SimilarityComponent {
                factor: SimilarityFactor::Rooms,
                weight: self.weights.rooms,
                sub_score: sub,
            });
        }
        if let Some(sub) = recency_sub_score(candidate.sale_date, ctx) {
            components.push(SimilarityComponent {
                factor: SimilarityFactor::Recency,
                weight: self.weights.recency,
                sub_score: sub,
            });
        }

        let weight_sum: f64 = components.iter().map(|c| c.weight).sum();
        let total = if weight_sum > 0.0 {
            let weighted: f64 = components.iter().map(|c| c.weight * c.sub_score).sum();
            (weighted / weight_sum * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        SimilarityScore { total, components }
    }
}

fn decay(difference: f64, span: f64) -> f64 {
    if span <= 0.0 {
        return 0.0;
    }
    (1.0 - difference / span).max(0.0)
}

fn size_sub_score(subject: &PropertyFeatures, candidate: &PropertyFeatures) -> Option<f64> {
    let subject_sqft = subject.square_footage? as f64;
    let candidate_sqft = candidate.square_footage? as f64;
    Some(decay((subject_sqft - candidate_sqft).abs(), subject_sqft))
}

fn distance_sub_score(
    subject: &PropertyFeatures,
    candidate: &PropertyFeatures,
    ctx: &ScoringContext,
) -> Option<f64> {
    let subject_location = subject.location?;
    let candidate_location = candidate.location?;
    let miles = subject_location.distance_miles(&candidate_location);
    Some(decay(miles, ctx.radius_miles))
}

fn age_sub_score(subject: &PropertyFeatures, candidate: &PropertyFeatures) -> Option<f64> {
    let subject_year = subject.year_built?;
    let candidate_year = candidate.year_built?;
    let years = (subject_year - candidate_year).abs() as f64;
    Some(decay(years, MAX_AGE_DIFFERENCE_YEARS))
}

/// Bedrooms and bathrooms share one weighted slot; whichever of the two is
/// comparable contributes, averaged.
fn rooms_sub_score(subject: &PropertyFeatures, candidate: &PropertyFeatures) -> Option<f64> {
    let bedroom = match (subject.bedrooms, candidate.bedrooms) {
        (Some(s), Some(c)) => Some(decay(
            (s as f64 - c as f64).abs(),
            MAX_BEDROOM_DIFFERENCE,
        )),
        _ => None,
    };
    let bathroom = match (subject.bathrooms, candidate.bathrooms) {
        (Some(s), Some(c)) => Some(decay((s - c).abs(), MAX_BATHROOM_DIFFERENCE)),
        _ => None,
    };

    match (bedroom, bathroom) {
        (Some(bed), Some(bath)) => Some((bed + bath) / 2.0),
        (Some(bed), None) => Some(bed),
        (None, Some(bath)) => Some(bath),
        (None, None) => None,
    }
}

fn recency_sub_score(sale_date: NaiveDate, ctx: &ScoringContext) -> Option<f64> {
    let days_since = (ctx.as_of - sale_date).num_days();
    if days_since < 0 {
        return None;
    }
    Some(decay(days_since as f64, ctx.max_age_days as f64))
}
