use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{AdjustmentSummary, EstimatedValueRange, ScoredComparable};
use super::service::{Stage, ValuationError};

/// Keep the spread from collapsing to a false-precision zero width when all
/// comparables land on nearly the same adjusted price.
const DEFAULT_SPREAD_FLOOR_PCT: f64 = 0.02;
/// Cap the spread below the most-likely value so the low bound stays
/// positive even under wild dispersion.
const MAX_SPREAD_FRACTION: f64 = 0.95;

/// How the low/high band is derived from the selected comparables. The
/// formula is market policy, not algorithm, so it stays swappable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadPolicy {
    /// One population standard deviation of adjusted prices, floored at a
    /// percentage of the most-likely value.
    StdDev { floor_pct: f64 },
    /// Fixed percentage band around the most-likely value.
    FixedPercent { pct: f64 },
}

impl Default for SpreadPolicy {
    fn default() -> Self {
        SpreadPolicy::StdDev {
            floor_pct: DEFAULT_SPREAD_FLOOR_PCT,
        }
    }
}

impl SpreadPolicy {
    fn spread(&self, most_likely: f64, adjusted_prices: &[f64]) -> f64 {
        let raw = match self {
            SpreadPolicy::StdDev { floor_pct } => {
                population_std_dev(adjusted_prices).max(floor_pct * most_likely)
            }
            SpreadPolicy::FixedPercent { pct } => pct * most_likely,
        };
        raw.min(most_likely * MAX_SPREAD_FRACTION)
    }
}

/// Relative importance of the confidence inputs. Each term lives in [0, 1]
/// and the weights sum to 1, so the combination is monotone in every term
/// without needing a clamp to do real work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub count: f64,
    pub similarity: f64,
    pub dispersion: f64,
    pub recency: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            count: 0.25,
            similarity: 0.35,
            dispersion: 0.25,
            recency: 0.15,
        }
    }
}

/// Inputs the synthesizer needs beyond the scored set itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisContext {
    pub max_comparables: usize,
    pub max_age_days: i64,
    pub as_of: NaiveDate,
}

/// Value band, confidence, and the selected comparables in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub range: EstimatedValueRange,
    pub confidence_score: f64,
    pub comparables: Vec<ScoredComparable>,
    pub adjustment_summary: AdjustmentSummary,
}

/// Combines the top-N comparables into an estimate band and confidence.
#[derive(Debug, Clone)]
pub struct EstimateSynthesizer {
    spread: SpreadPolicy,
    confidence: ConfidenceWeights,
}

impl EstimateSynthesizer {
    pub fn new(spread: SpreadPolicy, confidence: ConfidenceWeights) -> Self {
        Self { spread, confidence }
    }

    pub fn synthesize(
        &self,
        mut scored: Vec<ScoredComparable>,
        ctx: &SynthesisContext,
    ) -> Result<SynthesisOutcome, ValuationError> {
        if scored.is_empty() {
            return Err(ValuationError::InsufficientData {
                stage: Stage::Synthesis,
                reason: "no adjusted comparables available".to_string(),
            });
        }

        scored.sort_by(compare_comparables);
        scored.truncate(ctx.max_comparables);

        let weight_sum: f64 = scored.iter().map(|comp| comp.similarity_score).sum();
        if weight_sum <= 0.0 {
            return Err(ValuationError::InsufficientData {
                stage: Stage::Synthesis,
                reason: "all selected comparables have zero similarity".to_string(),
            });
        }

        let most_likely = scored
            .iter()
            .map(|comp| comp.similarity_score * comp.adjusted_price)
            .sum::<f64>()
            / weight_sum;

        let adjusted_prices: Vec<f64> = scored.iter().map(|comp| comp.adjusted_price).collect();
        let spread = self.spread.spread(most_likely, &adjusted_prices);

        let range = EstimatedValueRange {
            low: most_likely - spread,
            most_likely,
            high: most_likely + spread,
        };

        let confidence_score = self.confidence_score(&scored, most_likely, &adjusted_prices, ctx);

        let totals: Vec<f64> = scored.iter().map(|comp| comp.adjustments.total).collect();
        let adjustment_summary = AdjustmentSummary {
            average_adjustment: totals.iter().sum::<f64>() / totals.len() as f64,
            min_adjustment: totals.iter().copied().fold(f64::INFINITY, f64::min),
            max_adjustment: totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };

        Ok(SynthesisOutcome {
            range,
            confidence_score,
            comparables: scored,
            adjustment_summary,
        })
    }

    fn confidence_score(
        &self,
        selected: &[ScoredComparable],
        most_likely: f64,
        adjusted_prices: &[f64],
        ctx: &SynthesisContext,
    ) -> f64 {
        let count_term = if ctx.max_comparables > 0 {
            (selected.len() as f64 / ctx.max_comparables as f64).min(1.0)
        } else {
            0.0
        };

        let similarity_term = selected
            .iter()
            .map(|comp| comp.similarity_score)
            .sum::<f64>()
            / selected.len() as f64
            / 100.0;

        let dispersion_term = {
            let cv = population_std_dev(adjusted_prices) / most_likely;
            1.0 / (1.0 + cv)
        };

        let recency_term = selected
            .iter()
            .map(|comp| {
                let days = (ctx.as_of - comp.sale.sale_date).num_days().max(0) as f64;
                (1.0 - days / ctx.max_age_days as f64).max(0.0)
            })
            .sum::<f64>()
            / selected.len() as f64;

        let weights = &self.confidence;
        let score = weights.count * count_term
            + weights.similarity * similarity_term
            + weights.dispersion * dispersion_term
            + weights.recency * recency_term;

        score.clamp(0.0, 1.0)
    }
}

/// Report order: similarity descending, ties broken by more recent sale,
/// then fewer days on market (unknown days sort last).
pub(crate) fn compare_comparables(a: &ScoredComparable, b: &ScoredComparable) -> Ordering {
    b.similarity_score
        .partial_cmp(&a.similarity_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.sale.sale_date.cmp(&a.sale.sale_date))
        .then_with(|| {
            let a_days = a.sale.days_on_market.unwrap_or(u32::MAX);
            let b_days = b.sale.days_on_market.unwrap_or(u32::MAX);
            a_days.cmp(&b_days)
        })
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}
