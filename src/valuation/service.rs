use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::adjustments::AdjustmentCalculator;
use super::cache::ValuationCache;
use super::domain::{
    PropertyFeatures, RawPropertyRecord, ScoredComparable, ValuationRequest, ValuationResult,
};
use super::normalizer;
use super::providers::{AnalysisSink, Geocoder, GeocodeError, MarketDataProvider, PoolError, SalePool};
use super::screening::{self, ScreeningCriteria};
use super::similarity::{ScoringContext, SimilarityScorer, SimilarityWeights};
use super::synthesis::{ConfidenceWeights, EstimateSynthesizer, SpreadPolicy, SynthesisContext};

/// Pipeline stage names carried on every failure so callers can render an
/// actionable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    AddressResolution,
    PoolFetch,
    Screening,
    Adjustment,
    Synthesis,
}

impl Stage {
    pub const fn label(self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::AddressResolution => "address_resolution",
            Stage::PoolFetch => "pool_fetch",
            Stage::Screening => "screening",
            Stage::Adjustment => "adjustment",
            Stage::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Engine error taxonomy. `Validation` is surfaced verbatim and not
/// retried; `AddressResolution` and `DependencyTimeout` are transient and
/// retryable with backoff; `InsufficientData` is terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum ValuationError {
    #[error("invalid request: {reason}")]
    Validation { reason: String },
    #[error("could not resolve address '{address}': {source}")]
    AddressResolution {
        address: String,
        #[source]
        source: GeocodeError,
    },
    #[error("dependency timed out during {stage}")]
    DependencyTimeout { stage: Stage },
    #[error("insufficient data during {stage}: {reason}")]
    InsufficientData { stage: Stage, reason: String },
    #[error("provider failed during {stage}: {message}")]
    Provider { stage: Stage, message: String },
}

impl ValuationError {
    pub fn stage(&self) -> Stage {
        match self {
            ValuationError::Validation { .. } => Stage::Validation,
            ValuationError::AddressResolution { .. } => Stage::AddressResolution,
            ValuationError::DependencyTimeout { stage }
            | ValuationError::InsufficientData { stage, .. }
            | ValuationError::Provider { stage, .. } => *stage,
        }
    }
}

/// Tunable engine policy: screening window, similarity weights, spread and
/// confidence formulas. Market unit values arrive separately through the
/// market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_age_days: i64,
    pub weights: SimilarityWeights,
    pub spread: SpreadPolicy,
    pub confidence: ConfidenceWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_age_days: 180,
            weights: SimilarityWeights::default(),
            spread: SpreadPolicy::default(),
            confidence: ConfidenceWeights::default(),
        }
    }
}

/// Orchestrates screening, scoring, adjustment, and synthesis for one
/// valuation request. Holds no request-crossing mutable state beyond the
/// optional TTL cache, so independent requests can run fully in parallel.
pub struct ValuationService<G, P, M> {
    geocoder: Arc<G>,
    pool: Arc<P>,
    market: Arc<M>,
    config: EngineConfig,
    sink: Option<Arc<dyn AnalysisSink>>,
    cache: Option<Arc<ValuationCache>>,
}

impl<G, P, M> ValuationService<G, P, M>
where
    G: Geocoder + 'static,
    P: SalePool + 'static,
    M: MarketDataProvider + 'static,
{
    pub fn new(geocoder: Arc<G>, pool: Arc<P>, market: Arc<M>, config: EngineConfig) -> Self {
        Self {
            geocoder,
            pool,
            market,
            config,
            sink: None,
            cache: None,
        }
    }

    /// Attach a persistence collaborator receiving completed analyses.
    pub fn with_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attach a read-through result cache with single-flight recomputation.
    pub fn with_cache(mut self, cache: Arc<ValuationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Evaluate against the current wall clock with no deadline.
    pub fn evaluate(&self, request: &ValuationRequest) -> Result<ValuationResult, ValuationError> {
        self.evaluate_at(request, Utc::now(), None)
    }

    /// Evaluate with an explicit "now" (all recency math keys off it) and an
    /// optional overall deadline shared across collaborator calls.
    pub fn evaluate_at(
        &self,
        request: &ValuationRequest,
        now: DateTime<Utc>,
        deadline: Option<Duration>,
    ) -> Result<ValuationResult, ValuationError> {
        validate(request)?;

        if let Some(cache) = &self.cache {
            let key = ValuationCache::key_for(request);
            let result =
                cache.get_or_compute(key, || self.run_pipeline(request, now, deadline))?;
            return Ok((*result).clone());
        }

        self.run_pipeline(request, now, deadline)
    }

    fn run_pipeline(
        &self,
        request: &ValuationRequest,
        now: DateTime<Utc>,
        deadline: Option<Duration>,
    ) -> Result<ValuationResult, ValuationError> {
        info!(address = %request.address, radius = request.search_radius_miles, "starting valuation");
        let budget = Budget::start(deadline);

        let center = self
            .geocoder
            .resolve(&request.address, budget.remaining(Stage::AddressResolution)?)
            .map_err(|source| match source {
                GeocodeError::Timeout => ValuationError::DependencyTimeout {
                    stage: Stage::AddressResolution,
                },
                source => ValuationError::AddressResolution {
                    address: request.address.clone(),
                    source,
                },
            })?;

        let subject = subject_features(request, center);

        let raw_pool = self
            .pool
            .fetch(
                center,
                request.search_radius_miles,
                request.property_type,
                self.config.max_age_days,
                budget.remaining(Stage::PoolFetch)?,
            )
            .map_err(|source| match source {
                PoolError::Timeout => ValuationError::DependencyTimeout {
                    stage: Stage::PoolFetch,
                },
                PoolError::Unavailable(message) => ValuationError::Provider {
                    stage: Stage::PoolFetch,
                    message,
                },
            })?;

        let criteria = ScreeningCriteria {
            center,
            radius_miles: request.search_radius_miles,
            max_age_days: self.config.max_age_days,
            property_type: request.property_type,
            as_of: now.date_naive(),
        };
        let candidates = screening::screen_all(&raw_pool, &criteria)?;
        debug!(candidates = candidates.len(), "screening complete");

        let scorer = SimilarityScorer::new(self.config.weights);
        let calculator = AdjustmentCalculator::new(self.market.unit_values());
        let scoring_ctx = ScoringContext {
            radius_miles: request.search_radius_miles,
            max_age_days: self.config.max_age_days,
            as_of: now.date_naive(),
        };

        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let similarity = scorer.score(&subject, &candidate, &scoring_ctx);
            let adjustments = calculator.adjust(&subject, &candidate, now.date_naive());
            let adjusted_price = AdjustmentCalculator::adjusted_price(candidate.sale_price, &adjustments);

            if adjusted_price <= 0.0 {
                debug!(address = %candidate.address, adjusted_price, "excluding comparable with non-positive adjusted price");
                continue;
            }

            let distance_miles = candidate
                .features
                .location
                .map(|location| center.distance_miles(&location));

            scored.push(ScoredComparable {
                sale: candidate,
                similarity_score: similarity.total,
                distance_miles,
                adjustments,
                adjusted_price,
            });
        }

        if scored.is_empty() {
            return Err(ValuationError::InsufficientData {
                stage: Stage::Adjustment,
                reason: "no comparable kept a positive adjusted price".to_string(),
            });
        }

        let synthesizer = EstimateSynthesizer::new(self.config.spread, self.config.confidence);
        let outcome = synthesizer.synthesize(
            scored,
            &SynthesisContext {
                max_comparables: request.max_comparables,
                max_age_days: self.config.max_age_days,
                as_of: now.date_naive(),
            },
        )?;

        let result = ValuationResult {
            subject_address: request.address.clone(),
            subject,
            estimated_value: outcome.range,
            comparables: outcome.comparables,
            confidence_score: outcome.confidence_score,
            adjustment_summary: outcome.adjustment_summary,
            analyzed_at: now,
        };

        if let Some(sink) = &self.sink {
            if let Err(err) = sink.record(&result) {
                warn!(error = %err, "analysis sink rejected result");
            }
        }

        info!(
            comparables = result.comparables.len(),
            most_likely = result.estimated_value.most_likely,
            confidence = result.confidence_score,
            "valuation complete"
        );
        Ok(result)
    }
}

/// Remaining time shared across collaborator calls. An exhausted budget
/// fails before the call is made, so a slow dependency can never produce a
/// partial result.
struct Budget {
    started: Instant,
    deadline: Option<Duration>,
}

impl Budget {
    fn start(deadline: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            deadline,
        }
    }

    fn remaining(&self, stage: Stage) -> Result<Option<Duration>, ValuationError> {
        match self.deadline {
            None => Ok(None),
            Some(total) => {
                let elapsed = self.started.elapsed();
                if elapsed >= total {
                    Err(ValuationError::DependencyTimeout { stage })
                } else {
                    Ok(Some(total - elapsed))
                }
            }
        }
    }
}

fn validate(request: &ValuationRequest) -> Result<(), ValuationError> {
    let invalid = |reason: &str| ValuationError::Validation {
        reason: reason.to_string(),
    };

    if request.address.trim().is_empty() {
        return Err(invalid("address must not be empty"));
    }
    if !request.search_radius_miles.is_finite() || request.search_radius_miles <= 0.0 {
        return Err(invalid("search_radius_miles must be positive"));
    }
    if request.max_comparables < 1 {
        return Err(invalid("max_comparables must be at least 1"));
    }

    let attributes = [
        ("square_footage", request.square_footage),
        ("bedrooms", request.bedrooms),
        ("bathrooms", request.bathrooms),
        ("year_built", request.year_built),
        ("lot_size", request.lot_size),
    ];
    for (name, value) in attributes {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(ValuationError::Validation {
                    reason: format!("{name} must be a non-negative number"),
                });
            }
        }
    }

    Ok(())
}

/// Merge the geocoded location with request-supplied attributes, running
/// them through the same clamping as provider records.
fn subject_features(request: &ValuationRequest, center: super::domain::Coordinates) -> PropertyFeatures {
    let raw = RawPropertyRecord {
        address: request.address.clone(),
        latitude: Some(center.latitude),
        longitude: Some(center.longitude),
        property_type: None,
        square_footage: request.square_footage,
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        year_built: request.year_built,
        lot_size: request.lot_size,
        sale_price: None,
        sale_date: None,
        days_on_market: None,
        sale_status: None,
    };

    let mut features = normalizer::normalize(&raw);
    features.property_type = request.property_type;
    features
}
