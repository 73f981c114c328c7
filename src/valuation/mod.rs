//! Comparative market analysis engine: screens a pool of sold properties,
//! scores each against the subject, converts feature differences into
//! dollar adjustments, and synthesizes a value range with a confidence
//! score. Pure computation over an input snapshot; geocoding, sale data,
//! and market unit values arrive through collaborator traits.

pub mod adjustments;
pub mod cache;
pub mod domain;
pub mod normalizer;
pub mod providers;
pub mod screening;
pub mod service;
pub mod similarity;
pub mod synthesis;

#[cfg(test)]
mod tests;

pub use adjustments::{AdjustmentCalculator, MarketUnitValues};
pub use cache::{CacheKey, ValuationCache};
pub use domain::{
    AdjustmentBreakdown, AdjustmentSummary, CandidateSale, Coordinates, EstimatedValueRange,
    PropertyFeatures, PropertyType, RawPropertyRecord, SaleStatus, ScoredComparable,
    ValuationRequest, ValuationResult,
};
pub use providers::{
    AnalysisSink, Geocoder, GeocodeError, MarketDataProvider, PoolError, SalePool, SinkError,
    StaticMarketData,
};
pub use screening::{screen, screen_all, ScreeningCriteria};
pub use service::{EngineConfig, Stage, ValuationError, ValuationService};
pub use similarity::{
    ScoringContext, SimilarityFactor, SimilarityScore, SimilarityScorer, SimilarityWeights,
};
pub use synthesis::{ConfidenceWeights, EstimateSynthesizer, SpreadPolicy, SynthesisContext};
