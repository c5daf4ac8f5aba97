pub mod adjust;
pub mod aggregate;
pub mod config;
pub mod connection;
pub mod error;
pub mod estimate;
pub mod fetch;
pub mod itinerary;
pub mod logging;
pub mod mcp;
pub mod model;
pub mod table;
pub mod ticket;

use config::ModelConfig;
use error::RiskError;
use fetch::FetchOptions;
use model::{DelayDistribution, Itinerary, RiskResult};

/// Where the raw per-leg delay distributions come from.
pub enum DistributionSource {
    Inline(Vec<DelayDistribution>),
    Predictor(FetchOptions),
}

pub async fn assess(
    itinerary: &Itinerary,
    source: DistributionSource,
    config: &ModelConfig,
) -> Result<RiskResult, RiskError> {
    itinerary.validate()?;
    tracing::debug!(
        legs = itinerary.len(),
        connections = itinerary.connection_count(),
        "assessing itinerary"
    );
    let raw = match source {
        DistributionSource::Inline(raw) => raw,
        DistributionSource::Predictor(options) => {
            fetch::fetch_distributions(itinerary, &options).await?
        }
    };
    aggregate::aggregate(itinerary.legs(), &raw, config)
}
