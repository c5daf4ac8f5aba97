use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use wreq::Client;

use crate::error::{self, RiskError};
use crate::model::{DelayDistribution, FlightLeg, Itinerary};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/predict";

#[derive(Clone)]
pub struct FetchOptions {
    pub endpoint: String,
    pub proxy: Option<String>,
    pub timeout: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            proxy: None,
            timeout: 30,
        }
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    flights: &'a [FlightLeg],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Bare(Vec<Vec<f64>>),
    Wrapped { distributions: Vec<Vec<f64>> },
}

/// Decodes a predictor response body into one distribution per leg.
pub fn parse_response(body: &str, expected: usize) -> Result<Vec<DelayDistribution>, RiskError> {
    let response: PredictResponse = serde_json::from_str(body).map_err(|e| {
        RiskError::PredictorResponse(format!("unrecognised body ({e})"))
    })?;
    let raw = match response {
        PredictResponse::Bare(d) | PredictResponse::Wrapped { distributions: d } => d,
    };

    if raw.len() != expected {
        return Err(RiskError::InputMismatch {
            legs: expected,
            distributions: raw.len(),
        });
    }

    raw.iter()
        .map(|values| DelayDistribution::from_slice(values))
        .collect()
}

/// Asks the prediction service for one raw delay distribution per leg.
pub async fn fetch_distributions(
    itinerary: &Itinerary,
    options: &FetchOptions,
) -> Result<Vec<DelayDistribution>, RiskError> {
    let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout));

    if let Some(ref proxy) = options.proxy {
        let proxy = wreq::Proxy::all(proxy)
            .map_err(|e| RiskError::ProxyError(format!("{proxy}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    let client = builder
        .build()
        .map_err(|e| RiskError::ConnectionFailed(format!("cannot build HTTP client: {e}")))?;

    let body = serde_json::to_string(&PredictRequest {
        flights: itinerary.legs(),
    })
    .map_err(|e| RiskError::Validation(format!("cannot encode request: {e}")))?;

    info!(endpoint = %options.endpoint, legs = itinerary.len(), "requesting delay predictions");

    let response = client
        .post(options.endpoint.as_str())
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .map_err(error::from_http_error)?;

    let status = response.status().as_u16();
    match status {
        200 => {}
        429 => return Err(RiskError::RateLimited),
        _ if status >= 400 => return Err(RiskError::HttpStatus(status)),
        _ => {}
    }

    let text = response.text().await.map_err(error::from_http_error)?;
    let distributions = parse_response(&text, itinerary.len())?;
    info!(count = distributions.len(), "received delay predictions");
    Ok(distributions)
}
