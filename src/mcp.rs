use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::Deserialize;

use crate::config::ModelConfig;
use crate::error::RiskError;
use crate::fetch::FetchOptions;
use crate::itinerary::build_leg;
use crate::model::{DelayDistribution, Itinerary};
use crate::DistributionSource;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LegArgs {
    #[schemars(description = "2-letter IATA airline code. Example: UA, DL, F9")]
    airline: String,
    #[schemars(description = "Flight number, with or without the airline prefix. Example: UA15 or 15")]
    flight_number: String,
    #[schemars(description = "Departure airport IATA code, 3 letters. Example: TPA")]
    departure_airport: String,
    #[schemars(description = "Arrival airport IATA code, 3 letters. Example: SFO")]
    arrival_airport: String,
    #[schemars(description = "Local departure time, YYYY-MM-DDTHH:MM. Example: 2025-10-05T07:05")]
    departure: String,
    #[schemars(description = "Local arrival time, YYYY-MM-DDTHH:MM. Example: 2025-10-05T09:41")]
    arrival: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AssessArgs {
    #[schemars(description = "Flight legs in travel order. Each consecutive pair is one connection")]
    legs: Vec<LegArgs>,
    #[schemars(
        description = "Raw delay probabilities per leg, 5 numbers each for the 0/30/90/180/300 minute buckets. Example: [[0.5,0.2,0.15,0.1,0.05]]. Omit to query predictor_url instead"
    )]
    distributions: Option<Vec<Vec<f64>>>,
    #[schemars(description = "Prediction service URL, used when distributions is omitted")]
    predictor_url: Option<String>,
    #[schemars(description = "Prediction request timeout in seconds. Default: 30")]
    timeout: Option<u64>,
}

fn build_request(args: AssessArgs) -> Result<(Itinerary, DistributionSource), RiskError> {
    let legs = args
        .legs
        .iter()
        .map(|l| {
            build_leg(
                &l.airline,
                &l.flight_number,
                &l.departure_airport,
                &l.arrival_airport,
                &l.departure,
                &l.arrival,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    let itinerary = Itinerary::new(legs)?;

    let source = match (args.distributions, args.predictor_url) {
        (Some(raw), _) => DistributionSource::Inline(
            raw.iter()
                .map(|v| DelayDistribution::from_slice(v))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        (None, Some(url)) => DistributionSource::Predictor(FetchOptions {
            endpoint: url,
            proxy: None,
            timeout: args.timeout.unwrap_or(30),
        }),
        (None, None) => {
            return Err(RiskError::Validation(
                "either distributions or predictor_url is required".into(),
            ))
        }
    };

    Ok((itinerary, source))
}

fn tool_error(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.into())]))
}

#[derive(Debug, Clone)]
struct SkyGambleMcp {
    config: ModelConfig,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SkyGambleMcp {
    fn new(config: ModelConfig) -> Self {
        Self {
            config,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Estimate the probability of making every connection on a flight itinerary. Takes the legs in travel order plus either raw per-leg delay distributions or a prediction service URL. Returns JSON with per-leg expected delay, per-connection layover margin, percentage and risk tier (reliable, moderate, high_risk), and the overall success percentage."
    )]
    async fn skygamble_assess(
        &self,
        Parameters(args): Parameters<AssessArgs>,
    ) -> Result<CallToolResult, McpError> {
        let (itinerary, source) = match build_request(args) {
            Ok(r) => r,
            Err(e) => return tool_error(e.to_string()),
        };

        let result = match crate::assess(&itinerary, source, &self.config).await {
            Ok(r) => r,
            Err(e) => return tool_error(e.to_string()),
        };

        match serde_json::to_string_pretty(&result) {
            Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
            Err(e) => tool_error(format!("failed to serialize result: {e}")),
        }
    }
}

#[tool_handler]
impl ServerHandler for SkyGambleMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "skygamble".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Connection risk tool. Call skygamble_assess with the itinerary legs in travel order. Pass distributions when you already have delay predictions, otherwise pass predictor_url.".into(),
            ),
        }
    }
}

pub async fn run(config: ModelConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = SkyGambleMcp::new(config)
        .serve(rmcp::transport::stdio())
        .await?;
    service.waiting().await?;
    Ok(())
}
