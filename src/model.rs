use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::DisplayThresholds;
use crate::error::RiskError;

pub const BUCKET_COUNT: usize = 5;

/// Upper delay, in minutes, of each bucket a predicted distribution covers.
pub const DELAY_BUCKETS: [f64; BUCKET_COUNT] = [0.0, 30.0, 90.0, 180.0, 300.0];

/// Probability mass per delay bucket, index-aligned with [`DELAY_BUCKETS`].
///
/// Construction guarantees exactly five finite, non-negative values. Raw
/// distributions from the predictor need not sum to one; adjusted ones do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct DelayDistribution([f64; BUCKET_COUNT]);

impl DelayDistribution {
    pub fn new(values: [f64; BUCKET_COUNT]) -> Result<Self, RiskError> {
        for (i, v) in values.iter().enumerate() {
            if !v.is_finite() {
                return Err(RiskError::InvalidDistribution(format!(
                    "bucket {i} is not a finite number ({v})"
                )));
            }
            if *v < 0.0 {
                return Err(RiskError::InvalidDistribution(format!(
                    "bucket {i} is negative ({v})"
                )));
            }
        }
        Ok(Self(values))
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, RiskError> {
        let values: [f64; BUCKET_COUNT] = values.try_into().map_err(|_| {
            RiskError::InvalidDistribution(format!(
                "expected {BUCKET_COUNT} values, got {}",
                values.len()
            ))
        })?;
        Self::new(values)
    }

    pub fn values(&self) -> &[f64; BUCKET_COUNT] {
        &self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Pairs of (bucket delay in minutes, probability mass).
    pub fn buckets(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        DELAY_BUCKETS.iter().copied().zip(self.0.iter().copied())
    }
}

impl TryFrom<Vec<f64>> for DelayDistribution {
    type Error = RiskError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<DelayDistribution> for Vec<f64> {
    fn from(dist: DelayDistribution) -> Self {
        dist.0.to_vec()
    }
}

impl FromStr for DelayDistribution {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<f64>().map_err(|_| {
                    RiskError::InvalidDistribution(format!("\"{part}\" is not a number"))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        Self::from_slice(&values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightLeg {
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    #[serde(with = "timestamp")]
    pub departure: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub arrival: NaiveDateTime,
}

impl FlightLeg {
    /// Scheduled block time. `None` when the local arrival reads earlier
    /// than the departure, as on an eastbound date-line crossing.
    pub fn duration_minutes(&self) -> Option<i64> {
        let minutes = (self.arrival - self.departure).num_minutes();
        (minutes >= 0).then_some(minutes)
    }
}

mod timestamp {
    use chrono::{NaiveDateTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        let fmt = if dt.second() == 0 {
            "%Y-%m-%dT%H:%M"
        } else {
            "%Y-%m-%dT%H:%M:%S"
        };
        s.serialize_str(&dt.format(fmt).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        crate::itinerary::parse_datetime(&raw).map_err(serde::de::Error::custom)
    }
}

/// Ordered, non-empty list of legs; N legs make N-1 connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Itinerary {
    legs: Vec<FlightLeg>,
}

impl Itinerary {
    pub fn new(legs: Vec<FlightLeg>) -> Result<Self, RiskError> {
        if legs.is_empty() {
            return Err(RiskError::Validation(
                "at least one flight leg required".into(),
            ));
        }
        Ok(Self { legs })
    }

    pub fn legs(&self) -> &[FlightLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn connection_count(&self) -> usize {
        self.legs.len() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Reliable,
    Moderate,
    HighRisk,
}

impl RiskTier {
    /// Thresholds apply to the rounded percentage shown to the traveler.
    pub fn classify(percent: u8, thresholds: &DisplayThresholds) -> Self {
        if percent >= thresholds.reliable_percent {
            Self::Reliable
        } else if percent >= thresholds.moderate_percent {
            Self::Moderate
        } else {
            Self::HighRisk
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Reliable => "reliable",
            Self::Moderate => "moderate",
            Self::HighRisk => "high risk",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn to_percent(probability: f64) -> u8 {
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Serialize)]
pub struct LegRisk {
    pub index: usize,
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub duration_minutes: Option<i64>,
    pub adjusted: DelayDistribution,
    pub expected_delay_minutes: f64,
    /// Rounded expected delay, `None` when too small to be worth showing.
    pub notable_delay_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRisk {
    pub from_leg: usize,
    pub to_leg: usize,
    pub arrival_airport: String,
    pub departure_airport: String,
    pub layover_minutes: f64,
    pub overhead_minutes: f64,
    pub margin_minutes: f64,
    pub probability: f64,
    pub percent: u8,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskResult {
    pub legs: Vec<LegRisk>,
    pub connections: Vec<ConnectionRisk>,
    pub success_probability: f64,
    pub success_percent: u8,
}

impl RiskResult {
    pub fn weakest_connection(&self) -> Option<&ConnectionRisk> {
        self.connections
            .iter()
            .min_by(|a, b| a.probability.total_cmp(&b.probability))
    }
}
