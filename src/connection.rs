use crate::config::TransferOverhead;
use crate::model::{DelayDistribution, FlightLeg};

/// Layover cushion and chance of making it for one connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feasibility {
    pub layover_minutes: f64,
    pub overhead_minutes: f64,
    pub margin_minutes: f64,
    pub probability: f64,
}

pub fn transfer_overhead(
    current: &FlightLeg,
    next: &FlightLeg,
    overhead: &TransferOverhead,
) -> f64 {
    if next.departure_airport == current.arrival_airport {
        overhead.same_airport_minutes
    } else {
        overhead.different_airport_minutes
    }
}

/// Absolute gap between landing and the next departure, in minutes.
pub fn layover_minutes(current: &FlightLeg, next: &FlightLeg) -> f64 {
    let gap = next.departure - current.arrival;
    (gap.num_seconds() as f64 / 60.0).abs()
}

/// Probability mass of every bucket whose delay still fits inside `margin`.
pub fn probability_within(adjusted: &DelayDistribution, margin_minutes: f64) -> f64 {
    adjusted
        .buckets()
        .filter(|(minutes, _)| *minutes <= margin_minutes)
        .fold(0.0, |acc, (_, p)| acc + p)
}

/// Evaluates the connection from `current` to `next` using the adjusted
/// distribution of `current` only.
pub fn connection_probability(
    adjusted_from: &DelayDistribution,
    current: &FlightLeg,
    next: &FlightLeg,
    overhead: &TransferOverhead,
) -> Feasibility {
    let overhead_minutes = transfer_overhead(current, next, overhead);
    let layover_minutes = layover_minutes(current, next);
    let margin_minutes = layover_minutes - overhead_minutes;
    let probability = probability_within(adjusted_from, margin_minutes);

    Feasibility {
        layover_minutes,
        overhead_minutes,
        margin_minutes,
        probability,
    }
}
