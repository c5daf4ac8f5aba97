use tracing::{debug, warn};

use crate::adjust::adjust;
use crate::config::ModelConfig;
use crate::connection::connection_probability;
use crate::error::RiskError;
use crate::estimate::{expected_delay, notable_delay};
use crate::model::{
    to_percent, ConnectionRisk, DelayDistribution, FlightLeg, LegRisk, RiskResult, RiskTier,
};

/// Runs the whole model over an itinerary.
///
/// Connections are treated as independent events: the overall probability
/// is the product of the unrounded per-connection probabilities, rounded
/// once at the end. A single leg has no connections and scores 100%.
pub fn aggregate(
    legs: &[FlightLeg],
    raw_distributions: &[DelayDistribution],
    config: &ModelConfig,
) -> Result<RiskResult, RiskError> {
    if legs.len() != raw_distributions.len() {
        return Err(RiskError::InputMismatch {
            legs: legs.len(),
            distributions: raw_distributions.len(),
        });
    }

    let mut leg_risks = Vec::with_capacity(legs.len());
    for (index, (leg, raw)) in legs.iter().zip(raw_distributions).enumerate() {
        let adjusted = adjust(raw, &config.heuristics)?;
        let expected = expected_delay(&adjusted);
        debug!(
            leg = index,
            flight = %leg.flight_number,
            expected_delay = expected,
            "adjusted delay distribution"
        );

        leg_risks.push(LegRisk {
            index,
            airline: leg.airline.clone(),
            flight_number: leg.flight_number.clone(),
            departure_airport: leg.departure_airport.clone(),
            arrival_airport: leg.arrival_airport.clone(),
            duration_minutes: leg.duration_minutes(),
            adjusted,
            expected_delay_minutes: expected,
            notable_delay_minutes: notable_delay(expected, config.display.material_delay_minutes),
        });
    }

    let mut connections = Vec::with_capacity(legs.len().saturating_sub(1));
    let mut success_probability = 1.0;
    for (i, pair) in legs.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);
        let f = connection_probability(&leg_risks[i].adjusted, current, next, &config.overhead);
        let percent = to_percent(f.probability);

        debug!(
            from_leg = i,
            layover = f.layover_minutes,
            margin = f.margin_minutes,
            probability = f.probability,
            "evaluated connection"
        );
        if f.margin_minutes < 0.0 {
            warn!(
                airport = %current.arrival_airport,
                margin = f.margin_minutes,
                "connection cannot be made even without delay"
            );
        }

        success_probability *= f.probability;
        connections.push(ConnectionRisk {
            from_leg: i,
            to_leg: i + 1,
            arrival_airport: current.arrival_airport.clone(),
            departure_airport: next.departure_airport.clone(),
            layover_minutes: f.layover_minutes,
            overhead_minutes: f.overhead_minutes,
            margin_minutes: f.margin_minutes,
            probability: f.probability,
            percent,
            tier: RiskTier::classify(percent, &config.display),
        });
    }

    Ok(RiskResult {
        legs: leg_risks,
        connections,
        success_probability,
        success_percent: to_percent(success_probability),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn leg(from: &str, to: &str, dep: &str, arr: &str) -> FlightLeg {
        let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap();
        FlightLeg {
            airline: "DL".into(),
            flight_number: "DL1".into(),
            departure_airport: from.into(),
            arrival_airport: to.into(),
            departure: at(dep),
            arrival: at(arr),
        }
    }

    fn dist(values: [f64; 5]) -> DelayDistribution {
        DelayDistribution::new(values).unwrap()
    }

    #[test]
    fn mismatch_is_reported() {
        let legs = vec![leg("ATL", "TPA", "2025-10-04T22:00", "2025-10-04T23:29")];
        let err = aggregate(&legs, &[], &ModelConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            RiskError::InputMismatch {
                legs: 1,
                distributions: 0
            }
        ));
    }

    #[test]
    fn single_leg_is_certain() {
        let legs = vec![leg("ATL", "TPA", "2025-10-04T22:00", "2025-10-04T23:29")];
        let result =
            aggregate(&legs, &[dist([0.0, 0.0, 0.0, 0.0, 9.0])], &ModelConfig::default()).unwrap();
        assert!(result.connections.is_empty());
        assert_eq!(result.success_percent, 100);
        assert_eq!(result.legs.len(), 1);
    }

    #[test]
    fn product_is_rounded_once() {
        // each connection ~0.9646 rounds to 96; the product 0.9305 rounds to 93
        let raw = dist([0.5, 0.2, 0.15, 0.1, 0.05]);
        let legs = vec![
            leg("ATL", "TPA", "2025-10-04T08:00", "2025-10-04T09:30"),
            leg("TPA", "IAH", "2025-10-04T11:30", "2025-10-04T13:00"),
            leg("IAH", "SFO", "2025-10-04T15:00", "2025-10-04T17:30"),
        ];
        let result = aggregate(&legs, &[raw, raw, raw], &ModelConfig::default()).unwrap();
        assert_eq!(result.connections.len(), 2);
        assert!(result.connections.iter().all(|c| c.percent == 96));
        assert_eq!(result.success_percent, 93);
    }

    #[test]
    fn infeasible_connection_zeroes_itinerary() {
        let raw = dist([1.0, 0.0, 0.0, 0.0, 0.0]);
        let legs = vec![
            leg("ATL", "JFK", "2025-10-04T08:00", "2025-10-04T10:00"),
            leg("LGA", "BOS", "2025-10-04T11:00", "2025-10-04T12:15"),
        ];
        let result = aggregate(&legs, &[raw, raw], &ModelConfig::default()).unwrap();
        assert_eq!(result.connections[0].probability, 0.0);
        assert_eq!(result.connections[0].tier, RiskTier::HighRisk);
        assert_eq!(result.success_percent, 0);
    }
}
