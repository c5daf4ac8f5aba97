use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use skygamble::adjust::adjust;
use skygamble::aggregate::aggregate;
use skygamble::config::{Heuristics, ModelConfig, TransferOverhead};
use skygamble::connection::{connection_probability, probability_within};
use skygamble::error::RiskError;
use skygamble::estimate::expected_delay;
use skygamble::itinerary::parse_leg;
use skygamble::model::{DelayDistribution, FlightLeg, Itinerary, RiskTier};

fn dist(values: [f64; 5]) -> DelayDistribution {
    DelayDistribution::new(values).unwrap()
}

fn two_legs(junction_departure: &str, depart_next: &str) -> Vec<FlightLeg> {
    vec![
        parse_leg("F9 1234 ATL TPA 2025-10-04T22:00 2025-10-04T23:29").unwrap(),
        parse_leg(&format!(
            "UA 15 {junction_departure} SFO {depart_next} 2025-10-05T09:41"
        ))
        .unwrap(),
    ]
}

#[test]
fn reference_itinerary() {
    // adjusted before normalizing: 0.6, 0.2, 0.045, 0.024, 0.007 (sum 0.876)
    // margin 90 keeps buckets 0..=2: 0.845 / 0.876
    let raw = dist([0.5, 0.2, 0.15, 0.1, 0.05]);
    let legs = two_legs("TPA", "2025-10-05T01:29");
    let result = aggregate(&legs, &[raw, raw], &ModelConfig::default()).unwrap();

    let c = &result.connections[0];
    assert_eq!(c.layover_minutes, 120.0);
    assert_eq!(c.overhead_minutes, 30.0);
    assert_eq!(c.margin_minutes, 90.0);
    assert_abs_diff_eq!(c.probability, 0.845 / 0.876, epsilon = 1e-12);
    assert_eq!(c.percent, 96);
    assert_eq!(c.tier, RiskTier::Reliable);
    assert_eq!(result.success_percent, 96);

    assert_abs_diff_eq!(
        result.legs[0].expected_delay_minutes,
        16.47 / 0.876,
        epsilon = 1e-9
    );
    assert_eq!(result.legs[0].notable_delay_minutes, None);
}

#[test]
fn date_line_itinerary_is_scored() {
    let raw = dist([0.5, 0.2, 0.15, 0.1, 0.05]);
    let itinerary = Itinerary::new(vec![
        parse_leg("UA 870 SYD SFO 2025-10-05T10:00 2025-10-05T06:00").unwrap(),
        parse_leg("UA 2 SFO JFK 2025-10-05T08:00 2025-10-05T16:30").unwrap(),
    ])
    .unwrap();
    itinerary.validate().unwrap();

    let result = aggregate(itinerary.legs(), &[raw, raw], &ModelConfig::default()).unwrap();
    let c = &result.connections[0];
    assert_eq!(c.layover_minutes, 120.0);
    assert_eq!(c.margin_minutes, 90.0);
    assert_eq!(result.success_percent, 96);
    assert_eq!(result.legs[0].duration_minutes, None);
    assert_eq!(result.legs[1].duration_minutes, Some(510));
}

#[test]
fn airport_change_only_affects_overhead() {
    let raw = dist([0.5, 0.2, 0.15, 0.1, 0.05]);
    let adjusted = adjust(&raw, &Heuristics::default()).unwrap();
    let overhead = TransferOverhead::default();

    let same = two_legs("TPA", "2025-10-05T03:29");
    let other = two_legs("PIE", "2025-10-05T03:29");

    let a = connection_probability(&adjusted, &same[0], &same[1], &overhead);
    let b = connection_probability(&adjusted, &other[0], &other[1], &overhead);

    assert_eq!(a.layover_minutes, b.layover_minutes);
    assert_eq!(a.margin_minutes, 210.0);
    assert_eq!(b.margin_minutes, 90.0);
    assert!(a.probability > b.probability);
}

#[test]
fn downstream_distribution_is_ignored() {
    let legs = two_legs("TPA", "2025-10-05T01:29");
    let first = dist([0.5, 0.2, 0.15, 0.1, 0.05]);
    let calm = aggregate(&legs, &[first, dist([1.0, 0.0, 0.0, 0.0, 0.0])], &ModelConfig::default())
        .unwrap();
    let stormy = aggregate(&legs, &[first, dist([0.0, 0.0, 0.0, 0.0, 1.0])], &ModelConfig::default())
        .unwrap();
    assert_eq!(calm.connections[0].probability, stormy.connections[0].probability);
}

#[test]
fn heavy_delay_is_reported() {
    let legs = two_legs("TPA", "2025-10-05T01:29");
    let late = dist([0.1, 0.1, 0.3, 0.3, 0.3]);
    let result = aggregate(&legs, &[late, late], &ModelConfig::default()).unwrap();
    let leg = &result.legs[0];
    assert!(leg.expected_delay_minutes >= 30.0);
    assert_eq!(
        leg.notable_delay_minutes,
        Some(leg.expected_delay_minutes.round() as u32)
    );
}

#[test]
fn custom_overhead_changes_margin() {
    let mut config = ModelConfig::default();
    config.overhead.same_airport_minutes = 60.0;
    let raw = dist([0.5, 0.2, 0.15, 0.1, 0.05]);
    let legs = two_legs("TPA", "2025-10-05T01:29");
    let result = aggregate(&legs, &[raw, raw], &config).unwrap();
    assert_eq!(result.connections[0].margin_minutes, 60.0);
}

#[test]
fn mismatch_error() {
    let legs = two_legs("TPA", "2025-10-05T01:29");
    let err = aggregate(&legs, &[dist([1.0, 0.0, 0.0, 0.0, 0.0])], &ModelConfig::default())
        .unwrap_err();
    assert!(matches!(err, RiskError::InputMismatch { legs: 2, distributions: 1 }));
}

fn raw_distribution() -> impl Strategy<Value = DelayDistribution> {
    prop::array::uniform5(0.0..10.0f64).prop_map(|v| DelayDistribution::new(v).unwrap())
}

proptest! {
    #[test]
    fn prop_adjusted_sums_to_one(raw in raw_distribution()) {
        let adjusted = adjust(&raw, &Heuristics::default()).unwrap();
        prop_assert!((adjusted.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_adjust_is_deterministic(raw in raw_distribution()) {
        let a = adjust(&raw, &Heuristics::default()).unwrap();
        let b = adjust(&raw, &Heuristics::default()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_expected_delay_within_bucket_range(raw in raw_distribution()) {
        let adjusted = adjust(&raw, &Heuristics::default()).unwrap();
        let d = expected_delay(&adjusted);
        prop_assert!((0.0..=300.0 + 1e-9).contains(&d));
    }

    #[test]
    fn prop_negative_margin_is_zero(raw in raw_distribution(), margin in -1000.0..-0.001f64) {
        let adjusted = adjust(&raw, &Heuristics::default()).unwrap();
        prop_assert_eq!(probability_within(&adjusted, margin), 0.0);
    }

    #[test]
    fn prop_wide_margin_is_full_mass(raw in raw_distribution(), margin in 300.0..5000.0f64) {
        let adjusted = adjust(&raw, &Heuristics::default()).unwrap();
        prop_assert!((probability_within(&adjusted, margin) - adjusted.sum()).abs() < 1e-12);
    }

    #[test]
    fn prop_single_leg_is_certain(raw in raw_distribution()) {
        let leg = parse_leg("DL 1 ATL JFK 2025-10-04T08:00 2025-10-04T10:00").unwrap();
        let result = aggregate(&[leg], &[raw], &ModelConfig::default()).unwrap();
        prop_assert_eq!(result.success_percent, 100);
    }
}
