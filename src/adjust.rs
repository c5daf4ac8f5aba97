use crate::config::Heuristics;
use crate::error::RiskError;
use crate::model::DelayDistribution;

/// Applies the heuristic corrections to a raw predictor distribution and
/// re-normalizes it so the buckets sum to one.
pub fn adjust(
    raw: &DelayDistribution,
    heuristics: &Heuristics,
) -> Result<DelayDistribution, RiskError> {
    let mut v = *raw.values();

    v[0] *= heuristics.on_time_boost;

    if v[1] < heuristics.minor_noise_threshold {
        v[1] *= heuristics.minor_noise_scale;
    }

    for (slot, rule) in v[2..].iter_mut().zip(heuristics.tail.iter()) {
        if *slot < rule.threshold {
            *slot = rule.floor;
        }
        *slot *= rule.scale;
    }

    let total: f64 = v.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(RiskError::InvalidDistribution(format!(
            "corrected buckets sum to {total}, cannot normalize"
        )));
    }

    for slot in v.iter_mut() {
        *slot /= total;
    }

    DelayDistribution::new(v)
}
