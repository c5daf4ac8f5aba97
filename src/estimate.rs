use crate::model::DelayDistribution;

/// Probability-weighted delay in minutes. Expects an already normalized
/// distribution and does not re-normalize it.
pub fn expected_delay(adjusted: &DelayDistribution) -> f64 {
    adjusted.buckets().map(|(minutes, p)| minutes * p).sum()
}

/// Rounded delay for display, or `None` below the materiality threshold.
pub fn notable_delay(expected_minutes: f64, material_minutes: f64) -> Option<u32> {
    if expected_minutes < material_minutes {
        None
    } else {
        Some(expected_minutes.round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn all_on_time_is_zero() {
        let d = DelayDistribution::new([1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(expected_delay(&d), 0.0);
    }

    #[test]
    fn all_in_last_bucket_is_300() {
        let d = DelayDistribution::new([0.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(expected_delay(&d), 300.0);
    }

    #[test]
    fn weighted_mix() {
        let d = DelayDistribution::new([0.5, 0.25, 0.25, 0.0, 0.0]).unwrap();
        assert_abs_diff_eq!(expected_delay(&d), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn small_delays_are_suppressed() {
        assert_eq!(notable_delay(18.8, 30.0), None);
        assert_eq!(notable_delay(29.99, 30.0), None);
        assert_eq!(notable_delay(30.0, 30.0), Some(30));
        assert_eq!(notable_delay(47.6, 30.0), Some(48));
    }
}
