use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// "If the bucket is below `threshold`, set it to `floor`; then scale it."
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailRule {
    pub threshold: f64,
    pub floor: f64,
    pub scale: f64,
}

/// Corrections applied to raw predictor output before it is trusted.
///
/// The defaults are empirical and carry no derivation; they are kept
/// exactly so results stay comparable with earlier releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    pub on_time_boost: f64,
    pub minor_noise_threshold: f64,
    pub minor_noise_scale: f64,
    /// Rules for the 90, 180 and 300 minute buckets, in that order.
    pub tail: [TailRule; 3],
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            on_time_boost: 1.2,
            minor_noise_threshold: 0.15,
            minor_noise_scale: 0.1,
            tail: [
                TailRule {
                    threshold: 0.2,
                    floor: 0.05,
                    scale: 0.9,
                },
                TailRule {
                    threshold: 0.25,
                    floor: 0.03,
                    scale: 0.8,
                },
                TailRule {
                    threshold: 0.3,
                    floor: 0.01,
                    scale: 0.7,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferOverhead {
    pub same_airport_minutes: f64,
    pub different_airport_minutes: f64,
}

impl Default for TransferOverhead {
    fn default() -> Self {
        Self {
            same_airport_minutes: 30.0,
            different_airport_minutes: 150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayThresholds {
    /// Expected delays below this are not reported as a delay.
    pub material_delay_minutes: f64,
    pub reliable_percent: u8,
    pub moderate_percent: u8,
}

impl Default for DisplayThresholds {
    fn default() -> Self {
        Self {
            material_delay_minutes: 30.0,
            reliable_percent: 80,
            moderate_percent: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub heuristics: Heuristics,
    pub overhead: TransferOverhead,
    pub display: DisplayThresholds,
}

fn check_factor(name: &str, value: f64) -> Result<(), RiskError> {
    if !value.is_finite() || value < 0.0 {
        return Err(RiskError::Config(format!(
            "{name} must be a finite, non-negative number (got {value})"
        )));
    }
    Ok(())
}

impl ModelConfig {
    pub fn from_json_str(json: &str) -> Result<Self, RiskError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RiskError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RiskError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| RiskError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded model configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        let h = &self.heuristics;
        check_factor("heuristics.on_time_boost", h.on_time_boost)?;
        check_factor("heuristics.minor_noise_threshold", h.minor_noise_threshold)?;
        check_factor("heuristics.minor_noise_scale", h.minor_noise_scale)?;
        for (i, rule) in h.tail.iter().enumerate() {
            check_factor(&format!("heuristics.tail[{i}].threshold"), rule.threshold)?;
            check_factor(&format!("heuristics.tail[{i}].floor"), rule.floor)?;
            check_factor(&format!("heuristics.tail[{i}].scale"), rule.scale)?;
        }

        check_factor("overhead.same_airport_minutes", self.overhead.same_airport_minutes)?;
        check_factor(
            "overhead.different_airport_minutes",
            self.overhead.different_airport_minutes,
        )?;
        check_factor(
            "display.material_delay_minutes",
            self.display.material_delay_minutes,
        )?;

        if self.display.reliable_percent > 100 {
            return Err(RiskError::Config(format!(
                "display.reliable_percent must be at most 100 (got {})",
                self.display.reliable_percent
            )));
        }
        if self.display.moderate_percent > self.display.reliable_percent {
            return Err(RiskError::Config(format!(
                "display.moderate_percent ({}) exceeds display.reliable_percent ({})",
                self.display.moderate_percent, self.display.reliable_percent
            )));
        }

        Ok(())
    }
}
