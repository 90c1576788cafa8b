use serde::{Deserialize, Serialize};

/// Lowest and highest values accepted on the stress scale.
pub const STRESS_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// One day of tracked lifestyle metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HabitSample {
    /// Screen time in hours per day.
    pub screen_time: f64,
    /// Caffeinated drinks in cups per day.
    pub caffeine: f64,
    pub steps: u32,
    /// Water intake in liters per day.
    pub water: f64,
    /// Self-reported stress on a 1-10 scale.
    pub stress: u8,
    /// Whether a device was used right before bed.
    pub device_use: bool,
}

impl HabitSample {
    /// Checks the documented ranges. The suggestion rules never call this;
    /// front ends do before scoring.
    pub fn validate(&self) -> Result<(), HabitError> {
        check_non_negative("screen_time", self.screen_time)?;
        check_non_negative("caffeine", self.caffeine)?;
        check_non_negative("water", self.water)?;

        if !STRESS_RANGE.contains(&self.stress) {
            return Err(HabitError::StressOutOfRange(self.stress));
        }

        Ok(())
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector([
            self.screen_time,
            self.caffeine,
            f64::from(self.steps),
            self.water,
            f64::from(self.stress),
            if self.device_use { 1.0 } else { 0.0 },
        ])
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), HabitError> {
    if !value.is_finite() {
        return Err(HabitError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(HabitError::Negative { field, value });
    }
    Ok(())
}

/// Scorer input in the fixed order
/// `[screen_time, caffeine, steps, water, stress, device_use]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FeatureVector::LEN]);

impl FeatureVector {
    pub const LEN: usize = 6;

    pub const NAMES: [&'static str; FeatureVector::LEN] = [
        "screen_time",
        "caffeine",
        "steps",
        "water",
        "stress",
        "device_use",
    ];

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HabitError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("stress must be between 1 and 10 (got {0})")]
    StressOutOfRange(u8),
}
