use serde::{Deserialize, Serialize};

use super::{Advisory, SuggestionProfile};

/// Cut-offs for each habit rule. Comparisons are strict, so a value equal to
/// a threshold never fires its rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestionThresholds {
    /// Fires `reduce_screen_time` above this many hours.
    pub max_screen_time_hours: f64,
    /// Fires `limit_caffeine` above this many cups.
    pub max_caffeine_cups: f64,
    /// Fires `increase_activity` below this many steps.
    pub min_steps: u32,
    /// Fires `increase_hydration` below this many liters.
    pub min_water_liters: f64,
    /// Fires `manage_stress` above this level.
    pub max_stress_level: u8,
}

impl SuggestionThresholds {
    pub const fn desktop() -> Self {
        Self {
            max_screen_time_hours: 6.0,
            max_caffeine_cups: 2.0,
            min_steps: 5000,
            min_water_liters: 2.0,
            max_stress_level: 5,
        }
    }

    pub const fn web() -> Self {
        Self {
            max_caffeine_cups: 3.0,
            max_stress_level: 7,
            ..Self::desktop()
        }
    }
}

/// Threshold set plus the profile whose wording is used for messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    pub profile: SuggestionProfile,
    pub thresholds: SuggestionThresholds,
}

impl SuggestionConfig {
    pub const fn for_profile(profile: SuggestionProfile) -> Self {
        Self {
            profile,
            thresholds: profile.thresholds(),
        }
    }

    pub fn with_caffeine_limit(mut self, cups: f64) -> Self {
        self.thresholds.max_caffeine_cups = cups;
        self
    }

    pub fn with_stress_limit(mut self, level: u8) -> Self {
        self.thresholds.max_stress_level = level;
        self
    }

    pub fn message(&self, advisory: Advisory) -> &'static str {
        self.profile.message(advisory)
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self::for_profile(SuggestionProfile::default())
    }
}
