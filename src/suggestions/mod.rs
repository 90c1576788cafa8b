//! Rule-based sleep suggestions.
//!
//! Each rule looks at a single habit and fires independently of the others.
//! The output keeps the rule table order and falls back to a single
//! affirmation when nothing fires, so it is never empty.

mod config;
mod rules;

pub use config::{SuggestionConfig, SuggestionThresholds};

use crate::habits::HabitSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a suggestion, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    ReduceScreenTime,
    LimitCaffeine,
    IncreaseActivity,
    IncreaseHydration,
    ManageStress,
    AvoidDeviceBeforeBed,
    Affirmation,
}

impl Advisory {
    pub const fn key(self) -> &'static str {
        match self {
            Self::ReduceScreenTime => "reduce_screen_time",
            Self::LimitCaffeine => "limit_caffeine",
            Self::IncreaseActivity => "increase_activity",
            Self::IncreaseHydration => "increase_hydration",
            Self::ManageStress => "manage_stress",
            Self::AvoidDeviceBeforeBed => "avoid_device_before_bed",
            Self::Affirmation => "affirmation",
        }
    }
}

/// Named threshold and wording sets. The desktop form and the web dashboard
/// shipped with different caffeine and stress cut-offs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionProfile {
    Desktop,
    #[default]
    Web,
}

impl SuggestionProfile {
    pub const fn thresholds(self) -> SuggestionThresholds {
        match self {
            Self::Desktop => SuggestionThresholds::desktop(),
            Self::Web => SuggestionThresholds::web(),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Web => "web",
        }
    }

    /// Glyph shown before a message. The desktop form marks screen time with
    /// the no-phones sign and late device use with the phone.
    pub const fn icon(self, advisory: Advisory) -> &'static str {
        match (self, advisory) {
            (Self::Desktop, Advisory::ReduceScreenTime) => "📵",
            (Self::Desktop, Advisory::IncreaseActivity) => "🚶‍♂️",
            (Self::Desktop, Advisory::AvoidDeviceBeforeBed) => "📱",
            (Self::Web, Advisory::ReduceScreenTime) => "📱",
            (Self::Web, Advisory::IncreaseActivity) => "🚶",
            (Self::Web, Advisory::AvoidDeviceBeforeBed) => "📵",
            (_, Advisory::LimitCaffeine) => "☕",
            (_, Advisory::IncreaseHydration) => "💧",
            (_, Advisory::ManageStress) => "🧘",
            (_, Advisory::Affirmation) => "✅",
        }
    }

    pub const fn message(self, advisory: Advisory) -> &'static str {
        match (self, advisory) {
            (Self::Desktop, Advisory::ReduceScreenTime) => "Reduce screen time before bed.",
            (Self::Desktop, Advisory::LimitCaffeine) => {
                "Limit caffeine intake, especially in the evening."
            }
            (Self::Desktop, Advisory::IncreaseActivity) => {
                "Increase physical activity during the day."
            }
            (Self::Desktop, Advisory::IncreaseHydration) => "Drink more water to stay hydrated.",
            (Self::Desktop, Advisory::ManageStress) => {
                "Practice relaxation techniques to manage stress."
            }
            (Self::Desktop, Advisory::AvoidDeviceBeforeBed) => {
                "Avoid using electronic devices right before sleeping."
            }
            (Self::Desktop, Advisory::Affirmation) => {
                "Great job! Your habits support good sleep quality."
            }
            (Self::Web, Advisory::ReduceScreenTime) => "Reduce screen time to under 6 hours.",
            (Self::Web, Advisory::LimitCaffeine) => {
                "Limit caffeine to 1-2 cups, especially after 4 PM."
            }
            (Self::Web, Advisory::IncreaseActivity) => "Aim for at least 7000 steps/day.",
            (Self::Web, Advisory::IncreaseHydration) => "Increase water intake to 2+ liters.",
            (Self::Web, Advisory::ManageStress) => "Reduce stress with breathing or meditation.",
            (Self::Web, Advisory::AvoidDeviceBeforeBed) => "Avoid devices 30 mins before bed.",
            (Self::Web, Advisory::Affirmation) => "Great job! Keep up the healthy habits.",
        }
    }
}

impl fmt::Display for SuggestionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SuggestionProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "desktop" | "gui" => Ok(Self::Desktop),
            "web" | "dashboard" => Ok(Self::Web),
            other => Err(format!("unknown suggestion profile '{other}'")),
        }
    }
}

/// A fired advisory together with its display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub advisory: Advisory,
    #[serde(default)]
    pub icon: String,
    pub message: String,
}

impl Suggestion {
    pub fn new(profile: SuggestionProfile, advisory: Advisory) -> Self {
        Self {
            advisory,
            icon: profile.icon(advisory).to_string(),
            message: profile.message(advisory).to_string(),
        }
    }

    pub fn display_line(&self) -> String {
        if self.icon.is_empty() {
            return self.message.clone();
        }
        format!("{} {}", self.icon, self.message)
    }
}

/// Stateless rule evaluator.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    config: SuggestionConfig,
}

impl SuggestionEngine {
    pub fn new(config: SuggestionConfig) -> Self {
        Self { config }
    }

    pub fn for_profile(profile: SuggestionProfile) -> Self {
        Self::new(SuggestionConfig::for_profile(profile))
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    pub fn advisories(&self, sample: &HabitSample) -> Vec<Advisory> {
        rules::fired_advisories(sample, &self.config.thresholds)
    }

    pub fn suggest(&self, sample: &HabitSample) -> Vec<Suggestion> {
        self.advisories(sample)
            .into_iter()
            .map(|advisory| Suggestion::new(self.config.profile, advisory))
            .collect()
    }

    pub fn messages(&self, sample: &HabitSample) -> Vec<String> {
        self.suggest(sample)
            .into_iter()
            .map(|suggestion| suggestion.message)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> HabitSample {
        HabitSample {
            screen_time: 3.0,
            caffeine: 1.0,
            steps: 8000,
            water: 3.0,
            stress: 2,
            device_use: false,
        }
    }

    fn struggling() -> HabitSample {
        HabitSample {
            screen_time: 8.0,
            caffeine: 4.0,
            steps: 3000,
            water: 1.0,
            stress: 9,
            device_use: true,
        }
    }

    const ALL_RULES: [Advisory; 6] = [
        Advisory::ReduceScreenTime,
        Advisory::LimitCaffeine,
        Advisory::IncreaseActivity,
        Advisory::IncreaseHydration,
        Advisory::ManageStress,
        Advisory::AvoidDeviceBeforeBed,
    ];

    #[test]
    fn healthy_habits_yield_only_the_affirmation() {
        for profile in [SuggestionProfile::Desktop, SuggestionProfile::Web] {
            let engine = SuggestionEngine::for_profile(profile);
            assert_eq!(engine.advisories(&healthy()), vec![Advisory::Affirmation]);
            assert_eq!(
                engine.messages(&healthy()),
                vec![profile.message(Advisory::Affirmation).to_string()]
            );
        }
    }

    #[test]
    fn every_rule_fires_in_table_order() {
        for profile in [SuggestionProfile::Desktop, SuggestionProfile::Web] {
            let advisories = SuggestionEngine::for_profile(profile).advisories(&struggling());
            assert_eq!(advisories, ALL_RULES.to_vec());
            assert!(!advisories.contains(&Advisory::Affirmation));
        }
    }

    #[test]
    fn single_rule_yields_single_advisory() {
        let engine = SuggestionEngine::for_profile(SuggestionProfile::Web);
        let cases = [
            (
                HabitSample {
                    screen_time: 7.5,
                    ..healthy()
                },
                Advisory::ReduceScreenTime,
            ),
            (
                HabitSample {
                    caffeine: 5.0,
                    ..healthy()
                },
                Advisory::LimitCaffeine,
            ),
            (
                HabitSample {
                    steps: 1200,
                    ..healthy()
                },
                Advisory::IncreaseActivity,
            ),
            (
                HabitSample {
                    water: 0.5,
                    ..healthy()
                },
                Advisory::IncreaseHydration,
            ),
            (
                HabitSample {
                    stress: 10,
                    ..healthy()
                },
                Advisory::ManageStress,
            ),
            (
                HabitSample {
                    device_use: true,
                    ..healthy()
                },
                Advisory::AvoidDeviceBeforeBed,
            ),
        ];

        for (sample, expected) in cases {
            assert_eq!(engine.advisories(&sample), vec![expected], "{sample:?}");
        }
    }

    #[test]
    fn partial_triggers_keep_table_order() {
        let engine = SuggestionEngine::for_profile(SuggestionProfile::Desktop);
        let sample = HabitSample {
            device_use: true,
            water: 1.5,
            screen_time: 9.0,
            ..healthy()
        };
        assert_eq!(
            engine.advisories(&sample),
            vec![
                Advisory::ReduceScreenTime,
                Advisory::IncreaseHydration,
                Advisory::AvoidDeviceBeforeBed,
            ]
        );
    }

    #[test]
    fn thresholds_are_strict() {
        let engine = SuggestionEngine::for_profile(SuggestionProfile::Desktop);
        let boundary = HabitSample {
            screen_time: 6.0,
            caffeine: 2.0,
            steps: 5000,
            water: 2.0,
            stress: 5,
            device_use: false,
        };
        assert_eq!(engine.advisories(&boundary), vec![Advisory::Affirmation]);
    }

    #[test]
    fn profiles_disagree_on_caffeine_and_stress() {
        let desktop = SuggestionEngine::for_profile(SuggestionProfile::Desktop);
        let web = SuggestionEngine::for_profile(SuggestionProfile::Web);

        let three_cups = HabitSample {
            caffeine: 3.0,
            ..healthy()
        };
        assert_eq!(desktop.advisories(&three_cups), vec![Advisory::LimitCaffeine]);
        assert_eq!(web.advisories(&three_cups), vec![Advisory::Affirmation]);

        let stress_six = HabitSample {
            stress: 6,
            ..healthy()
        };
        assert_eq!(desktop.advisories(&stress_six), vec![Advisory::ManageStress]);
        assert_eq!(web.advisories(&stress_six), vec![Advisory::Affirmation]);
    }

    #[test]
    fn overrides_replace_profile_thresholds() {
        let config = SuggestionConfig::for_profile(SuggestionProfile::Web)
            .with_caffeine_limit(2.0)
            .with_stress_limit(5);
        let engine = SuggestionEngine::new(config);
        let sample = HabitSample {
            caffeine: 3.0,
            stress: 6,
            ..healthy()
        };
        assert_eq!(
            engine.advisories(&sample),
            vec![Advisory::LimitCaffeine, Advisory::ManageStress]
        );
        assert_eq!(
            engine.messages(&sample)[0],
            SuggestionProfile::Web.message(Advisory::LimitCaffeine)
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let engine = SuggestionEngine::default();
        let sample = HabitSample {
            steps: 4999,
            ..struggling()
        };
        assert_eq!(engine.suggest(&sample), engine.suggest(&sample));
    }

    #[test]
    fn profile_parses_aliases() {
        assert_eq!("GUI".parse::<SuggestionProfile>(), Ok(SuggestionProfile::Desktop));
        assert_eq!(" web ".parse::<SuggestionProfile>(), Ok(SuggestionProfile::Web));
        assert!("mobile".parse::<SuggestionProfile>().is_err());
    }

    #[test]
    fn suggestion_serializes_category_key() {
        let suggestion = Suggestion::new(SuggestionProfile::Web, Advisory::AvoidDeviceBeforeBed);
        let value = serde_json::to_value(&suggestion).expect("serializes");
        assert_eq!(value["advisory"], Advisory::AvoidDeviceBeforeBed.key());
        assert_eq!(value["icon"], "📵");
    }

    #[test]
    fn icons_follow_profile() {
        let desktop = SuggestionEngine::for_profile(SuggestionProfile::Desktop).suggest(&struggling());
        let icons: Vec<&str> = desktop.iter().map(|s| s.icon.as_str()).collect();
        assert_eq!(icons, vec!["📵", "☕", "🚶‍♂️", "💧", "🧘", "📱"]);
        assert_eq!(
            desktop[5].display_line(),
            "📱 Avoid using electronic devices right before sleeping."
        );

        let web = SuggestionEngine::for_profile(SuggestionProfile::Web).suggest(&struggling());
        let icons: Vec<&str> = web.iter().map(|s| s.icon.as_str()).collect();
        assert_eq!(icons, vec!["📱", "☕", "🚶", "💧", "🧘", "📵"]);
    }

    #[test]
    fn suggestions_without_icon_render_message_only() {
        let suggestion: Suggestion = serde_json::from_str(
            r#"{"advisory":"affirmation","message":"Great job! Keep up the healthy habits."}"#,
        )
        .expect("deserializes");
        assert_eq!(suggestion.display_line(), "Great job! Keep up the healthy habits.");
    }
}
