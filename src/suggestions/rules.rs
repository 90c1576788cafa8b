use super::config::SuggestionThresholds;
use super::Advisory;
use crate::habits::HabitSample;

/// Evaluates every rule in table order. Rules never suppress each other.
pub(crate) fn fired_advisories(
    sample: &HabitSample,
    thresholds: &SuggestionThresholds,
) -> Vec<Advisory> {
    let checks = [
        (
            sample.screen_time > thresholds.max_screen_time_hours,
            Advisory::ReduceScreenTime,
        ),
        (
            sample.caffeine > thresholds.max_caffeine_cups,
            Advisory::LimitCaffeine,
        ),
        (
            sample.steps < thresholds.min_steps,
            Advisory::IncreaseActivity,
        ),
        (
            sample.water < thresholds.min_water_liters,
            Advisory::IncreaseHydration,
        ),
        (
            sample.stress > thresholds.max_stress_level,
            Advisory::ManageStress,
        ),
        (sample.device_use, Advisory::AvoidDeviceBeforeBed),
    ];

    let fired: Vec<Advisory> = checks
        .into_iter()
        .filter_map(|(triggered, advisory)| triggered.then_some(advisory))
        .collect();

    if fired.is_empty() {
        vec![Advisory::Affirmation]
    } else {
        fired
    }
}
