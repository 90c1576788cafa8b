use super::HistoryEntry;
use chrono::NaiveDate;
use serde::Serialize;

/// Aggregated view of a user's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub entry_count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub averages: HabitAverages,
    pub progress: Vec<ProgressPoint>,
    pub habit_bars: Vec<HabitBar>,
}

/// Mean of each tracked metric, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitAverages {
    pub screen_time: f64,
    pub caffeine: f64,
    pub steps: f64,
    pub water: f64,
    pub stress: f64,
    pub prediction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub prediction: f64,
    pub screen_time: f64,
    pub stress: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitBar {
    pub label: &'static str,
    pub value: f64,
}

impl DashboardSummary {
    /// Returns `None` when there is nothing to summarise.
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        let mut sorted: Vec<&HistoryEntry> = entries.iter().collect();
        sorted.sort_by_key(|entry| entry.date);

        let first_date = sorted.first()?.date;
        let last_date = sorted.last()?.date;
        let count = sorted.len() as f64;

        let mean = |pick: fn(&HistoryEntry) -> f64| -> f64 {
            sorted.iter().map(|entry| pick(*entry)).sum::<f64>() / count
        };

        let raw = HabitAverages {
            screen_time: mean(|entry| entry.screen_time),
            caffeine: mean(|entry| entry.caffeine),
            steps: mean(|entry| f64::from(entry.steps)),
            water: mean(|entry| entry.water),
            stress: mean(|entry| f64::from(entry.stress)),
            prediction: mean(|entry| entry.prediction),
        };

        let habit_bars = vec![
            HabitBar {
                label: "Screen Time",
                value: round2(raw.screen_time),
            },
            HabitBar {
                label: "Caffeine",
                value: round2(raw.caffeine),
            },
            HabitBar {
                label: "Steps (x1000)",
                value: round2(raw.steps / 1000.0),
            },
            HabitBar {
                label: "Water (L)",
                value: round2(raw.water),
            },
            HabitBar {
                label: "Stress",
                value: round2(raw.stress),
            },
        ];

        let progress = sorted
            .iter()
            .map(|entry| ProgressPoint {
                date: entry.date,
                prediction: entry.prediction,
                screen_time: entry.screen_time,
                stress: entry.stress,
            })
            .collect();

        Some(Self {
            entry_count: sorted.len(),
            first_date,
            last_date,
            averages: HabitAverages {
                screen_time: round2(raw.screen_time),
                caffeine: round2(raw.caffeine),
                steps: round2(raw.steps),
                water: round2(raw.water),
                stress: round2(raw.stress),
                prediction: round2(raw.prediction),
            },
            progress,
            habit_bars,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: u32, steps: u32, stress: u8, prediction: f64) -> HistoryEntry {
        HistoryEntry {
            date: NaiveDate::from_ymd_opt(2025, 7, day).expect("valid date"),
            screen_time: 5.0,
            caffeine: 2.0,
            steps,
            water: 2.0,
            stress,
            device_use: false,
            prediction,
        }
    }

    #[test]
    fn empty_history_has_no_dashboard() {
        assert!(DashboardSummary::from_entries(&[]).is_none());
    }

    #[test]
    fn progress_is_sorted_by_date() {
        let entries = vec![entry(9, 6000, 4, 70.0), entry(2, 8000, 2, 90.0), entry(5, 4000, 7, 50.0)];
        let summary = DashboardSummary::from_entries(&entries).expect("summary");

        let dates: Vec<u32> = summary
            .progress
            .iter()
            .map(|point| chrono::Datelike::day(&point.date))
            .collect();
        assert_eq!(dates, vec![2, 5, 9]);
        assert_eq!(summary.first_date, entries[1].date);
        assert_eq!(summary.last_date, entries[0].date);
        assert_eq!(summary.entry_count, 3);
    }

    #[test]
    fn averages_round_to_two_decimals() {
        let entries = vec![entry(1, 5000, 3, 70.0), entry(2, 6000, 4, 80.0), entry(3, 6001, 4, 81.0)];
        let summary = DashboardSummary::from_entries(&entries).expect("summary");

        assert_eq!(summary.averages.steps, 5667.0);
        assert_eq!(summary.averages.stress, 3.67);
        assert_eq!(summary.averages.prediction, 77.0);
        assert_eq!(summary.averages.screen_time, 5.0);
    }

    #[test]
    fn habit_bars_scale_steps_per_thousand() {
        let entries = vec![entry(1, 7000, 5, 60.0), entry(2, 9000, 5, 60.0)];
        let summary = DashboardSummary::from_entries(&entries).expect("summary");

        let labels: Vec<&str> = summary.habit_bars.iter().map(|bar| bar.label).collect();
        assert_eq!(
            labels,
            vec!["Screen Time", "Caffeine", "Steps (x1000)", "Water (L)", "Stress"]
        );
        assert_eq!(summary.habit_bars[2].value, 8.0);
    }
}
