use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::habits::{HabitError, HabitSample};
use crate::history::{DashboardSummary, HistoryEntry, HistoryError, HistoryStore, UserIdentity};
use crate::scoring::SleepScorer;
use crate::suggestions::{Suggestion, SuggestionEngine};

/// Score and suggestions for one submitted sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub sample: HabitSample,
    pub score: f64,
    pub suggestions: Vec<Suggestion>,
    pub generated_on: NaiveDate,
}

/// Result of a persisted submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub prediction: Prediction,
    pub entry: HistoryEntry,
}

/// Service composing the scorer, the suggestion rules and the history store.
pub struct SleepSmartService {
    scorer: Arc<dyn SleepScorer>,
    engine: SuggestionEngine,
    store: Arc<dyn HistoryStore>,
}

impl SleepSmartService {
    pub fn new(
        scorer: Arc<dyn SleepScorer>,
        engine: SuggestionEngine,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            scorer,
            engine,
            store,
        }
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Validate, score and advise. Nothing is persisted.
    pub fn predict(
        &self,
        sample: HabitSample,
        today: NaiveDate,
    ) -> Result<Prediction, ServiceError> {
        sample.validate()?;

        let score = self.scorer.score(&sample.features());
        let suggestions = self.engine.suggest(&sample);
        debug!(
            score,
            suggestions = suggestions.len(),
            scorer = self.scorer.name(),
            "scored habit sample"
        );

        Ok(Prediction {
            sample,
            score,
            suggestions,
            generated_on: today,
        })
    }

    /// Append a prediction to the user's history.
    pub async fn record(
        &self,
        user: &UserIdentity,
        prediction: &Prediction,
    ) -> Result<HistoryEntry, ServiceError> {
        let entry = HistoryEntry::new(prediction.generated_on, &prediction.sample, prediction.score);
        self.store.append(user, entry.clone()).await?;
        info!(
            user_id = %user.user_id,
            store = self.store.name(),
            date = %entry.date,
            "recorded sleep entry"
        );
        Ok(entry)
    }

    pub async fn submit(
        &self,
        user: &UserIdentity,
        sample: HabitSample,
        today: NaiveDate,
    ) -> Result<Submission, ServiceError> {
        let prediction = self.predict(sample, today)?;
        let entry = self.record(user, &prediction).await?;
        Ok(Submission { prediction, entry })
    }

    pub async fn history(&self, user: &UserIdentity) -> Result<Vec<HistoryEntry>, ServiceError> {
        Ok(self.store.list(user).await?)
    }

    /// `None` when the user has no entries yet.
    pub async fn dashboard(
        &self,
        user: &UserIdentity,
    ) -> Result<Option<DashboardSummary>, ServiceError> {
        let entries = self.history(user).await?;
        Ok(DashboardSummary::from_entries(&entries))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Invalid(#[from] HabitError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::InMemoryHistoryStore;
    use crate::scoring::ReferenceFormula;
    use crate::suggestions::{Advisory, SuggestionProfile};
    use async_trait::async_trait;

    struct UnavailableStore;

    #[async_trait]
    impl HistoryStore for UnavailableStore {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        async fn append(&self, _user: &UserIdentity, _entry: HistoryEntry) -> Result<(), HistoryError> {
            Err(HistoryError::Unavailable("offline".to_string()))
        }

        async fn list(&self, _user: &UserIdentity) -> Result<Vec<HistoryEntry>, HistoryError> {
            Err(HistoryError::Unavailable("offline".to_string()))
        }
    }

    fn service_with(store: Arc<dyn HistoryStore>) -> SleepSmartService {
        SleepSmartService::new(
            Arc::new(ReferenceFormula),
            SuggestionEngine::for_profile(SuggestionProfile::Web),
            store,
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).expect("valid date")
    }

    fn sample() -> HabitSample {
        HabitSample {
            screen_time: 8.0,
            caffeine: 4.0,
            steps: 3000,
            water: 1.0,
            stress: 9,
            device_use: true,
        }
    }

    #[test]
    fn predict_scores_and_advises_without_persisting() {
        let store = Arc::new(InMemoryHistoryStore::default());
        let service = service_with(store);

        let prediction = service.predict(sample(), day(1)).expect("valid sample");
        // 100 - 40 - 12 + 30 + 5 - 36 - 5
        assert!((prediction.score - 42.0).abs() < 1e-9);
        let advisories: Vec<Advisory> = prediction
            .suggestions
            .iter()
            .map(|suggestion| suggestion.advisory)
            .collect();
        assert_eq!(advisories.len(), 6);
        assert!(!advisories.contains(&Advisory::Affirmation));
        assert_eq!(prediction.generated_on, day(1));
    }

    #[test]
    fn predict_rejects_out_of_range_stress() {
        let service = service_with(Arc::new(InMemoryHistoryStore::default()));
        let mut invalid = sample();
        invalid.stress = 11;
        assert!(matches!(
            service.predict(invalid, day(1)),
            Err(ServiceError::Invalid(HabitError::StressOutOfRange(11)))
        ));
    }

    #[tokio::test]
    async fn submit_appends_entry_and_feeds_dashboard() {
        let service = service_with(Arc::new(InMemoryHistoryStore::default()));
        let user = UserIdentity::new("user-1");

        assert!(service.dashboard(&user).await.expect("lists").is_none());

        let submission = service
            .submit(&user, sample(), day(2))
            .await
            .expect("submission stored");
        assert_eq!(submission.entry.prediction, submission.prediction.score);
        assert!(submission.entry.device_use);

        service
            .submit(&user, sample(), day(1))
            .await
            .expect("submission stored");

        let history = service.history(&user).await.expect("lists");
        assert_eq!(history.len(), 2);

        let dashboard = service
            .dashboard(&user)
            .await
            .expect("lists")
            .expect("has entries");
        assert_eq!(dashboard.entry_count, 2);
        assert_eq!(dashboard.first_date, day(1));

        let other = UserIdentity::new("user-2");
        assert!(service.history(&other).await.expect("lists").is_empty());
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let service = service_with(Arc::new(UnavailableStore));
        let user = UserIdentity::new("user-1");
        assert!(matches!(
            service.submit(&user, sample(), day(1)).await,
            Err(ServiceError::History(HistoryError::Unavailable(_)))
        ));
        assert!(matches!(
            service.dashboard(&user).await,
            Err(ServiceError::History(_))
        ));
    }
}
