use super::{HistoryEntry, HistoryError, HistoryStore, UserIdentity};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-local store used in development and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryHistoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<HistoryEntry>>>>,
}

impl InMemoryHistoryStore {
    fn poisoned() -> HistoryError {
        HistoryError::Unavailable("history mutex poisoned".to_string())
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn append(&self, user: &UserIdentity, entry: HistoryEntry) -> Result<(), HistoryError> {
        let id = user.validated_id()?;
        let mut guard = self.entries.lock().map_err(|_| Self::poisoned())?;
        guard.entry(id.to_string()).or_default().push(entry);
        Ok(())
    }

    async fn list(&self, user: &UserIdentity) -> Result<Vec<HistoryEntry>, HistoryError> {
        let id = user.validated_id()?;
        let guard = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(guard.get(id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(prediction: f64) -> HistoryEntry {
        HistoryEntry {
            date: NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"),
            screen_time: 5.0,
            caffeine: 1.0,
            steps: 9000,
            water: 2.0,
            stress: 3,
            device_use: false,
            prediction,
        }
    }

    #[tokio::test]
    async fn entries_are_kept_per_user_in_append_order() {
        let store = InMemoryHistoryStore::default();
        let alice = UserIdentity::new("alice");
        let bob = UserIdentity::new("bob");

        store.append(&alice, entry(60.0)).await.expect("append");
        store.append(&bob, entry(70.0)).await.expect("append");
        store.append(&alice, entry(80.0)).await.expect("append");

        let alice_history = store.list(&alice).await.expect("list");
        assert_eq!(
            alice_history
                .iter()
                .map(|entry| entry.prediction)
                .collect::<Vec<_>>(),
            vec![60.0, 80.0]
        );
        assert_eq!(store.list(&bob).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_has_empty_history() {
        let store = InMemoryHistoryStore::default();
        let history = store
            .list(&UserIdentity::new("nobody"))
            .await
            .expect("list");
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn invalid_user_is_rejected() {
        let store = InMemoryHistoryStore::default();
        let err = store
            .append(&UserIdentity::new("../x"), entry(50.0))
            .await
            .expect_err("invalid id");
        assert!(matches!(err, HistoryError::InvalidUser(_)));
    }
}
