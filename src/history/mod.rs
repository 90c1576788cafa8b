//! Per-user, append-only sleep history.

mod dashboard;
mod file;
mod firebase;
mod memory;

pub use dashboard::{DashboardSummary, HabitAverages, HabitBar, ProgressPoint};
pub use file::JsonLinesHistoryStore;
pub use firebase::{FirebaseHistoryStore, FirebaseStoreConfig};
pub use memory::InMemoryHistoryStore;

use crate::config::StorageConfig;
use crate::habits::HabitSample;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// One persisted submission: the six habits, the score and the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub screen_time: f64,
    pub caffeine: f64,
    pub steps: u32,
    pub water: f64,
    pub stress: u8,
    #[serde(with = "device_flag")]
    pub device_use: bool,
    pub prediction: f64,
}

impl HistoryEntry {
    pub fn new(date: NaiveDate, sample: &HabitSample, prediction: f64) -> Self {
        Self {
            date,
            screen_time: sample.screen_time,
            caffeine: sample.caffeine,
            steps: sample.steps,
            water: sample.water,
            stress: sample.stress,
            device_use: sample.device_use,
            prediction,
        }
    }

    pub fn sample(&self) -> HabitSample {
        HabitSample {
            screen_time: self.screen_time,
            caffeine: self.caffeine,
            steps: self.steps,
            water: self.water,
            stress: self.stress,
            device_use: self.device_use,
        }
    }
}

/// Stored records carry `device_use` as `0`/`1`; booleans are accepted on read.
mod device_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(flag) => Ok(flag),
            Flag::Int(0) => Ok(false),
            Flag::Int(1) => Ok(true),
            Flag::Int(other) => Err(serde::de::Error::custom(format!(
                "device_use must be 0 or 1 (got {other})"
            ))),
        }
    }
}

/// Key for a user's history. The token is forwarded to hosted stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub id_token: Option<String>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            id_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    /// User ids become path segments in every backend.
    pub fn validated_id(&self) -> Result<&str, HistoryError> {
        let id = self.user_id.as_str();
        let valid = !id.is_empty()
            && id.len() <= 128
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(id)
        } else {
            Err(HistoryError::InvalidUser(self.user_id.clone()))
        }
    }
}

/// Persistence collaborator. Entries are only ever appended and listed.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn append(&self, user: &UserIdentity, entry: HistoryEntry) -> Result<(), HistoryError>;

    async fn list(&self, user: &UserIdentity) -> Result<Vec<HistoryEntry>, HistoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("invalid user id '{0}'")]
    InvalidUser(String),
    #[error("history store rejected the credentials")]
    Unauthorized,
    #[error("history store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed history record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("history store returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Builds the store selected in configuration.
pub fn build_history_store(config: &StorageConfig) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(InMemoryHistoryStore::default())),
        StorageConfig::File { data_dir } => Ok(Arc::new(JsonLinesHistoryStore::new(data_dir))),
        StorageConfig::Firebase(settings) => {
            Ok(Arc::new(FirebaseHistoryStore::new(settings.clone())?))
        }
    }
}

/// Renders entries as CSV with a header row, in the order given.
pub fn export_csv(entries: &[HistoryEntry]) -> Result<String, HistoryError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if entries.is_empty() {
        writer.write_record([
            "date",
            "screen_time",
            "caffeine",
            "steps",
            "water",
            "stress",
            "device_use",
            "prediction",
        ])?;
    }
    for entry in entries {
        writer.serialize(entry)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| HistoryError::Unavailable(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| HistoryError::Unavailable(err.to_string()))
}
