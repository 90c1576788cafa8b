use super::{HistoryEntry, HistoryError, HistoryStore, UserIdentity};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseStoreConfig {
    pub database_url: String,
    pub timeout: Duration,
}

impl FirebaseStoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Realtime Database REST client. Entries live under
/// `users/<user_id>/sleep_data` and are added with push semantics.
#[derive(Debug, Clone)]
pub struct FirebaseHistoryStore {
    config: FirebaseStoreConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseHistoryStore {
    pub fn new(config: FirebaseStoreConfig) -> Result<Self, HistoryError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub(crate) fn collection_url(&self, user: &UserIdentity) -> Result<String, HistoryError> {
        let id = user.validated_id()?;
        Ok(format!(
            "{}/users/{}/sleep_data.json",
            self.config.database_url.trim_end_matches('/'),
            id
        ))
    }

    fn authorized(request: RequestBuilder, user: &UserIdentity) -> RequestBuilder {
        match &user.id_token {
            Some(token) => request.query(&[("auth", token.as_str())]),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, HistoryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(HistoryError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HistoryError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl HistoryStore for FirebaseHistoryStore {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn append(&self, user: &UserIdentity, entry: HistoryEntry) -> Result<(), HistoryError> {
        let url = self.collection_url(user)?;
        let request = Self::authorized(self.client.post(url), user).json(&entry);
        let response = Self::check(request.send().await?).await?;
        let pushed: PushResponse = response.json().await?;
        debug!(key = %pushed.name, "pushed sleep entry");
        Ok(())
    }

    async fn list(&self, user: &UserIdentity) -> Result<Vec<HistoryEntry>, HistoryError> {
        let url = self.collection_url(user)?;
        let request = Self::authorized(self.client.get(url), user);
        let response = Self::check(request.send().await?).await?;
        let records = decode_collection(&response.text().await?)?;
        Ok(records)
    }
}

/// The database answers `null` for an empty path, otherwise an object keyed
/// by push id. Push ids sort chronologically.
pub(crate) fn decode_collection(body: &str) -> Result<Vec<HistoryEntry>, HistoryError> {
    let records: Option<BTreeMap<String, HistoryEntry>> = serde_json::from_str(body)?;
    Ok(records
        .map(|map| map.into_values().collect())
        .unwrap_or_default())
}
