use async_trait::async_trait;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use sleep_smart::auth::{
    AuthError, Credentials, FirebaseIdentityClient, IdentityProvider, UserSession,
};
use sleep_smart::config::{AppConfig, ModelConfig};
use sleep_smart::error::AppError;
use sleep_smart::history::build_history_store;
use sleep_smart::scoring::{train, LinearModel, SleepScorer, DEFAULT_ROWS};
use sleep_smart::{SleepSmartService, SuggestionEngine};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_LEN: usize = 40;

struct LocalAccount {
    user_id: String,
    password: String,
}

/// Accounts kept in process memory when no hosted identity service is configured.
#[derive(Default)]
pub(crate) struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, LocalAccount>>,
    /// Issued id token -> user id.
    tokens: Mutex<HashMap<String, String>>,
}

impl InMemoryIdentityProvider {
    fn session(&self, user_id: &str, email: &str) -> Result<UserSession, AuthError> {
        let id_token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.tokens
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(id_token.clone(), user_id.to_string());

        Ok(UserSession {
            user_id: user_id.to_string(),
            email: email.to_string(),
            id_token,
        })
    }

    fn poisoned() -> AuthError {
        AuthError::Rejected("account store unavailable".to_string())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        credentials.validate()?;
        if credentials.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let email = credentials.email.trim().to_ascii_lowercase();
        let mut accounts = self.accounts.lock().map_err(|_| Self::poisoned())?;
        if accounts.contains_key(&email) {
            return Err(AuthError::EmailExists);
        }

        let user_id = format!("local-{:04}", accounts.len() + 1);
        accounts.insert(
            email.clone(),
            LocalAccount {
                user_id: user_id.clone(),
                password: credentials.password.clone(),
            },
        );
        drop(accounts);
        self.session(&user_id, &email)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        credentials.validate()?;
        let email = credentials.email.trim().to_ascii_lowercase();
        let accounts = self.accounts.lock().map_err(|_| Self::poisoned())?;
        match accounts.get(&email) {
            Some(account) if account.password == credentials.password => {
                self.session(&account.user_id, &email)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn verify(&self, id_token: &str) -> Result<String, AuthError> {
        let tokens = self.tokens.lock().map_err(|_| Self::poisoned())?;
        tokens.get(id_token).cloned().ok_or(AuthError::InvalidToken)
    }
}

/// Loads the saved model when present; otherwise fits a fresh one and saves
/// it to the configured path.
pub(crate) fn load_scorer(config: &ModelConfig) -> Result<Arc<dyn SleepScorer>, AppError> {
    if let Some(path) = config.path.as_deref().filter(|path| path.exists()) {
        let model = LinearModel::load(path)?;
        info!(path = %path.display(), "loaded sleep-quality model");
        return Ok(Arc::new(model));
    }

    let report = train(config.seed, DEFAULT_ROWS)?;
    if let Some(path) = config.path.as_deref() {
        report.model.save(path)?;
        info!(path = %path.display(), "saved freshly trained model");
    }
    Ok(Arc::new(report.model))
}

pub(crate) fn build_identity(config: &AppConfig) -> Result<Arc<dyn IdentityProvider>, AppError> {
    match &config.auth {
        Some(auth) => Ok(Arc::new(FirebaseIdentityClient::new(auth.clone())?)),
        None => Ok(Arc::new(InMemoryIdentityProvider::default())),
    }
}

pub(crate) fn build_service(config: &AppConfig) -> Result<SleepSmartService, AppError> {
    let scorer = load_scorer(&config.model)?;
    let store = build_history_store(&config.storage)?;
    let engine = SuggestionEngine::new(config.suggestions.clone());
    info!(
        scorer = scorer.name(),
        store = store.name(),
        profile = %config.suggestions.profile,
        "sleep service assembled"
    );
    Ok(SleepSmartService::new(scorer, engine, store))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn local_accounts_sign_up_and_sign_in() {
        let provider = InMemoryIdentityProvider::default();
        let session = provider
            .sign_up(&credentials("Sam@Example.com", "hunter22"))
            .await
            .expect("sign up succeeds");
        assert_eq!(session.user_id, "local-0001");
        assert_eq!(session.email, "sam@example.com");

        let again = provider
            .sign_in(&credentials("sam@example.com", "hunter22"))
            .await
            .expect("sign in succeeds");
        assert_eq!(again.user_id, session.user_id);
        assert_ne!(again.id_token, session.id_token);
    }

    #[tokio::test]
    async fn local_accounts_reject_duplicates_and_bad_passwords() {
        let provider = InMemoryIdentityProvider::default();
        assert!(matches!(
            provider.sign_up(&credentials("sam@example.com", "abc")).await,
            Err(AuthError::WeakPassword)
        ));

        provider
            .sign_up(&credentials("sam@example.com", "hunter22"))
            .await
            .expect("sign up succeeds");
        assert!(matches!(
            provider
                .sign_up(&credentials("sam@example.com", "hunter22"))
                .await,
            Err(AuthError::EmailExists)
        ));
        assert!(matches!(
            provider
                .sign_in(&credentials("sam@example.com", "wrong-password"))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn issued_tokens_resolve_to_their_owner() {
        let provider = InMemoryIdentityProvider::default();
        let sam = provider
            .sign_up(&credentials("sam@example.com", "hunter22"))
            .await
            .expect("sign up succeeds");
        let alex = provider
            .sign_up(&credentials("alex@example.com", "hunter22"))
            .await
            .expect("sign up succeeds");

        assert_eq!(sam.id_token.len(), TOKEN_LEN);
        assert_eq!(provider.verify(&sam.id_token).await.expect("known token"), sam.user_id);
        assert_eq!(provider.verify(&alex.id_token).await.expect("known token"), alex.user_id);
        assert!(matches!(
            provider.verify("local-local-0001-0").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn missing_model_path_trains_in_memory() {
        let scorer = load_scorer(&ModelConfig {
            path: None,
            seed: 7,
        })
        .expect("model trains");
        assert_eq!(scorer.name(), "linear-least-squares");
    }

    #[test]
    fn trained_model_is_saved_then_reloaded() {
        let dir = std::env::temp_dir().join(format!("sleep-smart-model-{}", std::process::id()));
        let path = dir.join("model.json");
        let config = ModelConfig {
            path: Some(path.clone()),
            seed: 11,
        };

        load_scorer(&config).expect("model trains");
        assert!(path.exists());
        load_scorer(&config).expect("model reloads");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date("2025-06-30"),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"))
        );
        assert!(parse_date("30/06/2025").is_err());
    }
}
