use super::{AuthError, Credentials, IdentityProvider, UserSession};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseAuthConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl FirebaseAuthConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://identitytoolkit.googleapis.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Identity Toolkit REST client for email/password accounts.
#[derive(Debug, Clone)]
pub struct FirebaseIdentityClient {
    config: FirebaseAuthConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentityClient {
    pub fn new(config: FirebaseAuthConfig) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub(crate) fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.config.base_url.trim_end_matches('/'),
            action,
            self.config.api_key
        )
    }

    async fn rejected(action: &str, response: reqwest::Response) -> AuthError {
        let body = response.text().await.unwrap_or_default();
        let err = map_error_body(&body);
        warn!(action, error = %err, "identity request rejected");
        err
    }

    async fn password_call(
        &self,
        action: &str,
        credentials: &Credentials,
    ) -> Result<UserSession, AuthError> {
        credentials.validate()?;

        let payload = PasswordRequest {
            email: credentials.email.trim(),
            password: &credentials.password,
            return_secure_token: true,
        };

        let response = self
            .client
            .post(self.endpoint(action))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(action, response).await);
        }

        let parsed: PasswordResponse = response.json().await?;
        info!(action, user_id = %parsed.local_id, "identity request succeeded");
        Ok(UserSession {
            user_id: parsed.local_id,
            email: parsed.email,
            id_token: parsed.id_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityClient {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        self.password_call("signUp", credentials).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        self.password_call("signInWithPassword", credentials).await
    }

    async fn verify(&self, id_token: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .post(self.endpoint("lookup"))
            .json(&LookupRequest { id_token })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected("lookup", response).await);
        }

        let parsed: LookupResponse = response.json().await?;
        parsed
            .users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .ok_or(AuthError::InvalidToken)
    }
}

/// Maps the service's error codes (`EMAIL_EXISTS`, `INVALID_LOGIN_CREDENTIALS`,
/// `WEAK_PASSWORD : ...`) onto [`AuthError`].
pub(crate) fn map_error_body(body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());
    let code = message.split([' ', ':']).next().unwrap_or_default();

    match code {
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailExists,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "INVALID_EMAIL" => AuthError::InvalidEmail,
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "USER_DISABLED" => {
            AuthError::InvalidToken
        }
        _ => AuthError::Rejected(message),
    }
}
