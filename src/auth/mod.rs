//! Sign-up and log-in against the hosted identity service.

mod firebase;

pub use firebase::{FirebaseAuthConfig, FirebaseIdentityClient};

use crate::history::UserIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Email and password as typed into the sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), AuthError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        Ok(())
    }
}

/// Authenticated user as returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
}

impl UserSession {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(self.user_id.clone()).with_token(self.id_token.clone())
    }
}

/// Identity collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn sign_up(&self, credentials: &Credentials) -> Result<UserSession, AuthError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, AuthError>;

    /// Resolves an id token to the user it was issued for.
    async fn verify(&self, id_token: &str) -> Result<String, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password is required")]
    MissingPassword,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for this email")]
    EmailExists,
    #[error("password is too weak")]
    WeakPassword,
    #[error("identity token is invalid or expired")]
    InvalidToken,
    #[error("identity service rejected the request: {0}")]
    Rejected(String),
    #[error("identity service unreachable: {0}")]
    Http(#[from] reqwest::Error),
}
