//! Admin authentication
//!
//! Permissions are binary: anonymous visitors, or an authenticated admin
//! holding a [`Session`]. The session gates the leads collection and all
//! mutations.

mod client;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

pub use client::AuthClient;

/// Seconds before expiry at which a session is treated as expired
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Errors from the authentication service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Invalid login credentials: {0}")]
    InvalidCredentials(String),

    #[error("Authentication is not configured: {0}")]
    NotConfigured(String),

    #[error("Network error talking to the auth service: {0}")]
    Transport(String),

    #[error("Auth service rejected the request ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Failed to persist session: {0}")]
    Persistence(String),
}

/// Authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated admin session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

impl Session {
    /// Whether the access token has expired (or is about to) at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now.timestamp() + EXPIRY_LEEWAY_SECS >= expires_at,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn email(&self) -> &str {
        self.user.email.as_deref().unwrap_or("")
    }
}

/// Result of a sign-up
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// Account created and signed in
    SignedIn(Session),
    /// Account created; the email address must be confirmed first
    ConfirmationRequired,
}

/// Session-based authentication service
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, renewed if it expired and can be refreshed
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Stream of session changes (sign-in, sign-out, renewal)
    fn session_changes(&self) -> watch::Receiver<Option<Session>>;
}
