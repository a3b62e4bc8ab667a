//! Auth service client
//!
//! Password sign-in against a GoTrue-compatible endpoint. The session is kept
//! in a `watch` channel (so listeners see sign-in/sign-out) and persisted to
//! disk so a CLI login survives restarts.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::{AuthError, Session, SessionProvider, SessionUser, SignUpOutcome};
use crate::config::Config;

/// Token response from the auth service
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Client for the hosted auth service
pub struct AuthClient {
    http: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    /// Where the session is persisted (None = memory only)
    session_path: Option<PathBuf>,
    state: watch::Sender<Option<Session>>,
    /// Held while a refresh token is being exchanged
    renewal: Mutex<()>,
}

impl AuthClient {
    /// Create a client from configuration, restoring any persisted session
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let base_url = config
            .store_url
            .clone()
            .ok_or_else(|| AuthError::NotConfigured("store_url is not set".to_string()))?;
        let api_key = config
            .store_key
            .clone()
            .ok_or_else(|| AuthError::NotConfigured("store_key is not set".to_string()))?;

        let mut client = Self::with_endpoint(&base_url, &api_key, config.request_timeout())?;
        client.session_path = Some(config.session_path());
        if let Some(session) = client.load_persisted() {
            debug!("Restored session for {}", session.email());
            client.state.send_replace(Some(session));
        }
        Ok(client)
    }

    /// Create a memory-only client for an explicit endpoint
    pub fn with_endpoint(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let (state, _) = watch::channel(None);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
            session_path: None,
            state,
            renewal: Mutex::new(()),
        })
    }

    /// Session currently held, without renewal
    pub fn cached_session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn post_token(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let res = self
            .http
            .post(self.endpoint(&format!("token?grant_type={}", grant_type)))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = res.status();
        if status.is_success() {
            let token: TokenResponse = res
                .json()
                .await
                .map_err(|e| AuthError::Transport(e.to_string()))?;
            return Ok(token.into_session());
        }

        let message = error_message(res.text().await.unwrap_or_default(), status);
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(AuthError::InvalidCredentials(message))
            }
            s => Err(AuthError::Http {
                status: s.as_u16(),
                message,
            }),
        }
    }

    async fn renew(&self, session: &Session) -> Result<Option<Session>, AuthError> {
        let Some(ref refresh_token) = session.refresh_token else {
            self.set_session(None)?;
            return Ok(None);
        };

        match self
            .post_token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(renewed) => {
                debug!("Session renewed for {}", renewed.email());
                self.set_session(Some(renewed.clone()))?;
                Ok(Some(renewed))
            }
            Err(AuthError::InvalidCredentials(reason)) => {
                warn!("Session could not be renewed, signing out: {}", reason);
                self.set_session(None)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn set_session(&self, session: Option<Session>) -> Result<(), AuthError> {
        self.persist(session.as_ref())?;
        self.state.send_replace(session);
        Ok(())
    }

    fn persist(&self, session: Option<&Session>) -> Result<(), AuthError> {
        let Some(ref path) = self.session_path else {
            return Ok(());
        };

        match session {
            Some(session) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| AuthError::Persistence(e.to_string()))?;
                }
                let json = serde_json::to_string_pretty(session)
                    .map_err(|e| AuthError::Persistence(e.to_string()))?;
                fs::write(path, json).map_err(|e| AuthError::Persistence(e.to_string()))
            }
            None => {
                if path.exists() {
                    fs::remove_file(path).map_err(|e| AuthError::Persistence(e.to_string()))?;
                }
                Ok(())
            }
        }
    }

    fn load_persisted(&self) -> Option<Session> {
        let path = self.session_path.as_ref()?;
        let json = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&json) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring unreadable session file {:?}: {}", path, e);
                None
            }
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> AuthError {
        if error.is_timeout() {
            AuthError::Transport(format!("timed out after {:?}", self.timeout))
        } else {
            AuthError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl SessionProvider for AuthClient {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.cached_session() else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        // A refresh token is single use; concurrent callers wait for one
        // renewal and then read its result
        let _renewal = self.renewal.lock().await;
        match self.cached_session() {
            Some(session) if session.is_expired() => self.renew(&session).await,
            other => Ok(other),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .post_token("password", json!({ "email": email, "password": password }))
            .await?;
        info!("Signed in as {}", session.email());
        self.set_session(Some(session.clone()))?;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let res = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::Http {
                status: status.as_u16(),
                message: error_message(body, status),
            });
        }

        // A session comes back only when email confirmation is disabled
        match serde_json::from_str::<TokenResponse>(&body) {
            Ok(token) => {
                let session = token.into_session();
                self.set_session(Some(session.clone()))?;
                Ok(SignUpOutcome::SignedIn(session))
            }
            Err(_) => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.cached_session() {
            let res = self
                .http
                .post(self.endpoint("logout"))
                .header("apikey", &self.api_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;
            if let Err(e) = res {
                // The local session is dropped regardless
                warn!("Logout request failed: {}", e);
            }
        }
        self.set_session(None)?;
        info!("Signed out");
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }
}

/// Pull a human-readable message out of an auth error body
fn error_message(body: String, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(&body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    if body.is_empty() {
        status.to_string()
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_session() -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at: Some(Utc::now().timestamp() + 3600),
            user: SessionUser {
                id: "u1".to_string(),
                email: Some("admin@example.com".to_string()),
            },
        }
    }

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            store_url: Some("http://127.0.0.1:9".to_string()),
            store_key: Some("anon".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_requires_store_url() {
        let result = AuthClient::new(&Config::default());
        assert!(matches!(result, Err(AuthError::NotConfigured(_))));
    }

    #[test]
    fn test_session_persists_across_clients() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let client = AuthClient::new(&config).unwrap();
        assert!(client.cached_session().is_none());
        client.set_session(Some(test_session())).unwrap();
        assert!(config.session_path().exists());

        let reopened = AuthClient::new(&config).unwrap();
        assert_eq!(reopened.cached_session(), Some(test_session()));
    }

    #[test]
    fn test_clearing_session_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let client = AuthClient::new(&config).unwrap();
        client.set_session(Some(test_session())).unwrap();
        client.set_session(None).unwrap();
        assert!(!config.session_path().exists());
    }

    #[test]
    fn test_corrupt_session_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::write(config.session_path(), "{not json").unwrap();

        let client = AuthClient::new(&config).unwrap();
        assert!(client.cached_session().is_none());
    }

    #[tokio::test]
    async fn test_current_session_without_refresh_token_expires_to_none() {
        let client =
            AuthClient::with_endpoint("http://127.0.0.1:9", "anon", Duration::from_secs(1))
                .unwrap();
        let mut expired = test_session();
        expired.expires_at = Some(0);
        client.set_session(Some(expired)).unwrap();

        let mut changes = client.session_changes();
        assert_eq!(client.current_session().await.unwrap(), None);
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_current_session_returns_valid_session() {
        let client =
            AuthClient::with_endpoint("http://127.0.0.1:9", "anon", Duration::from_secs(1))
                .unwrap();
        client.set_session(Some(test_session())).unwrap();
        assert_eq!(client.current_session().await.unwrap(), Some(test_session()));
    }

    /// Local token endpoint that counts refresh exchanges
    async fn spawn_token_endpoint(exchanges: Arc<AtomicUsize>) -> String {
        use axum::{extract::State, routing::post, Json, Router};

        async fn token(State(exchanges): State<Arc<AtomicUsize>>) -> Json<Value> {
            let n = exchanges.fetch_add(1, Ordering::SeqCst) + 1;
            // Keep the exchange in flight while the other callers arrive
            tokio::time::sleep(Duration::from_millis(50)).await;
            Json(json!({
                "access_token": format!("fresh-{}", n),
                "refresh_token": format!("r{}", n + 1),
                "expires_in": 3600,
                "user": {"id": "u1", "email": "admin@example.com"}
            }))
        }

        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .with_state(exchanges);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_renewal() {
        let exchanges = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_token_endpoint(exchanges.clone()).await;
        let client = AuthClient::with_endpoint(&base_url, "anon", Duration::from_secs(5)).unwrap();

        let mut expired = test_session();
        expired.refresh_token = Some("r1".to_string());
        expired.expires_at = Some(0);
        client.set_session(Some(expired)).unwrap();

        // Same fan-out as one snapshot refresh
        let sessions =
            futures_util::future::join_all((0..10).map(|_| client.current_session())).await;

        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
        for session in sessions {
            assert_eq!(session.unwrap().unwrap().access_token, "fresh-1");
        }
        let stored = client.cached_session().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r2"));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            error_message(body.to_string(), StatusCode::BAD_REQUEST),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(r#"{"msg":"Signups not allowed"}"#.to_string(), StatusCode::FORBIDDEN),
            "Signups not allowed"
        );
        assert_eq!(
            error_message(String::new(), StatusCode::BAD_GATEWAY),
            "502 Bad Gateway"
        );
    }

    #[test]
    fn test_token_response_computes_expiry() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {"id": "u", "email": "e@x"}
        }))
        .unwrap();
        let session = token.into_session();
        let expires_at = session.expires_at.unwrap();
        assert!(expires_at > Utc::now().timestamp() + 3500);
        assert!(!session.is_expired());
    }
}
