//! HTTP store client
//!
//! Talks to a PostgREST-compatible API at `<store_url>/rest/v1/<table>`.
//! Requests carry the anon key in the `apikey` header and, when an admin is
//! signed in, the session's access token as the bearer token so row-level
//! policies see the admin.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Order, RemoteStore, StoreError, StoreResult, Table};
use crate::auth::SessionProvider;
use crate::config::Config;

/// REST client for the hosted store
pub struct RestStore {
    http: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    sessions: Option<Arc<dyn SessionProvider>>,
}

impl RestStore {
    /// Create a client from configuration
    ///
    /// `sessions` supplies the bearer token for admin requests; without it
    /// every request is anonymous.
    pub fn new(config: &Config, sessions: Option<Arc<dyn SessionProvider>>) -> StoreResult<Self> {
        let base_url = config
            .store_url
            .as_deref()
            .ok_or_else(|| StoreError::NotConfigured("store_url is not set".to_string()))?;
        let api_key = config
            .store_key
            .as_deref()
            .ok_or_else(|| StoreError::NotConfigured("store_key is not set".to_string()))?;

        let timeout = config.request_timeout();
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
            sessions,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    /// Attach the key and the best available bearer token
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut token = self.api_key.clone();
        if let Some(ref sessions) = self.sessions {
            match sessions.current_session().await {
                Ok(Some(session)) => token = session.access_token,
                Ok(None) => {}
                Err(e) => warn!("Session lookup failed, sending anonymous request: {}", e),
            }
        }
        request.header("apikey", &self.api_key).bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let res = self
            .authorize(request)
            .await
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, self.timeout))?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| status.to_string()),
        })
    }

    async fn rows(&self, res: Response) -> StoreResult<Vec<Value>> {
        let body: Value = res
            .json()
            .await
            .map_err(|e| StoreError::from_reqwest(e, self.timeout))?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode(format!(
                "expected an array of rows, got {}",
                type_name(&other)
            ))),
        }
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, table: Table, order: Option<Order>) -> StoreResult<Vec<Value>> {
        let mut query = vec![("select", "*".to_string())];
        if let Some(order) = order {
            query.push(("order", order.to_param()));
        }
        debug!("GET {} {:?}", table, order);

        let res = self
            .send(self.http.get(self.table_url(table)).query(&query))
            .await?;
        self.rows(res).await
    }

    async fn select_single(&self, table: Table) -> StoreResult<Option<Value>> {
        let res = self
            .send(
                self.http
                    .get(self.table_url(table))
                    .query(&[("select", "*"), ("limit", "1")]),
            )
            .await?;
        Ok(self.rows(res).await?.into_iter().next())
    }

    async fn insert(&self, table: Table, record: Value) -> StoreResult<Value> {
        debug!("POST {}", table);
        let res = self
            .send(
                self.http
                    .post(self.table_url(table))
                    .header("Prefer", "return=representation")
                    .json(&record),
            )
            .await?;
        self.rows(res)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }

    async fn update(&self, table: Table, id: &str, changes: Value) -> StoreResult<()> {
        debug!("PATCH {} id={}", table, id);
        self.send(
            self.http
                .patch(self.table_url(table))
                .query(&[("id", format!("eq.{}", id))])
                .json(&changes),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        debug!("DELETE {} id={}", table, id);
        self.send(
            self.http
                .delete(self.table_url(table))
                .query(&[("id", format!("eq.{}", id))]),
        )
        .await?;
        Ok(())
    }
}

/// The store reports errors as `{"message": ..., "details": ..., "hint": ...}`
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            store_url: Some("https://abc.example.co/".to_string()),
            store_key: Some("anon-key".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_requires_configuration() {
        let err = RestStore::new(&Config::default(), None).err().unwrap();
        assert!(matches!(err, StoreError::NotConfigured(_)));
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let store = RestStore::new(&config(), None).unwrap();
        assert_eq!(
            store.table_url(Table::SiteSettings),
            "https://abc.example.co/rest/v1/site_settings"
        );
    }

    #[test]
    fn test_error_message_prefers_store_message() {
        let body = r#"{"code":"23502","message":"null value in column \"title\"","details":null}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("null value in column \"title\"")
        );
        assert_eq!(error_message("not json"), None);
        assert_eq!(error_message(r#"{"code":"x"}"#).as_deref(), Some(r#"{"code":"x"}"#));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        let config = Config {
            store_url: Some("http://127.0.0.1:9".to_string()),
            store_key: Some("anon".to_string()),
            request_timeout_secs: 2,
            ..Config::default()
        };
        let store = RestStore::new(&config, None).unwrap();
        let err = store.select(Table::Projects, None).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Transport(_) | StoreError::Timeout(_)
        ));
    }
}
