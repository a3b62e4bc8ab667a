//! In-process store
//!
//! `MemoryStore` implements the store, auth and change-feed seams against
//! plain in-memory tables. It backs the test suites and supports injecting
//! failures and latency.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::{
    ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription, Order, RemoteStore, StoreError,
    StoreResult, Table,
};
use crate::auth::{AuthError, Session, SessionProvider, SessionUser, SignUpOutcome};
use crate::mapping::keys;

#[derive(Default)]
struct Inner {
    tables: HashMap<Table, Vec<Value>>,
    next_id: u64,
    failing_tables: HashMap<Table, String>,
    mutation_failure: Option<String>,
    session_failure: Option<String>,
    latency: Duration,
    subscribers: HashMap<u64, (Table, mpsc::Sender<ChangeEvent>)>,
    next_subscriber: u64,
    admins: HashMap<String, String>,
    selects: HashMap<Table, usize>,
}

/// In-memory implementation of [`RemoteStore`], [`ChangeFeed`] and
/// [`SessionProvider`]
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    session: Arc<watch::Sender<Option<Session>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            session: Arc::new(session),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock only happens in a failing test
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register admin credentials accepted by `sign_in`
    pub fn with_admin(self, email: &str, password: &str) -> Self {
        self.lock()
            .admins
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Replace a table's rows without emitting change events
    ///
    /// Rows without an id get one assigned.
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut inner = self.lock();
        let rows = rows
            .into_iter()
            .map(|row| stamp(&mut inner, row))
            .collect();
        inner.tables.insert(table, rows);
    }

    /// Current rows of a table, in insertion order
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Make every call touching `table` fail with `message`
    pub fn fail_table(&self, table: Table, message: &str) {
        self.lock()
            .failing_tables
            .insert(table, message.to_string());
    }

    pub fn clear_failure(&self, table: Table) {
        self.lock().failing_tables.remove(&table);
    }

    /// Make every insert/update/delete fail with `message` (None to clear)
    pub fn fail_mutations(&self, message: Option<&str>) {
        self.lock().mutation_failure = message.map(str::to_string);
    }

    /// Make `current_session` fail with `message` (None to clear)
    pub fn fail_session_check(&self, message: Option<&str>) {
        self.lock().session_failure = message.map(str::to_string);
    }

    /// Delay applied to every store call
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Replace the current session and notify session listeners
    pub fn set_session(&self, session: Option<Session>) {
        self.session.send_replace(session);
    }

    /// Number of live change subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Number of selects issued against a table so far
    pub fn select_count(&self, table: Table) -> usize {
        self.lock().selects.get(&table).copied().unwrap_or(0)
    }

    /// Deliver a change event as if another client had written to `table`
    pub fn emit(&self, table: Table, kind: ChangeKind) {
        notify(&self.lock(), table, kind);
    }

    async fn delay(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_table(inner: &Inner, table: Table) -> StoreResult<()> {
        match inner.failing_tables.get(&table) {
            Some(message) => Err(StoreError::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    fn check_mutation(inner: &Inner, table: Table) -> StoreResult<()> {
        Self::check_table(inner, table)?;
        match inner.mutation_failure {
            Some(ref message) => Err(StoreError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

/// Assign an id and creation time to rows that lack them
fn stamp(inner: &mut Inner, row: Value) -> Value {
    let mut object = match row {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    inner.next_id += 1;
    if !object.contains_key(keys::ID) {
        object.insert(keys::ID.to_string(), Value::from(inner.next_id));
    }
    if !object.contains_key(keys::CREATED_AT) {
        // Offset by the sequence so creation order survives sorting
        let created = Utc::now() + chrono::Duration::milliseconds(inner.next_id as i64);
        object.insert(
            keys::CREATED_AT.to_string(),
            Value::from(created.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    Value::Object(object)
}

fn notify(inner: &Inner, table: Table, kind: ChangeKind) {
    for (sub_table, sink) in inner.subscribers.values() {
        if *sub_table == table {
            // Best effort; a full sink already has a refresh pending
            let _ = sink.try_send(ChangeEvent { table, kind });
        }
    }
}

fn id_matches(row: &Value, id: &str) -> bool {
    match row.get(keys::ID) {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => CmpOrdering::Equal,
        (None | Some(Value::Null), _) => CmpOrdering::Less,
        (_, None | Some(Value::Null)) => CmpOrdering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: Table, order: Option<Order>) -> StoreResult<Vec<Value>> {
        self.delay().await;
        let mut inner = self.lock();
        *inner.selects.entry(table).or_default() += 1;
        Self::check_table(&inner, table)?;

        let mut rows = inner.tables.get(&table).cloned().unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(order.column), b.get(order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        Ok(rows)
    }

    async fn select_single(&self, table: Table) -> StoreResult<Option<Value>> {
        self.delay().await;
        let mut inner = self.lock();
        *inner.selects.entry(table).or_default() += 1;
        Self::check_table(&inner, table)?;
        Ok(inner
            .tables
            .get(&table)
            .and_then(|rows| rows.first().cloned()))
    }

    async fn insert(&self, table: Table, record: Value) -> StoreResult<Value> {
        self.delay().await;
        let mut inner = self.lock();
        Self::check_mutation(&inner, table)?;

        let row = stamp(&mut inner, record);
        inner.tables.entry(table).or_default().push(row.clone());
        debug!("memory insert into {}", table);
        notify(&inner, table, ChangeKind::Insert);
        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, changes: Value) -> StoreResult<()> {
        self.delay().await;
        let mut inner = self.lock();
        Self::check_mutation(&inner, table)?;

        let Value::Object(changes) = changes else {
            return Err(StoreError::Rejected("update payload must be an object".to_string()));
        };
        let mut touched = false;
        if let Some(rows) = inner.tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|row| id_matches(row, id)) {
                if let Value::Object(fields) = row {
                    fields.extend(changes.clone());
                    touched = true;
                }
            }
        }
        if touched {
            notify(&inner, table, ChangeKind::Update);
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        self.delay().await;
        let mut inner = self.lock();
        Self::check_mutation(&inner, table)?;

        let removed = match inner.tables.get_mut(&table) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|row| !id_matches(row, id));
                before != rows.len()
            }
            None => false,
        };
        if removed {
            notify(&inner, table, ChangeKind::Delete);
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for MemoryStore {
    async fn subscribe(
        &self,
        table: Table,
        sink: mpsc::Sender<ChangeEvent>,
    ) -> StoreResult<ChangeSubscription> {
        let mut inner = self.lock();
        inner.next_subscriber += 1;
        let key = inner.next_subscriber;
        inner.subscribers.insert(key, (table, sink));
        drop(inner);

        let registry = Arc::downgrade(&self.inner);
        Ok(ChangeSubscription::new(table, move || {
            if let Some(registry) = registry.upgrade() {
                let mut inner = registry
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                inner.subscribers.remove(&key);
            }
        }))
    }
}

#[async_trait]
impl SessionProvider for MemoryStore {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        self.delay().await;
        let failure = self.lock().session_failure.clone();
        if let Some(message) = failure {
            return Err(AuthError::Transport(message));
        }
        Ok(self.session.borrow().clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let accepted = self
            .lock()
            .admins
            .get(email)
            .is_some_and(|expected| expected == password);
        if !accepted {
            return Err(AuthError::InvalidCredentials(
                "Invalid login credentials".to_string(),
            ));
        }
        let session = memory_session(email);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let mut inner = self.lock();
        if inner.admins.contains_key(email) {
            return Err(AuthError::Http {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        inner.admins.insert(email.to_string(), password.to_string());
        drop(inner);

        let session = memory_session(email);
        self.set_session(Some(session.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None);
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

fn memory_session(email: &str) -> Session {
    Session {
        access_token: format!("memory-{}", uuid::Uuid::new_v4()),
        refresh_token: None,
        expires_at: None,
        user: SessionUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_select_orders() {
        let store = MemoryStore::new();
        store.seed(
            Table::Skills,
            vec![
                json!({"name": "Rust", "level": 70}),
                json!({"name": "Go", "level": 90}),
                json!({"name": "SQL", "level": 80}),
            ],
        );

        let rows = store
            .select(Table::Skills, Some(Order::desc(keys::LEVEL)))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["Go", "SQL", "Rust"]);
        assert!(rows.iter().all(|r| r.get("id").is_some()));
        assert_eq!(store.select_count(Table::Skills), 1);
    }

    #[tokio::test]
    async fn test_created_at_preserves_insertion_order() {
        let store = MemoryStore::new();
        for title in ["first", "second", "third"] {
            store
                .insert(Table::Projects, json!({ "title": title }))
                .await
                .unwrap();
        }
        let rows = store
            .select(Table::Projects, Some(Order::desc(keys::CREATED_AT)))
            .await
            .unwrap();
        assert_eq!(rows[0]["title"], "third");
        assert_eq!(rows[2]["title"], "first");
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id() {
        let store = MemoryStore::new();
        let row = store
            .insert(Table::Leads, json!({"name": "Ann", "status": "new"}))
            .await
            .unwrap();
        let id = row["id"].to_string();

        store
            .update(Table::Leads, &id, json!({"status": "read"}))
            .await
            .unwrap();
        assert_eq!(store.rows(Table::Leads)[0]["status"], "read");
        assert_eq!(store.rows(Table::Leads)[0]["name"], "Ann");

        store.delete(Table::Leads, &id).await.unwrap();
        assert!(store.rows(Table::Leads).is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail_table(Table::Blogs, "boom");
        let err = store.select(Table::Blogs, None).await.unwrap_err();
        assert_eq!(err.message(), "boom");
        assert!(store.select(Table::Projects, None).await.is_ok());

        store.clear_failure(Table::Blogs);
        assert!(store.select(Table::Blogs, None).await.is_ok());

        store.fail_mutations(Some("read only"));
        let err = store
            .insert(Table::Projects, json!({"title": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "read only");
        assert!(store.rows(Table::Projects).is_empty());
    }

    #[tokio::test]
    async fn test_change_events_reach_matching_subscribers_only() {
        let store = MemoryStore::new();
        let (tx, mut rx) = mpsc::channel(8);
        let sub = store.subscribe(Table::Projects, tx.clone()).await.unwrap();
        let _other = store.subscribe(Table::Blogs, tx).await.unwrap();
        assert_eq!(store.subscriber_count(), 2);

        store
            .insert(Table::Projects, json!({"title": "x"}))
            .await
            .unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent {
                table: Table::Projects,
                kind: ChangeKind::Insert
            }
        );
        assert!(rx.try_recv().is_err());

        drop(sub);
        assert_eq!(store.subscriber_count(), 1);
        store.emit(Table::Projects, ChangeKind::Update);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sign_in_checks_credentials() {
        let store = MemoryStore::new().with_admin("admin@example.com", "secret");
        let mut changes = store.session_changes();

        assert!(matches!(
            store.sign_in("admin@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials(_))
        ));
        let session = store.sign_in("admin@example.com", "secret").await.unwrap();
        assert_eq!(session.email(), "admin@example.com");
        assert!(changes.has_changed().unwrap());
        assert_eq!(store.current_session().await.unwrap(), Some(session));

        store.sign_out().await.unwrap();
        assert_eq!(store.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_check_failure() {
        let store = MemoryStore::new();
        store.fail_session_check(Some("auth down"));
        assert!(matches!(
            store.current_session().await,
            Err(AuthError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicates() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.sign_up("a@b.c", "pw").await.unwrap(),
            SignUpOutcome::SignedIn(_)
        ));
        assert!(store.sign_up("a@b.c", "pw").await.is_err());
    }
}
