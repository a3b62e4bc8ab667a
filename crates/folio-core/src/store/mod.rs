//! Hosted store access
//!
//! The hosted store owns every collection. This module defines the seams the
//! rest of the crate talks through:
//!
//! - [`RemoteStore`]: per-table select / insert / update / delete
//! - [`ChangeFeed`]: per-table change notifications, fanned into one channel
//!
//! Implementations:
//!
//! - [`RestStore`]: HTTP client for a PostgREST-compatible API
//! - [`MemoryStore`]: in-process store for tests and offline demos
//!
//! Realtime notifications over WebSocket live in [`crate::realtime`].

pub mod error;
pub mod memory;
pub mod rest;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use rest::RestStore;

/// Tables owned by the hosted store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Projects,
    Experience,
    Services,
    Achievements,
    Blogs,
    Testimonials,
    Leads,
    SiteSettings,
    Skills,
}

impl Table {
    /// Every table, in fetch order
    pub const ALL: [Table; 9] = [
        Table::Projects,
        Table::Experience,
        Table::Services,
        Table::Achievements,
        Table::Blogs,
        Table::Testimonials,
        Table::Leads,
        Table::SiteSettings,
        Table::Skills,
    ];

    /// Name of the table in the store
    pub fn name(&self) -> &'static str {
        match self {
            Table::Projects => "projects",
            Table::Experience => "experience",
            Table::Services => "services",
            Table::Achievements => "achievements",
            Table::Blogs => "blogs",
            Table::Testimonials => "testimonials",
            Table::Leads => "leads",
            Table::SiteSettings => "site_settings",
            Table::Skills => "skills",
        }
    }

    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordering applied by the store to a select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    /// Query-string form, e.g. `created_at.desc`
    pub fn to_param(&self) -> String {
        format!(
            "{}.{}",
            self.column,
            if self.ascending { "asc" } else { "desc" }
        )
    }
}

/// Per-table CRUD against the hosted store
///
/// Records are raw JSON objects in the store's own (snake_case) shape; see
/// [`crate::mapping`] for the conversion to the read model.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All rows of a table, optionally ordered by the store
    async fn select(&self, table: Table, order: Option<Order>) -> StoreResult<Vec<Value>>;

    /// First row of a table, if any
    async fn select_single(&self, table: Table) -> StoreResult<Option<Value>>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: Table, record: Value) -> StoreResult<Value>;

    /// Apply `changes` to the row with `id`
    async fn update(&self, table: Table, id: &str, changes: Value) -> StoreResult<()>;

    /// Delete the row with `id`
    async fn delete(&self, table: Table, id: &str) -> StoreResult<()>;
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A change notification for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
}

/// Live registration on a [`ChangeFeed`]
///
/// Dropping the subscription releases it; no events for the table are
/// delivered to its sink afterwards.
pub struct ChangeSubscription {
    table: Table,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ChangeSubscription {
    pub fn new(table: Table, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            table,
            release: Some(Box::new(release)),
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Release explicitly (same as dropping)
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSubscription")
            .field("table", &self.table)
            .finish()
    }
}

/// Source of per-table change notifications
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Deliver every insert/update/delete on `table` to `sink`
    ///
    /// Delivery is best effort: a full sink drops the event, which is fine
    /// for consumers that treat any event as "refresh everything".
    async fn subscribe(
        &self,
        table: Table,
        sink: mpsc::Sender<ChangeEvent>,
    ) -> StoreResult<ChangeSubscription>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(Table::from_name(table.name()), Some(table));
        }
        assert_eq!(Table::from_name("users"), None);
        assert_eq!(Table::SiteSettings.to_string(), "site_settings");
    }

    #[test]
    fn test_order_param() {
        assert_eq!(Order::desc("created_at").to_param(), "created_at.desc");
        assert_eq!(Order::asc("level").to_param(), "level.asc");
    }

    #[test]
    fn test_change_kind_parse() {
        assert_eq!(ChangeKind::parse("insert"), Some(ChangeKind::Insert));
        assert_eq!(ChangeKind::parse("DELETE"), Some(ChangeKind::Delete));
        assert_eq!(ChangeKind::parse("TRUNCATE"), None);
    }

    #[test]
    fn test_subscription_releases_once_on_drop() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let sub = ChangeSubscription::new(Table::Projects, move || {
            assert!(!flag.swap(true, Ordering::SeqCst));
        });
        assert_eq!(sub.table(), Table::Projects);
        drop(sub);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_explicit_release() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let sub = ChangeSubscription::new(Table::Leads, move || {
            flag.store(true, Ordering::SeqCst);
        });
        sub.release();
        assert!(released.load(Ordering::SeqCst));
    }
}
