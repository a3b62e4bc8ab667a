//! Realtime change notifications
//!
//! Per-table change events from the hosted store, delivered over a single
//! long-lived WebSocket.
//!
//! ## Protocol
//!
//! Phoenix channels over JSON text frames:
//! 1. Connect to `<store>/realtime/v1/websocket?apikey=...&vsn=1.0.0`
//! 2. `phx_join` one channel per table (`realtime:public:<table>`)
//! 3. Receive `postgres_changes` events for inserts, updates and deletes
//! 4. Heartbeat on the `phoenix` topic every 30 seconds
//!
//! ## Usage
//!
//! ```ignore
//! let realtime = RealtimeClient::spawn(RealtimeConfig::from_config(&config)?, None);
//! let sub = realtime.subscribe(Table::Projects, sink).await?;
//! ```

mod client;
mod message;

pub use client::{ConnectionStatus, RealtimeClient, RealtimeConfig};
pub use message::{Frame, Incoming};
