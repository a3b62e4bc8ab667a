//! Realtime protocol message types
//!
//! The realtime service speaks Phoenix channels over JSON text frames:
//! `{"topic": ..., "event": ..., "payload": ..., "ref": ...}`. One channel is
//! joined per table, on topic `realtime:public:<table>`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::{ChangeKind, Table};

/// Topic used for heartbeats
pub const PHOENIX_TOPIC: &str = "phoenix";

/// Prefix of per-table topics
pub const TOPIC_PREFIX: &str = "realtime:public:";

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";

/// A Phoenix channel frame, in either direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

/// Topic for a table's channel
pub fn topic_for(table: Table) -> String {
    format!("{}{}", TOPIC_PREFIX, table.name())
}

/// Table a topic belongs to, if it is a table channel
pub fn table_for(topic: &str) -> Option<Table> {
    topic.strip_prefix(TOPIC_PREFIX).and_then(Table::from_name)
}

impl Frame {
    /// Join a table's channel, listening for every change event
    pub fn join(table: Table, access_token: &str, reference: u64) -> Self {
        Frame {
            topic: topic_for(table),
            event: EVENT_JOIN.to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [
                        { "event": "*", "schema": "public", "table": table.name() }
                    ]
                },
                "access_token": access_token,
            }),
            reference: Some(reference.to_string()),
        }
    }

    /// Leave a table's channel
    pub fn leave(table: Table, reference: u64) -> Self {
        Frame {
            topic: topic_for(table),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// Keep-alive; the server drops sockets that stay silent
    pub fn heartbeat(reference: u64) -> Self {
        Frame {
            topic: PHOENIX_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// Encode to a JSON text frame
    pub fn encode(&self) -> String {
        // A Frame holds only strings and JSON values, which always serialize
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Interpret an incoming frame
    pub fn classify(&self) -> Incoming {
        match self.event.as_str() {
            EVENT_POSTGRES_CHANGES => {
                let data = self.payload.get("data").unwrap_or(&self.payload);
                let table = data
                    .get("table")
                    .and_then(Value::as_str)
                    .and_then(Table::from_name)
                    .or_else(|| table_for(&self.topic));
                let kind = data
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(ChangeKind::parse);
                match (table, kind) {
                    (Some(table), Some(kind)) => Incoming::Change { table, kind },
                    _ => Incoming::Other,
                }
            }
            EVENT_REPLY => {
                let ok = self.payload.get("status").and_then(Value::as_str) == Some("ok");
                if ok {
                    Incoming::Ok
                } else {
                    let reason = self
                        .payload
                        .pointer("/response/reason")
                        .or_else(|| self.payload.pointer("/response/message"))
                        .and_then(Value::as_str)
                        .unwrap_or("request refused")
                        .to_string();
                    Incoming::Refused {
                        topic: self.topic.clone(),
                        reason,
                    }
                }
            }
            EVENT_ERROR | EVENT_CLOSE => match table_for(&self.topic) {
                Some(table) => Incoming::ChannelClosed(table),
                None => Incoming::Other,
            },
            // Older servers name the event after the change itself
            other => match (table_for(&self.topic), ChangeKind::parse(other)) {
                (Some(table), Some(kind)) => Incoming::Change { table, kind },
                _ => Incoming::Other,
            },
        }
    }
}

/// What an incoming frame means to the client
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A row in `table` changed
    Change { table: Table, kind: ChangeKind },
    /// Successful reply to a join, leave or heartbeat
    Ok,
    /// The server refused a request on `topic`
    Refused { topic: String, reason: String },
    /// The server closed or errored a table channel
    ChannelClosed(Table),
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_frame_shape() {
        let frame = Frame::join(Table::Projects, "tok", 3);
        let value: Value = serde_json::from_str(&frame.encode()).unwrap();
        assert_eq!(value["topic"], "realtime:public:projects");
        assert_eq!(value["event"], "phx_join");
        assert_eq!(value["ref"], "3");
        assert_eq!(value["payload"]["access_token"], "tok");
        let change = &value["payload"]["config"]["postgres_changes"][0];
        assert_eq!(change["event"], "*");
        assert_eq!(change["table"], "projects");
    }

    #[test]
    fn test_heartbeat_uses_phoenix_topic() {
        let frame = Frame::heartbeat(9);
        assert_eq!(frame.topic, "phoenix");
        assert_eq!(frame.event, "heartbeat");
    }

    #[test]
    fn test_classify_postgres_change() {
        let frame = Frame::decode(
            r#"{"topic":"realtime:public:blogs","event":"postgres_changes",
                "payload":{"data":{"type":"UPDATE","table":"blogs","schema":"public"},"ids":[1]},
                "ref":null}"#,
        )
        .unwrap();
        assert_eq!(
            frame.classify(),
            Incoming::Change {
                table: Table::Blogs,
                kind: ChangeKind::Update
            }
        );
    }

    #[test]
    fn test_classify_legacy_change_event() {
        let frame = Frame::decode(
            r#"{"topic":"realtime:public:leads","event":"INSERT","payload":{},"ref":null}"#,
        )
        .unwrap();
        assert_eq!(
            frame.classify(),
            Incoming::Change {
                table: Table::Leads,
                kind: ChangeKind::Insert
            }
        );
    }

    #[test]
    fn test_classify_replies() {
        let ok = Frame::decode(
            r#"{"topic":"phoenix","event":"phx_reply","payload":{"status":"ok","response":{}},"ref":"1"}"#,
        )
        .unwrap();
        assert_eq!(ok.classify(), Incoming::Ok);

        let refused = Frame::decode(
            r#"{"topic":"realtime:public:leads","event":"phx_reply",
                "payload":{"status":"error","response":{"reason":"Unauthorized"}},"ref":"2"}"#,
        )
        .unwrap();
        assert_eq!(
            refused.classify(),
            Incoming::Refused {
                topic: "realtime:public:leads".to_string(),
                reason: "Unauthorized".to_string()
            }
        );
    }

    #[test]
    fn test_classify_channel_close() {
        let frame = Frame::decode(
            r#"{"topic":"realtime:public:skills","event":"phx_close","payload":{},"ref":null}"#,
        )
        .unwrap();
        assert_eq!(frame.classify(), Incoming::ChannelClosed(Table::Skills));
    }

    #[test]
    fn test_table_for_topic() {
        assert_eq!(table_for("realtime:public:site_settings"), Some(Table::SiteSettings));
        assert_eq!(table_for("phoenix"), None);
        assert_eq!(table_for("realtime:public:unknown"), None);
    }
}
