//! Persistent realtime connection
//!
//! A background task owns the WebSocket. Subscriptions are registered with
//! it over a command channel; the task joins one channel per table,
//! re-joins every live table after a reconnect and leaves a table when its
//! last subscription is released. Reconnection uses exponential backoff.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use super::message::{Frame, Incoming};
use crate::auth::SessionProvider;
use crate::config::Config;
use crate::store::{
    ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription, StoreError, StoreResult, Table,
};

/// Commands sent to the connection task
#[derive(Debug)]
enum RealtimeCommand {
    Subscribe {
        id: u64,
        table: Table,
        sink: mpsc::Sender<ChangeEvent>,
    },
    Release {
        id: u64,
    },
    Shutdown,
}

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected (idle, or waiting to reconnect)
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Connected, table channels joined
    Connected,
}

/// Configuration for the realtime connection
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket URL, including the api key
    pub url: String,
    /// Token used to join channels when nobody is signed in
    pub api_key: String,
    pub initial_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
    pub connect_timeout: Duration,
}

impl RealtimeConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Derive from application config; None when the store is not
    /// configured or realtime is disabled
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.realtime_enabled {
            return None;
        }
        let url = config.realtime_url()?;
        let key = config.store_key.clone()?;
        let mut realtime = Self::new(url, key);
        realtime.connect_timeout = config.request_timeout();
        Some(realtime)
    }
}

/// Realtime change feed backed by a background WebSocket task
pub struct RealtimeClient {
    command_tx: mpsc::UnboundedSender<RealtimeCommand>,
    status_rx: watch::Receiver<ConnectionStatus>,
    next_id: AtomicU64,
}

impl RealtimeClient {
    /// Spawn the connection task
    ///
    /// The socket is opened lazily, when the first table is subscribed.
    /// `sessions` supplies the token channels are joined with, so admin-only
    /// tables deliver events to a signed-in admin. Channels are re-joined
    /// whenever the session changes.
    pub fn spawn(config: RealtimeConfig, sessions: Option<Arc<dyn SessionProvider>>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        tokio::spawn(connection_loop(config, sessions, command_rx, status_tx));

        Self {
            command_tx,
            status_rx,
            next_id: AtomicU64::new(1),
        }
    }

    /// Watch connection status
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Stop the connection task, leaving every channel
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(RealtimeCommand::Shutdown);
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl ChangeFeed for RealtimeClient {
    async fn subscribe(
        &self,
        table: Table,
        sink: mpsc::Sender<ChangeEvent>,
    ) -> StoreResult<ChangeSubscription> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.command_tx
            .send(RealtimeCommand::Subscribe { id, table, sink })
            .map_err(|_| StoreError::Realtime("realtime connection has stopped".to_string()))?;

        let command_tx = self.command_tx.clone();
        Ok(ChangeSubscription::new(table, move || {
            let _ = command_tx.send(RealtimeCommand::Release { id });
        }))
    }
}

/// Token to join channels with: the admin's access token, else the api key
async fn channel_token(sessions: Option<&dyn SessionProvider>, api_key: &str) -> String {
    if let Some(sessions) = sessions {
        if let Ok(Some(session)) = sessions.current_session().await {
            return session.access_token;
        }
    }
    api_key.to_string()
}

struct Listener {
    id: u64,
    sink: mpsc::Sender<ChangeEvent>,
}

/// Effect of a command on the set of joined tables
#[derive(Debug, PartialEq)]
enum ChannelChange {
    Joined(Table),
    Left(Table),
    Unchanged,
}

/// Live subscriptions, grouped by table
#[derive(Default)]
struct Channels {
    tables: HashMap<Table, Vec<Listener>>,
}

impl Channels {
    fn apply(&mut self, command: RealtimeCommand) -> ChannelChange {
        match command {
            RealtimeCommand::Subscribe { id, table, sink } => {
                let listener = Listener { id, sink };
                match self.tables.get_mut(&table) {
                    Some(listeners) => {
                        listeners.push(listener);
                        ChannelChange::Unchanged
                    }
                    None => {
                        self.tables.insert(table, vec![listener]);
                        ChannelChange::Joined(table)
                    }
                }
            }
            RealtimeCommand::Release { id } => {
                let Some(table) = self
                    .tables
                    .iter()
                    .find(|(_, listeners)| listeners.iter().any(|l| l.id == id))
                    .map(|(table, _)| *table)
                else {
                    return ChannelChange::Unchanged;
                };
                let emptied = match self.tables.get_mut(&table) {
                    Some(listeners) => {
                        listeners.retain(|l| l.id != id);
                        listeners.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.tables.remove(&table);
                    ChannelChange::Left(table)
                } else {
                    ChannelChange::Unchanged
                }
            }
            RealtimeCommand::Shutdown => ChannelChange::Unchanged,
        }
    }

    fn dispatch(&self, table: Table, kind: ChangeKind) {
        if let Some(listeners) = self.tables.get(&table) {
            for listener in listeners {
                // Best effort; a full sink already has a refresh pending
                let _ = listener.sink.try_send(ChangeEvent { table, kind });
            }
        }
    }

    /// Tell every listener its table may have changed
    fn dispatch_all(&self, kind: ChangeKind) {
        for table in self.tables.keys() {
            self.dispatch(*table, kind);
        }
    }

    fn joined(&self) -> Vec<Table> {
        self.tables.keys().copied().collect()
    }

    fn contains(&self, table: Table) -> bool {
        self.tables.contains_key(&table)
    }

    fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Main connection loop with reconnection
async fn connection_loop(
    config: RealtimeConfig,
    sessions: Option<Arc<dyn SessionProvider>>,
    mut command_rx: mpsc::UnboundedReceiver<RealtimeCommand>,
    status_tx: watch::Sender<ConnectionStatus>,
) {
    let mut channels = Channels::default();
    let mut reconnect_delay = config.initial_reconnect_delay;
    // Set once a connection is lost while tables are live
    let mut missed_changes = false;

    loop {
        if channels.is_empty() {
            missed_changes = false;
        }
        // Stay offline until something is subscribed
        while channels.is_empty() {
            match command_rx.recv().await {
                Some(RealtimeCommand::Shutdown) | None => return,
                Some(command) => {
                    channels.apply(command);
                }
            }
        }

        let _ = status_tx.send(ConnectionStatus::Connecting);
        let connection = Connection {
            config: &config,
            sessions: sessions.as_deref(),
            status_tx: &status_tx,
        };
        match connection
            .listen(&mut channels, &mut command_rx, missed_changes)
            .await
        {
            Ok(true) => break,
            Ok(false) => {
                // Connection closed normally, reset backoff
                reconnect_delay = config.initial_reconnect_delay;
            }
            Err(e) => warn!("Realtime connection error: {}", e),
        }
        let _ = status_tx.send(ConnectionStatus::Disconnected);
        missed_changes = true;

        if channels.is_empty() {
            continue;
        }

        // Wait before reconnecting, still accepting commands
        debug!("Reconnecting to realtime in {:?}", reconnect_delay);
        let sleep = tokio::time::sleep(reconnect_delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => {
                    reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
                    break;
                }
                command = command_rx.recv() => match command {
                    Some(RealtimeCommand::Shutdown) | None => return,
                    Some(command) => {
                        channels.apply(command);
                    }
                }
            }
        }
    }

    let _ = status_tx.send(ConnectionStatus::Disconnected);
}

async fn send_frames<S>(write: &mut S, frames: Vec<Frame>) -> Result<()>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    for frame in frames {
        write.send(Message::Text(frame.encode())).await?;
    }
    Ok(())
}

/// One WebSocket connection attempt
struct Connection<'a> {
    config: &'a RealtimeConfig,
    sessions: Option<&'a dyn SessionProvider>,
    status_tx: &'a watch::Sender<ConnectionStatus>,
}

impl Connection<'_> {
    async fn token(&self) -> String {
        channel_token(self.sessions, &self.config.api_key).await
    }

    /// Connect and relay events until disconnection or shutdown
    ///
    /// When `resync` is set, every listener gets one change event after the
    /// channels are joined, since changes made while offline were never
    /// delivered. Returns `Ok(true)` on shutdown.
    async fn listen(
        &self,
        channels: &mut Channels,
        command_rx: &mut mpsc::UnboundedReceiver<RealtimeCommand>,
        resync: bool,
    ) -> Result<bool> {
        let config = self.config;
        let (ws_stream, _) =
            tokio::time::timeout(config.connect_timeout, connect_async(&config.url))
                .await
                .map_err(|_| anyhow!("timed out after {:?}", config.connect_timeout))??;
        let (mut write, mut read) = ws_stream.split();

        let mut next_ref = 0u64;
        let mut reference = move || {
            next_ref += 1;
            next_ref
        };

        // Without a session provider the api key never changes
        let (_fixed, fixed_rx) = watch::channel(None);
        let mut session_rx = match self.sessions {
            Some(sessions) => sessions.session_changes(),
            None => fixed_rx,
        };

        // Join (or re-join) every live table
        let mut token = self.token().await;
        let joined = channels.joined();
        let frames = joined
            .iter()
            .map(|table| Frame::join(*table, &token, reference()))
            .collect();
        send_frames(&mut write, frames).await?;
        let _ = self.status_tx.send(ConnectionStatus::Connected);
        info!("Realtime connected, {} table(s) joined", joined.len());

        if resync {
            debug!("Realtime reconnected, asking listeners to resync");
            channels.dispatch_all(ChangeKind::Update);
        }

        let period = config.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);

        // Channels closed by the server wait here for a delayed re-join
        let mut closed: Vec<Table> = Vec::new();
        let mut rejoin_delay = config.initial_reconnect_delay;
        let rejoin = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(rejoin);

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(RealtimeCommand::Shutdown) | None => {
                            let frames = channels
                                .joined()
                                .into_iter()
                                .map(|table| Frame::leave(table, reference()))
                                .collect();
                            let _ = send_frames(&mut write, frames).await;
                            write.close().await.ok();
                            return Ok(true);
                        }
                        Some(command) => match channels.apply(command) {
                            ChannelChange::Joined(table) => {
                                debug!("Joining realtime channel for {}", table);
                                token = self.token().await;
                                let frames = vec![Frame::join(table, &token, reference())];
                                send_frames(&mut write, frames).await?;
                            }
                            ChannelChange::Left(table) => {
                                debug!("Leaving realtime channel for {}", table);
                                closed.retain(|t| *t != table);
                                let frames = vec![Frame::leave(table, reference())];
                                send_frames(&mut write, frames).await?;
                            }
                            ChannelChange::Unchanged => {}
                        },
                    }
                }

                Ok(()) = session_rx.changed() => {
                    let fresh = self.token().await;
                    if fresh != token {
                        token = fresh;
                        let tables = channels.joined();
                        debug!("Session changed, re-joining {} realtime channel(s)", tables.len());
                        let mut frames = Vec::with_capacity(tables.len() * 2);
                        for table in tables {
                            frames.push(Frame::leave(table, reference()));
                            frames.push(Frame::join(table, &token, reference()));
                        }
                        send_frames(&mut write, frames).await?;
                        closed.clear();
                    }
                }

                _ = &mut rejoin, if !closed.is_empty() => {
                    token = self.token().await;
                    let frames = closed
                        .drain(..)
                        .filter(|table| channels.contains(*table))
                        .map(|table| Frame::join(table, &token, reference()))
                        .collect();
                    send_frames(&mut write, frames).await?;
                }

                _ = heartbeat.tick() => {
                    let frames = vec![Frame::heartbeat(reference())];
                    send_frames(&mut write, frames).await?;
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let frame = match Frame::decode(&text) {
                                Ok(frame) => frame,
                                Err(e) => {
                                    debug!("Ignoring undecodable realtime frame: {}", e);
                                    continue;
                                }
                            };
                            match frame.classify() {
                                Incoming::Change { table, kind } => {
                                    debug!("Change on {}: {:?}", table, kind);
                                    rejoin_delay = config.initial_reconnect_delay;
                                    channels.dispatch(table, kind);
                                }
                                Incoming::Refused { topic, reason } => {
                                    warn!("Realtime refused request on {}: {}", topic, reason);
                                }
                                Incoming::ChannelClosed(table)
                                    if channels.contains(table) && !closed.contains(&table) =>
                                {
                                    warn!(
                                        "Realtime channel for {} closed by server, re-joining in {:?}",
                                        table, rejoin_delay
                                    );
                                    if closed.is_empty() {
                                        rejoin.as_mut().reset(Instant::now() + rejoin_delay);
                                        rejoin_delay =
                                            (rejoin_delay * 2).min(config.max_reconnect_delay);
                                    }
                                    closed.push(table);
                                }
                                _ => {}
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return Ok(false);
                        }
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::{accept_async, WebSocketStream};

    use crate::realtime::message::{EVENT_CLOSE, EVENT_HEARTBEAT, EVENT_JOIN, EVENT_LEAVE};
    use crate::store::MemoryStore;

    fn subscribe_cmd(id: u64, table: Table) -> (RealtimeCommand, mpsc::Receiver<ChangeEvent>) {
        let (sink, rx) = mpsc::channel(4);
        (RealtimeCommand::Subscribe { id, table, sink }, rx)
    }

    type ServerSocket = WebSocketStream<TcpStream>;

    /// Local realtime endpoint handing every accepted socket to the test
    async fn spawn_socket_server() -> (String, mpsc::UnboundedReceiver<ServerSocket>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(socket) = accept_async(stream).await {
                    let _ = tx.send(socket);
                }
            }
        });
        (format!("ws://{}/realtime/v1/websocket", addr), rx)
    }

    fn socket_config(url: &str) -> RealtimeConfig {
        let mut config = RealtimeConfig::new(url, "anon");
        config.initial_reconnect_delay = Duration::from_millis(50);
        config.max_reconnect_delay = Duration::from_secs(2);
        config.heartbeat_interval = Duration::from_secs(60);
        config.connect_timeout = Duration::from_secs(2);
        config
    }

    async fn next_socket(sockets: &mut mpsc::UnboundedReceiver<ServerSocket>) -> ServerSocket {
        tokio::time::timeout(Duration::from_secs(5), sockets.recv())
            .await
            .unwrap()
            .unwrap()
    }

    /// Next frame the client sent, skipping heartbeats
    async fn next_frame(socket: &mut ServerSocket) -> Frame {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Message::Text(text) = msg {
                let frame = Frame::decode(&text).unwrap();
                if frame.event != EVENT_HEARTBEAT {
                    return frame;
                }
            }
        }
    }

    fn close_frame(table: Table) -> Message {
        let frame = Frame {
            topic: crate::realtime::message::topic_for(table),
            event: EVENT_CLOSE.to_string(),
            payload: json!({}),
            reference: None,
        };
        Message::Text(frame.encode())
    }

    #[test]
    fn test_default_config() {
        let config = RealtimeConfig::new("ws://localhost:4000", "anon");
        assert_eq!(config.initial_reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_from_config_respects_toggle() {
        let mut config = Config {
            store_url: Some("https://abc.example.co".to_string()),
            store_key: Some("anon".to_string()),
            ..Config::default()
        };
        let realtime = RealtimeConfig::from_config(&config).unwrap();
        assert!(realtime.url.starts_with("wss://abc.example.co/realtime/v1/websocket"));
        assert_eq!(realtime.api_key, "anon");

        config.realtime_enabled = false;
        assert!(RealtimeConfig::from_config(&config).is_none());
    }

    #[test]
    fn test_channels_join_once_per_table() {
        let mut channels = Channels::default();
        let (first, _rx1) = subscribe_cmd(1, Table::Projects);
        let (second, _rx2) = subscribe_cmd(2, Table::Projects);

        assert_eq!(channels.apply(first), ChannelChange::Joined(Table::Projects));
        assert_eq!(channels.apply(second), ChannelChange::Unchanged);
        assert_eq!(channels.joined().len(), 1);

        assert_eq!(
            channels.apply(RealtimeCommand::Release { id: 1 }),
            ChannelChange::Unchanged
        );
        assert_eq!(
            channels.apply(RealtimeCommand::Release { id: 2 }),
            ChannelChange::Left(Table::Projects)
        );
        assert!(channels.is_empty());
        assert_eq!(
            channels.apply(RealtimeCommand::Release { id: 2 }),
            ChannelChange::Unchanged
        );
    }

    #[test]
    fn test_dispatch_reaches_table_listeners() {
        let mut channels = Channels::default();
        let (projects, mut projects_rx) = subscribe_cmd(1, Table::Projects);
        let (blogs, mut blogs_rx) = subscribe_cmd(2, Table::Blogs);
        channels.apply(projects);
        channels.apply(blogs);

        channels.dispatch(Table::Blogs, ChangeKind::Delete);
        assert_eq!(
            blogs_rx.try_recv().unwrap(),
            ChangeEvent {
                table: Table::Blogs,
                kind: ChangeKind::Delete
            }
        );
        assert!(projects_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_subscribe_and_release_without_server() {
        let mut config = RealtimeConfig::new("ws://127.0.0.1:9/realtime/v1/websocket", "anon");
        config.connect_timeout = Duration::from_millis(200);
        let client = RealtimeClient::spawn(config, None);

        let (sink, _rx) = mpsc::channel(4);
        let sub = client.subscribe(Table::Leads, sink).await.unwrap();
        assert_eq!(sub.table(), Table::Leads);
        drop(sub);

        let mut status = client.status();
        client.shutdown();
        let settled = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if *status.borrow_and_update() == ConnectionStatus::Disconnected {
                    break;
                }
                if status.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;
        assert!(settled.is_ok());
    }

    #[test]
    fn test_dispatch_all_reaches_every_table() {
        let mut channels = Channels::default();
        let (projects, mut projects_rx) = subscribe_cmd(1, Table::Projects);
        let (leads, mut leads_rx) = subscribe_cmd(2, Table::Leads);
        channels.apply(projects);
        channels.apply(leads);

        channels.dispatch_all(ChangeKind::Update);
        assert_eq!(projects_rx.try_recv().unwrap().table, Table::Projects);
        assert_eq!(leads_rx.try_recv().unwrap().table, Table::Leads);
    }

    #[tokio::test]
    async fn test_reconnect_asks_listeners_to_resync() {
        let (url, mut sockets) = spawn_socket_server().await;
        let client = RealtimeClient::spawn(socket_config(&url), None);
        let (sink, mut events) = mpsc::channel(4);
        let _sub = client.subscribe(Table::Projects, sink).await.unwrap();

        let mut first = next_socket(&mut sockets).await;
        assert_eq!(next_frame(&mut first).await.event, EVENT_JOIN);
        assert!(events.try_recv().is_err());

        // Drop the connection; anything written meanwhile is never announced
        first.close(None).await.unwrap();
        drop(first);

        let mut second = next_socket(&mut sockets).await;
        let rejoin = next_frame(&mut second).await;
        assert_eq!(rejoin.event, EVENT_JOIN);
        assert_eq!(rejoin.topic, "realtime:public:projects");

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.table, Table::Projects);
    }

    #[tokio::test]
    async fn test_sign_in_rejoins_with_session_token() {
        let store = MemoryStore::new().with_admin("admin@example.com", "secret");
        let (url, mut sockets) = spawn_socket_server().await;
        let client = RealtimeClient::spawn(socket_config(&url), Some(Arc::new(store.clone())));
        let (sink, _events) = mpsc::channel(4);
        let _sub = client.subscribe(Table::Leads, sink).await.unwrap();

        let mut socket = next_socket(&mut sockets).await;
        let join = next_frame(&mut socket).await;
        assert_eq!(join.event, EVENT_JOIN);
        assert_eq!(join.payload["access_token"], "anon");

        let session = store.sign_in("admin@example.com", "secret").await.unwrap();

        let leave = next_frame(&mut socket).await;
        assert_eq!(leave.event, EVENT_LEAVE);
        assert_eq!(leave.topic, "realtime:public:leads");
        let rejoin = next_frame(&mut socket).await;
        assert_eq!(rejoin.event, EVENT_JOIN);
        assert_eq!(rejoin.payload["access_token"], session.access_token.as_str());
    }

    #[tokio::test]
    async fn test_closed_channel_rejoins_with_backoff() {
        let (url, mut sockets) = spawn_socket_server().await;
        let mut config = socket_config(&url);
        config.initial_reconnect_delay = Duration::from_millis(200);
        let client = RealtimeClient::spawn(config, None);
        let (sink, _events) = mpsc::channel(4);
        let _sub = client.subscribe(Table::Skills, sink).await.unwrap();

        let mut socket = next_socket(&mut sockets).await;
        assert_eq!(next_frame(&mut socket).await.event, EVENT_JOIN);

        socket.send(close_frame(Table::Skills)).await.unwrap();
        let closed_at = Instant::now();
        assert_eq!(next_frame(&mut socket).await.event, EVENT_JOIN);
        assert!(closed_at.elapsed() >= Duration::from_millis(180));

        // A second close in a row waits twice as long
        socket.send(close_frame(Table::Skills)).await.unwrap();
        let closed_at = Instant::now();
        assert_eq!(next_frame(&mut socket).await.event, EVENT_JOIN);
        assert!(closed_at.elapsed() >= Duration::from_millis(380));
    }
}
