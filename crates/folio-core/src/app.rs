//! Wiring of the store, session, change feed and sync worker

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::ai::{generator_from_config, ChatAssistant, TextGenerator};
use crate::auth::{AuthClient, SessionProvider};
use crate::config::Config;
use crate::mutation::Admin;
use crate::realtime::{RealtimeClient, RealtimeConfig};
use crate::store::{ChangeFeed, RemoteStore, RestStore};
use crate::sync::{PortfolioSync, SyncHandle};

/// A connected Folio instance
///
/// Dropping it stops the sync worker and the realtime connection.
pub struct Folio {
    pub config: Config,
    pub store: Arc<dyn RemoteStore>,
    pub auth: Arc<AuthClient>,
    pub realtime: Option<Arc<RealtimeClient>>,
    pub sync: SyncHandle,
    pub admin: Admin,
    pub generator: Option<Arc<dyn TextGenerator>>,
}

impl Folio {
    /// Connect using the configured store
    ///
    /// With `live` set (and realtime enabled in the configuration) the
    /// snapshot follows store changes as they happen; otherwise it only
    /// changes on session changes and explicit refreshes.
    pub fn connect(config: &Config, live: bool) -> Result<Self> {
        let auth = Arc::new(AuthClient::new(config).context("Failed to set up sessions")?);
        let sessions: Arc<dyn SessionProvider> = auth.clone();
        let store: Arc<dyn RemoteStore> = Arc::new(
            RestStore::new(config, Some(sessions.clone()))
                .context("Failed to set up the store client")?,
        );

        let realtime = if live {
            RealtimeConfig::from_config(config)
                .map(|rt| Arc::new(RealtimeClient::spawn(rt, Some(sessions.clone()))))
        } else {
            None
        };

        let mut builder = PortfolioSync::new(store.clone(), sessions.clone())
            .with_timeout(config.request_timeout());
        if let Some(ref feed) = realtime {
            let feed: Arc<dyn ChangeFeed> = feed.clone();
            builder = builder.with_feed(feed);
        }
        let sync = builder.spawn();
        info!(
            "Connected to store (live updates {})",
            if realtime.is_some() { "on" } else { "off" }
        );

        let admin = Admin::new(store.clone(), sessions, sync.clone())
            .with_timeout(config.request_timeout());

        Ok(Self {
            config: config.clone(),
            store,
            auth,
            realtime,
            sync,
            admin,
            generator: generator_from_config(config),
        })
    }

    pub fn assistant(&self) -> ChatAssistant {
        ChatAssistant::new(self.generator.clone())
    }

    /// Stop the sync worker and leave every realtime channel
    pub fn shutdown(&self) {
        self.sync.shutdown();
        if let Some(ref realtime) = self.realtime {
            realtime.shutdown();
        }
    }
}

impl Drop for Folio {
    fn drop(&mut self) {
        self.shutdown();
    }
}
