//! Folio Core Library
//!
//! This crate provides the core of Folio, a developer portfolio backed by a
//! hosted data store: the content model, a live-synchronized snapshot of
//! every collection, the admin mutation path and the generative-text
//! features.
//!
//! # Architecture
//!
//! - **Remote store**: source of truth for all content, reached through the
//!   [`store::RemoteStore`] seam
//! - **Sync worker**: keeps one immutable [`Snapshot`] current, re-fetching
//!   everything whenever any table changes
//! - **Admin**: writes go straight to the store, then refresh the snapshot
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let app = Folio::connect(&config)?;
//!
//! let snapshot = app.sync.ready().await?;
//! for project in views::public_projects(&snapshot) {
//!     println!("{}", project.title);
//! }
//! ```
//!
//! # Modules
//!
//! - `config`: Application configuration
//! - `models`: Content types (projects, experience, skills, ...)
//! - `mapping`: Persisted record shape to and from the models
//! - `store`: Remote store seam, REST client and in-memory store
//! - `auth`: Admin sessions
//! - `realtime`: Table change notifications over a WebSocket
//! - `sync`: The synchronized snapshot
//! - `mutation`: Admin writes and the contact form
//! - `views`: Pure helpers for rendering
//! - `route`: Top-level view selection
//! - `ai`: Chat assistant and writing assists

pub mod ai;
pub mod auth;
pub mod config;
pub mod defaults;
pub mod mapping;
pub mod models;
pub mod mutation;
pub mod realtime;
pub mod route;
pub mod store;
pub mod sync;
pub mod views;

mod app;

pub use ai::{AiError, ChatAssistant, GeminiClient, TextGenerator};
pub use app::Folio;
pub use auth::{AuthClient, AuthError, Session, SessionProvider, SignUpOutcome};
pub use config::Config;
pub use models::{
    Achievement, BlogPost, ExperienceItem, Lead, LeadStatus, Project, Service, SiteSettings,
    Skill, SkillCategory, Testimonial,
};
pub use mutation::{Admin, ContactForm, MutationError};
pub use realtime::RealtimeClient;
pub use route::Route;
pub use store::{MemoryStore, RemoteStore, RestStore, StoreError, Table};
pub use sync::{PortfolioSync, Snapshot, SyncError, SyncHandle};
