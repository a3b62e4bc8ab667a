//! The published read model

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::fallback::Collection;
use crate::models::{
    Achievement, BlogPost, ExperienceItem, Lead, Project, Service, SiteSettings, Skill,
    Testimonial,
};

/// Whether the first full fetch has completed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
}

/// Every collection plus settings, as of one full fetch
///
/// Snapshots are immutable once published; a refresh replaces the whole
/// value, so collections never disagree about which fetch they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub state: LoadState,
    /// Increases with every publication
    pub generation: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Whether the fetch ran with an admin session
    pub authenticated: bool,
    /// Orchestration-level failure, e.g. the session check itself
    pub error: Option<String>,
    /// Collections whose fetch failed and were replaced by their fallback
    pub failed: Vec<Collection>,

    pub projects: Vec<Project>,
    pub experience: Vec<ExperienceItem>,
    pub services: Vec<Service>,
    pub achievements: Vec<Achievement>,
    pub blogs: Vec<BlogPost>,
    pub testimonials: Vec<Testimonial>,
    pub leads: Vec<Lead>,
    pub skills: Vec<Skill>,
    pub settings: SiteSettings,
}

impl Snapshot {
    /// The value readers see before the first fetch completes
    pub fn loading() -> Self {
        Self {
            state: LoadState::Loading,
            generation: 0,
            fetched_at: None,
            authenticated: false,
            error: None,
            failed: Vec::new(),
            projects: Vec::new(),
            experience: Vec::new(),
            services: Vec::new(),
            achievements: Vec::new(),
            blogs: Vec::new(),
            testimonials: Vec::new(),
            leads: Vec::new(),
            skills: Vec::new(),
            settings: SiteSettings::default(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::loading()
    }
}
