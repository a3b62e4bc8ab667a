//! Admin mutations and the public contact form
//!
//! Mutations go straight to the store. A successful mutation is followed by
//! a refresh of the synchronization worker, so the snapshot only ever shows
//! confirmed store state. A failed mutation returns the store's message and
//! leaves the snapshot as it was. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::ResumeExtract;
use crate::auth::SessionProvider;
use crate::mapping::{self, keys, CONTACT_FORM_SOURCE};
use crate::models::{
    Achievement, BlogPost, ExperienceItem, Lead, LeadStatus, Project, Service, SiteSettings,
    Skill, Testimonial,
};
use crate::store::{RemoteStore, StoreError, Table};
use crate::sync::{bounded, SyncHandle};

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Sign in to make changes")]
    NotAuthenticated,

    #[error("{}", .0.message())]
    Store(#[from] StoreError),

    #[error("{0}")]
    Invalid(String),
}

pub type MutationResult<T> = std::result::Result<T, MutationError>;

/// A persisted content type
pub trait Entity {
    const TABLE: Table;

    /// Store id, if the entity has been saved before
    fn id(&self) -> Option<&str>;

    /// Persisted record without the id
    fn to_record(&self) -> Value;
}

fn saved(id: &str) -> Option<&str> {
    (!id.is_empty()).then_some(id)
}

macro_rules! entity {
    ($ty:ty, $table:expr, $to_record:path) => {
        impl Entity for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> Option<&str> {
                saved(&self.id)
            }

            fn to_record(&self) -> Value {
                $to_record(self)
            }
        }
    };
}

entity!(Project, Table::Projects, mapping::project_to_record);
entity!(ExperienceItem, Table::Experience, mapping::experience_to_record);
entity!(Service, Table::Services, mapping::service_to_record);
entity!(Achievement, Table::Achievements, mapping::achievement_to_record);
entity!(BlogPost, Table::Blogs, mapping::blog_to_record);
entity!(Testimonial, Table::Testimonials, mapping::testimonial_to_record);
entity!(Lead, Table::Leads, mapping::lead_to_record);

impl Entity for Skill {
    const TABLE: Table = Table::Skills;

    fn id(&self) -> Option<&str> {
        self.id.as_deref().and_then(saved)
    }

    fn to_record(&self) -> Value {
        mapping::skill_to_record(self)
    }
}

impl Entity for SiteSettings {
    const TABLE: Table = Table::SiteSettings;

    fn id(&self) -> Option<&str> {
        self.id.as_deref().and_then(saved)
    }

    fn to_record(&self) -> Value {
        mapping::settings_to_record(self)
    }
}

/// Counts of rows created by a resume import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub experience: usize,
    pub projects: usize,
    pub achievements: usize,
    pub settings_updated: bool,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.experience + self.projects + self.achievements
    }
}

/// Authenticated write access to the store
#[derive(Clone)]
pub struct Admin {
    store: Arc<dyn RemoteStore>,
    sessions: Arc<dyn SessionProvider>,
    sync: SyncHandle,
    timeout: Duration,
}

impl Admin {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        sessions: Arc<dyn SessionProvider>,
        sync: SyncHandle,
    ) -> Self {
        Self {
            store,
            sessions,
            sync,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn ensure_signed_in(&self) -> MutationResult<()> {
        match self.sessions.current_session().await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(MutationError::NotAuthenticated),
            Err(e) => {
                warn!("Session check before mutation failed: {}", e);
                Err(MutationError::NotAuthenticated)
            }
        }
    }

    async fn refreshed(&self) {
        if let Err(e) = self.sync.refresh().await {
            warn!("Refresh after mutation skipped: {}", e);
        }
    }

    async fn update_fields(&self, table: Table, id: &str, changes: Value) -> MutationResult<()> {
        self.ensure_signed_in().await?;
        bounded(self.timeout, self.store.update(table, id, changes)).await?;
        debug!("Updated {} {}", table, id);
        self.refreshed().await;
        Ok(())
    }

    /// Insert or update `entity`, returning its id
    pub async fn save<E: Entity + Sync>(&self, entity: &E) -> MutationResult<String> {
        self.ensure_signed_in().await?;
        let id = match entity.id() {
            Some(id) => {
                bounded(self.timeout, self.store.update(E::TABLE, id, entity.to_record()))
                    .await?;
                id.to_string()
            }
            None => {
                let row = bounded(self.timeout, self.store.insert(E::TABLE, entity.to_record()))
                    .await?;
                row_id(&row)
            }
        };
        info!("Saved {} {}", E::TABLE, id);
        self.refreshed().await;
        Ok(id)
    }

    pub async fn delete<E: Entity>(&self, id: &str) -> MutationResult<()> {
        self.ensure_signed_in().await?;
        bounded(self.timeout, self.store.delete(E::TABLE, id)).await?;
        info!("Deleted {} {}", E::TABLE, id);
        self.refreshed().await;
        Ok(())
    }

    pub async fn toggle_project_visibility(&self, project: &Project) -> MutationResult<()> {
        self.set_project_visible(&project.id, !project.visible).await
    }

    pub async fn toggle_project_featured(&self, project: &Project) -> MutationResult<()> {
        self.set_project_featured(&project.id, !project.featured).await
    }

    pub async fn set_project_visible(&self, id: &str, visible: bool) -> MutationResult<()> {
        self.update_fields(Table::Projects, id, field(keys::VISIBLE, visible))
            .await
    }

    pub async fn set_project_featured(&self, id: &str, featured: bool) -> MutationResult<()> {
        self.update_fields(Table::Projects, id, field(keys::FEATURED, featured))
            .await
    }

    /// Flip a lead between `new` and `read`
    pub async fn toggle_lead_status(&self, lead: &Lead) -> MutationResult<LeadStatus> {
        let status = lead.status.toggled();
        self.set_lead_status(&lead.id, status).await?;
        Ok(status)
    }

    pub async fn set_lead_status(&self, id: &str, status: LeadStatus) -> MutationResult<()> {
        self.update_fields(Table::Leads, id, field(keys::STATUS, status.as_str()))
            .await
    }

    /// Update the settings row, or create it when running on defaults
    pub async fn save_settings(&self, settings: &SiteSettings) -> MutationResult<String> {
        self.save(settings).await
    }

    /// Insert everything extracted from a resume
    ///
    /// Settings are only updated when a settings row already exists.
    pub async fn import_resume(&self, extract: &ResumeExtract) -> MutationResult<ImportSummary> {
        self.ensure_signed_in().await?;
        if extract.is_empty() {
            return Err(MutationError::Invalid(
                "Nothing could be extracted from the document".to_string(),
            ));
        }

        let mut summary = ImportSummary::default();
        let result = self.insert_extract(extract, &mut summary).await;
        if summary.total() > 0 || summary.settings_updated {
            self.refreshed().await;
        }
        result?;

        info!(
            "Imported resume: {} experience, {} projects, {} achievements",
            summary.experience, summary.projects, summary.achievements
        );
        Ok(summary)
    }

    async fn insert_extract(
        &self,
        extract: &ResumeExtract,
        summary: &mut ImportSummary,
    ) -> MutationResult<()> {
        for item in extract.experience_items() {
            self.insert(&item).await?;
            summary.experience += 1;
        }
        for project in extract.project_items() {
            self.insert(&project).await?;
            summary.projects += 1;
        }
        for achievement in extract.achievement_items() {
            self.insert(&achievement).await?;
            summary.achievements += 1;
        }

        let current = self.sync.snapshot().settings.clone();
        if let (Some(id), Some(merged)) = (current.id.as_deref(), extract.merged_settings(&current)) {
            bounded(
                self.timeout,
                self.store.update(Table::SiteSettings, id, merged.to_record()),
            )
            .await?;
            summary.settings_updated = true;
        }
        Ok(())
    }

    async fn insert<E: Entity>(&self, entity: &E) -> MutationResult<()> {
        bounded(self.timeout, self.store.insert(E::TABLE, entity.to_record())).await?;
        Ok(())
    }
}

/// Single-field update payload
fn field(key: &str, value: impl Into<Value>) -> Value {
    let mut changes = Map::new();
    changes.insert(key.to_string(), value.into());
    Value::Object(changes)
}

fn row_id(row: &Value) -> String {
    match row.get(keys::ID) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// A public contact-form submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    fn validate(&self) -> MutationResult<()> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(MutationError::Invalid(format!(
                "Missing required field: {}",
                missing.join(", ")
            )));
        }
        if !self.email.contains('@') {
            return Err(MutationError::Invalid(format!(
                "Not an email address: {}",
                self.email.trim()
            )));
        }
        Ok(())
    }

    /// The lead this form becomes, dated today
    pub fn to_lead(&self) -> Lead {
        Lead {
            id: String::new(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
            date: Local::now().format("%Y-%m-%d").to_string(),
            status: LeadStatus::New,
            source: CONTACT_FORM_SOURCE.to_string(),
        }
    }
}

/// Record a contact-form submission as a new lead
///
/// Needs no session. Returns the id of the inserted lead.
pub async fn submit_lead(
    store: &dyn RemoteStore,
    form: &ContactForm,
    timeout: Duration,
) -> MutationResult<String> {
    form.validate()?;
    let lead = form.to_lead();
    let row = bounded(timeout, store.insert(Table::Leads, lead.to_record())).await?;
    info!("Received lead from {}", lead.email);
    Ok(row_id(&row))
}
