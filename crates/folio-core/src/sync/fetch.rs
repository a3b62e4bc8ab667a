//! Full fetch of every collection
//!
//! All collections are requested in parallel and resolved independently: a
//! failing collection takes its fallback while the others still populate.
//! The leads fetch is gated on a session check made fresh on every call.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use super::fallback::{Collection, Fallback};
use super::snapshot::{LoadState, Snapshot};
use crate::auth::SessionProvider;
use crate::defaults::{default_settings, default_skills};
use crate::mapping::{self, map_all};
use crate::models::{
    Achievement, BlogPost, ExperienceItem, Lead, Project, Service, Skill, Testimonial,
};
use crate::store::{RemoteStore, StoreError, StoreResult};

/// Bound a store call by `timeout`
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

async fn select(
    store: &dyn RemoteStore,
    collection: Collection,
    timeout: Duration,
) -> StoreResult<Vec<Value>> {
    bounded(timeout, store.select(collection.table(), collection.order())).await
}

/// Outcome of the session-gated leads fetch
enum Leads {
    Anonymous,
    SessionCheckFailed(String),
    Fetched(StoreResult<Vec<Value>>),
}

async fn fetch_leads(
    store: &dyn RemoteStore,
    sessions: &dyn SessionProvider,
    timeout: Duration,
) -> Leads {
    let session = match tokio::time::timeout(timeout, sessions.current_session()).await {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => return Leads::SessionCheckFailed(e.to_string()),
        Err(_) => {
            return Leads::SessionCheckFailed(format!("session check timed out after {:?}", timeout))
        }
    };
    match session {
        Some(_) => Leads::Fetched(select(store, Collection::Leads, timeout).await),
        None => Leads::Anonymous,
    }
}

/// Built-in rows an item type can stand in with
trait Substitute: Sized {
    fn substitute(_fallback: Fallback) -> Vec<Self> {
        Vec::new()
    }
}

impl Substitute for Project {}
impl Substitute for ExperienceItem {}
impl Substitute for Service {}
impl Substitute for Achievement {}
impl Substitute for BlogPost {}
impl Substitute for Testimonial {}
impl Substitute for Lead {}

impl Substitute for Skill {
    fn substitute(fallback: Fallback) -> Vec<Self> {
        match fallback {
            Fallback::DefaultSkills => default_skills(),
            _ => Vec::new(),
        }
    }
}

/// Resolve a list collection against its policy
fn resolve<T: Substitute>(
    collection: Collection,
    result: StoreResult<Vec<Value>>,
    map: fn(&Value) -> T,
    failed: &mut Vec<Collection>,
) -> Vec<T> {
    let policy = collection.policy();
    match result {
        Ok(rows) if rows.is_empty() && policy.trigger.on_empty() => {
            debug!("{} is empty, using {:?}", collection, policy.fallback);
            T::substitute(policy.fallback)
        }
        Ok(rows) => map_all(&rows, map),
        Err(e) => {
            warn!("Failed to fetch {}, using {:?}: {}", collection, policy.fallback, e);
            failed.push(collection);
            T::substitute(policy.fallback)
        }
    }
}

/// Fetch every collection and assemble a Ready snapshot
///
/// Never fails; every error is folded into the snapshot.
pub async fn fetch_snapshot(
    store: &dyn RemoteStore,
    sessions: &dyn SessionProvider,
    timeout: Duration,
) -> Snapshot {
    debug!("Fetching all collections");
    let (projects, experience, services, achievements, blogs, testimonials, skills, settings, leads) = tokio::join!(
        select(store, Collection::Projects, timeout),
        select(store, Collection::Experience, timeout),
        select(store, Collection::Services, timeout),
        select(store, Collection::Achievements, timeout),
        select(store, Collection::Blogs, timeout),
        select(store, Collection::Testimonials, timeout),
        select(store, Collection::Skills, timeout),
        bounded(timeout, store.select_single(Collection::Settings.table())),
        fetch_leads(store, sessions, timeout),
    );

    let mut failed = Vec::new();
    let mut error = None;
    let mut authenticated = false;

    let leads = match leads {
        Leads::Anonymous => Vec::new(),
        Leads::SessionCheckFailed(reason) => {
            // Treated as no session; the rest of the snapshot is unaffected
            warn!("Session check failed, continuing without leads: {}", reason);
            error = Some(format!("Session check failed: {}", reason));
            Vec::new()
        }
        Leads::Fetched(result) => {
            authenticated = true;
            resolve(
                Collection::Leads,
                result,
                mapping::lead_from_record,
                &mut failed,
            )
        }
    };

    let settings = match settings {
        Ok(Some(row)) => mapping::settings_from_record(&row),
        Ok(None) => {
            debug!("No settings row, using defaults");
            default_settings()
        }
        Err(e) => {
            warn!("Failed to fetch settings: {}", e);
            failed.push(Collection::Settings);
            default_settings()
        }
    };

    Snapshot {
        state: LoadState::Ready,
        generation: 0,
        fetched_at: Some(Utc::now()),
        authenticated,
        error,
        projects: resolve(
            Collection::Projects,
            projects,
            mapping::project_from_record,
            &mut failed,
        ),
        experience: resolve(
            Collection::Experience,
            experience,
            mapping::experience_from_record,
            &mut failed,
        ),
        services: resolve(
            Collection::Services,
            services,
            mapping::service_from_record,
            &mut failed,
        ),
        achievements: resolve(
            Collection::Achievements,
            achievements,
            mapping::achievement_from_record,
            &mut failed,
        ),
        blogs: resolve(
            Collection::Blogs,
            blogs,
            mapping::blog_from_record,
            &mut failed,
        ),
        testimonials: resolve(
            Collection::Testimonials,
            testimonials,
            mapping::testimonial_from_record,
            &mut failed,
        ),
        skills: resolve(
            Collection::Skills,
            skills,
            mapping::skill_from_record,
            &mut failed,
        ),
        leads,
        settings,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, SessionUser};
    use crate::models::{LeadStatus, Theme};
    use crate::store::{MemoryStore, Table};
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn admin_session() -> Session {
        Session {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: None,
            user: SessionUser {
                id: "admin".to_string(),
                email: Some("admin@example.com".to_string()),
            },
        }
    }

    fn seed_leads(store: &MemoryStore) {
        store.seed(
            Table::Leads,
            (1..=5)
                .map(|day| {
                    json!({
                        "name": format!("Lead {}", day),
                        "email": "x@example.com",
                        "message": "hello",
                        "date": format!("2024-03-0{}", day),
                        "status": "new"
                    })
                })
                .collect(),
        );
    }

    #[test]
    fn test_resolve_takes_fallback_from_policy() {
        let mut failed = Vec::new();

        let skills = resolve(
            Collection::Skills,
            Ok(Vec::new()),
            mapping::skill_from_record,
            &mut failed,
        );
        assert_eq!(skills, default_skills());
        assert!(failed.is_empty());

        let error = || Err(StoreError::Rejected("down".to_string()));
        let skills = resolve(Collection::Skills, error(), mapping::skill_from_record, &mut failed);
        assert_eq!(skills, default_skills());

        let projects = resolve(
            Collection::Projects,
            error(),
            mapping::project_from_record,
            &mut failed,
        );
        assert!(projects.is_empty());
        assert_eq!(failed, vec![Collection::Skills, Collection::Projects]);

        // Empty is a valid answer for collections without substitute data
        let blogs = resolve(
            Collection::Blogs,
            Ok(Vec::new()),
            mapping::blog_from_record,
            &mut failed,
        );
        assert!(blogs.is_empty());
        assert_eq!(failed.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_uses_skill_and_settings_defaults() {
        let store = MemoryStore::new();
        let snapshot = fetch_snapshot(&store, &store, TIMEOUT).await;

        assert!(snapshot.is_ready());
        assert_eq!(snapshot.skills, default_skills());
        assert_eq!(snapshot.settings, default_settings());
        assert!(snapshot.projects.is_empty());
        assert!(snapshot.failed.is_empty());
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_leads_hidden_without_session() {
        let store = MemoryStore::new();
        seed_leads(&store);

        let snapshot = fetch_snapshot(&store, &store, TIMEOUT).await;
        assert!(!snapshot.authenticated);
        assert!(snapshot.leads.is_empty());
        assert_eq!(store.select_count(Table::Leads), 0);
    }

    #[tokio::test]
    async fn test_leads_sorted_by_date_with_session() {
        let store = MemoryStore::new();
        seed_leads(&store);
        store.set_session(Some(admin_session()));

        let snapshot = fetch_snapshot(&store, &store, TIMEOUT).await;
        assert!(snapshot.authenticated);
        let dates: Vec<_> = snapshot.leads.iter().map(|l| l.date.as_str()).collect();
        assert_eq!(
            dates,
            ["2024-03-05", "2024-03-04", "2024-03-03", "2024-03-02", "2024-03-01"]
        );
        assert_eq!(snapshot.leads[0].status, LeadStatus::New);
    }

    #[tokio::test]
    async fn test_failed_session_check_is_swallowed() {
        let store = MemoryStore::new();
        seed_leads(&store);
        store.seed(Table::Projects, vec![json!({"title": "Kept"})]);
        store.set_session(Some(admin_session()));
        store.fail_session_check(Some("auth unreachable"));

        let snapshot = fetch_snapshot(&store, &store, TIMEOUT).await;
        assert!(snapshot.is_ready());
        assert!(snapshot.leads.is_empty());
        assert!(!snapshot.authenticated);
        assert!(snapshot.error.unwrap().contains("auth unreachable"));
        assert_eq!(snapshot.projects.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_collection_does_not_affect_others() {
        let store = MemoryStore::new();
        store.seed(Table::Projects, vec![json!({"title": "A"}), json!({"title": "B"})]);
        store.seed(Table::Blogs, vec![json!({"title": "Post"})]);
        store.seed(Table::Skills, vec![json!({"name": "Rust", "level": 60})]);
        store.fail_table(Table::Blogs, "blogs exploded");
        store.fail_table(Table::Skills, "skills exploded");

        let snapshot = fetch_snapshot(&store, &store, TIMEOUT).await;
        assert_eq!(snapshot.projects.len(), 2);
        assert!(snapshot.blogs.is_empty());
        assert_eq!(snapshot.skills, default_skills());
        assert!(snapshot.failed.contains(&Collection::Blogs));
        assert!(snapshot.failed.contains(&Collection::Skills));
        assert!(!snapshot.failed.contains(&Collection::Projects));
    }

    #[tokio::test]
    async fn test_settings_row_is_mapped() {
        let store = MemoryStore::new();
        store.seed(
            Table::SiteSettings,
            vec![json!({"id": 1, "hero_title": "Hi", "theme": "light"})],
        );

        let snapshot = fetch_snapshot(&store, &store, TIMEOUT).await;
        assert_eq!(snapshot.settings.hero_title, "Hi");
        assert_eq!(snapshot.settings.theme, Theme::Light);
        assert_eq!(snapshot.settings.id.as_deref(), Some("1"));
        assert_eq!(snapshot.settings.contact_email, default_settings().contact_email);
    }

    #[tokio::test]
    async fn test_slow_store_times_out_per_collection() {
        let store = MemoryStore::new();
        store.set_latency(Duration::from_millis(200));

        let snapshot = fetch_snapshot(&store, &store, Duration::from_millis(20)).await;
        assert!(snapshot.is_ready());
        assert_eq!(snapshot.skills, default_skills());
        assert!(snapshot.failed.contains(&Collection::Projects));
        assert!(snapshot.error.is_some());
    }
}
