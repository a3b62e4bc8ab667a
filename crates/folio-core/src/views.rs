//! Read-only view helpers over a [`Snapshot`]
//!
//! Everything here is a pure function of the snapshot so any front end can
//! render the public site and the admin dashboard the same way.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{
    Achievement, BlogPost, ExperienceItem, LeadStatus, PostStatus, Project, Service, Skill,
    SkillCategory, Testimonial,
};
use crate::sync::Snapshot;

/// Months covered by the dashboard activity chart
pub const ACTIVITY_MONTHS: usize = 6;

/// Visible projects, featured first, otherwise in store order
pub fn public_projects(snapshot: &Snapshot) -> Vec<&Project> {
    let mut projects: Vec<&Project> = snapshot.projects.iter().filter(|p| p.visible).collect();
    // sort_by_key is stable
    projects.sort_by_key(|p| !p.featured);
    projects
}

pub fn visible_experience(snapshot: &Snapshot) -> Vec<&ExperienceItem> {
    snapshot.experience.iter().filter(|e| e.visible).collect()
}

pub fn visible_services(snapshot: &Snapshot) -> Vec<&Service> {
    snapshot.services.iter().filter(|s| s.visible).collect()
}

pub fn visible_achievements(snapshot: &Snapshot) -> Vec<&Achievement> {
    snapshot.achievements.iter().filter(|a| a.visible).collect()
}

pub fn visible_testimonials(snapshot: &Snapshot) -> Vec<&Testimonial> {
    snapshot.testimonials.iter().filter(|t| t.visible).collect()
}

pub fn published_blogs(snapshot: &Snapshot) -> Vec<&BlogPost> {
    snapshot
        .blogs
        .iter()
        .filter(|b| b.status == PostStatus::Published)
        .collect()
}

/// Skills grouped by category in display order; empty groups are omitted
pub fn skills_by_category(snapshot: &Snapshot) -> Vec<(SkillCategory, Vec<&Skill>)> {
    SkillCategory::ALL
        .iter()
        .map(|&category| {
            let skills = snapshot
                .skills
                .iter()
                .filter(|s| s.category == category)
                .collect::<Vec<_>>();
            (category, skills)
        })
        .filter(|(_, skills)| !skills.is_empty())
        .collect()
}

/// Headline numbers for the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_views: u64,
    pub lead_count: usize,
    pub new_leads: usize,
    pub visible_projects: usize,
}

impl DashboardStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            total_views: snapshot.blogs.iter().map(|b| b.views).sum(),
            lead_count: snapshot.leads.len(),
            new_leads: snapshot
                .leads
                .iter()
                .filter(|l| l.status == LeadStatus::New)
                .count(),
            visible_projects: snapshot.projects.iter().filter(|p| p.visible).count(),
        }
    }
}

/// Leads and posts dated within one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityBucket {
    /// `YYYY-MM`
    pub month: String,
    pub leads: usize,
    pub posts: usize,
}

/// Activity for the last [`ACTIVITY_MONTHS`] months up to `today`, oldest first
pub fn monthly_activity(snapshot: &Snapshot, today: NaiveDate) -> Vec<ActivityBucket> {
    let mut year = today.year();
    let mut month = today.month();
    let mut months = Vec::with_capacity(ACTIVITY_MONTHS);
    for _ in 0..ACTIVITY_MONTHS {
        months.push(format!("{:04}-{:02}", year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    months.reverse();

    months
        .into_iter()
        .map(|month| ActivityBucket {
            leads: snapshot
                .leads
                .iter()
                .filter(|l| l.date.starts_with(&month))
                .count(),
            posts: snapshot
                .blogs
                .iter()
                .filter(|b| b.date.starts_with(&month))
                .count(),
            month,
        })
        .collect()
}

/// Contact-form message prefilled from a service card
pub fn service_inquiry_message(service: &Service) -> String {
    format!(
        "Hi, I'm interested in your {} service. I'd like to discuss a potential project.",
        service.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_skills;
    use crate::models::Lead;

    fn project(title: &str, visible: bool, featured: bool) -> Project {
        Project {
            title: title.into(),
            visible,
            featured,
            ..Project::default()
        }
    }

    #[test]
    fn test_hidden_projects_are_not_public() {
        let mut snapshot = Snapshot::loading();
        snapshot.projects = vec![
            project("a", true, false),
            project("b", false, false),
            project("c", false, true),
        ];
        let public = public_projects(&snapshot);
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].title, "a");
    }

    #[test]
    fn test_featured_first_keeps_order() {
        let mut snapshot = Snapshot::loading();
        snapshot.projects = vec![
            project("a", true, false),
            project("b", true, true),
            project("c", true, false),
        ];
        let titles: Vec<_> = public_projects(&snapshot)
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, ["b", "a", "c"]);
    }

    #[test]
    fn test_skills_grouped_in_category_order() {
        let mut snapshot = Snapshot::loading();
        snapshot.skills = default_skills();
        snapshot.skills.push(Skill::new("Figma", SkillCategory::Tools, 50));

        let groups = skills_by_category(&snapshot);
        let categories: Vec<_> = groups.iter().map(|(c, _)| *c).collect();
        let mut sorted = categories.clone();
        sorted.sort_by_key(|c| SkillCategory::ALL.iter().position(|x| x == c));
        assert_eq!(categories, sorted);
        let total: usize = groups.iter().map(|(_, s)| s.len()).sum();
        assert_eq!(total, snapshot.skills.len());
    }

    #[test]
    fn test_dashboard_stats() {
        let mut snapshot = Snapshot::loading();
        snapshot.blogs = vec![
            BlogPost {
                views: 10,
                ..BlogPost::default()
            },
            BlogPost {
                views: 5,
                ..BlogPost::default()
            },
        ];
        snapshot.leads = vec![
            Lead::default(),
            Lead {
                status: LeadStatus::Read,
                ..Lead::default()
            },
        ];
        snapshot.projects = vec![project("a", true, false), project("b", false, false)];

        let stats = DashboardStats::from_snapshot(&snapshot);
        assert_eq!(stats.total_views, 15);
        assert_eq!(stats.lead_count, 2);
        assert_eq!(stats.new_leads, 1);
        assert_eq!(stats.visible_projects, 1);
    }

    #[test]
    fn test_activity_spans_year_boundary() {
        let mut snapshot = Snapshot::loading();
        snapshot.leads = vec![
            Lead {
                date: "2025-12-24".into(),
                ..Lead::default()
            },
            Lead {
                date: "2024-12-01".into(),
                ..Lead::default()
            },
        ];
        snapshot.blogs = vec![BlogPost {
            date: "2026-02-10".into(),
            ..BlogPost::default()
        }];

        let today = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let buckets = monthly_activity(&snapshot, today);
        let months: Vec<_> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(
            months,
            ["2025-09", "2025-10", "2025-11", "2025-12", "2026-01", "2026-02"]
        );
        assert_eq!(buckets[3].leads, 1);
        assert_eq!(buckets[5].posts, 1);
        assert_eq!(buckets.iter().map(|b| b.leads).sum::<usize>(), 1);
    }

    #[test]
    fn test_published_blogs_only() {
        let mut snapshot = Snapshot::loading();
        snapshot.blogs = vec![
            BlogPost {
                status: PostStatus::Published,
                ..BlogPost::default()
            },
            BlogPost::default(),
        ];
        assert_eq!(published_blogs(&snapshot).len(), 1);
    }

    #[test]
    fn test_service_inquiry() {
        let service = Service {
            title: "Cloud Migration".into(),
            ..Service::default()
        };
        assert!(service_inquiry_message(&service).contains("your Cloud Migration service"));
    }
}
