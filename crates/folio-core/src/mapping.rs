//! Persisted record <-> model mapping
//!
//! The hosted store keeps snake_case columns; the read model uses camelCase.
//! Every `*_from_record` function is pure and total: missing or mistyped
//! fields fall back to empty values instead of failing, so one malformed row
//! never takes down a whole collection.
//!
//! The `*_to_record` functions build mutation payloads. They never include
//! `id`; the store assigns it and updates address rows by id separately.

use serde_json::{json, Map, Value};

use crate::defaults;
use crate::models::{
    Achievement, AchievementKind, BlogPost, ExperienceItem, ExperienceKind, Lead, LeadStatus,
    PostStatus, Project, Service, SiteSettings, Skill, SkillCategory, Testimonial, Theme,
};

/// Column names used by the hosted store
pub mod keys {
    pub const ID: &str = "id";
    pub const CREATED_AT: &str = "created_at";
    pub const TITLE: &str = "title";
    pub const CATEGORY: &str = "category";
    pub const DESCRIPTION: &str = "description";
    pub const FULL_DESCRIPTION: &str = "full_description";
    pub const IMAGE: &str = "image";
    pub const TECH_STACK: &str = "tech_stack";
    pub const DEMO_LINK: &str = "demo_link";
    pub const GITHUB_LINK: &str = "github_link";
    pub const FEATURED: &str = "featured";
    pub const VISIBLE: &str = "visible";
    pub const ROLE: &str = "role";
    pub const COMPANY: &str = "company";
    pub const PERIOD: &str = "period";
    pub const TYPE: &str = "type";
    pub const NAME: &str = "name";
    pub const LEVEL: &str = "level";
    pub const TAGLINE: &str = "tagline";
    pub const ICON: &str = "icon";
    pub const PRICE_START: &str = "price_start";
    pub const FEATURES: &str = "features";
    pub const ISSUER: &str = "issuer";
    pub const DATE: &str = "date";
    pub const EXCERPT: &str = "excerpt";
    pub const CONTENT: &str = "content";
    pub const COVER_IMAGE: &str = "cover_image";
    pub const TAGS: &str = "tags";
    pub const STATUS: &str = "status";
    pub const VIEWS: &str = "views";
    pub const CLIENT_NAME: &str = "client_name";
    pub const REVIEW: &str = "review";
    pub const RATING: &str = "rating";
    pub const PROJECT: &str = "project";
    pub const EMAIL: &str = "email";
    pub const MESSAGE: &str = "message";
    pub const SOURCE: &str = "source";
    pub const HERO_TITLE: &str = "hero_title";
    pub const HERO_SUBTITLE: &str = "hero_subtitle";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const GITHUB_URL: &str = "github_url";
    pub const LINKEDIN_URL: &str = "linkedin_url";
    pub const RESUME_URL: &str = "resume_url";
    pub const THEME: &str = "theme";
}

/// Lead source recorded for contact-form submissions
pub const CONTACT_FORM_SOURCE: &str = "contact_form";

/// Read-only view over one raw record
struct Fields<'a>(Option<&'a Map<String, Value>>);

impl<'a> Fields<'a> {
    fn of(record: &'a Value) -> Self {
        Self(record.as_object())
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|m| m.get(key)).filter(|v| !v.is_null())
    }

    /// String field; numbers are stringified so integer ids survive
    fn opt_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn str(&self, key: &str) -> String {
        self.opt_str(key).unwrap_or_default()
    }

    /// Optional text where an empty string means "not set"
    fn opt_text(&self, key: &str) -> Option<String> {
        self.opt_str(key).filter(|s| !s.is_empty())
    }

    fn bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
            _ => false,
        }
    }

    fn i64(&self, key: &str) -> i64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Ordered string list; a comma-separated string is accepted too
    fn strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => {
                s.split(',').map(|p| p.trim().to_string()).collect()
            }
            _ => Vec::new(),
        }
    }
}

pub fn project_from_record(record: &Value) -> Project {
    let f = Fields::of(record);
    Project {
        id: f.str(keys::ID),
        title: f.str(keys::TITLE),
        category: f.str(keys::CATEGORY),
        description: f.str(keys::DESCRIPTION),
        full_description: f.opt_text(keys::FULL_DESCRIPTION),
        image: f.str(keys::IMAGE),
        tech_stack: f.strings(keys::TECH_STACK),
        demo_link: f.str(keys::DEMO_LINK),
        github_link: f.str(keys::GITHUB_LINK),
        featured: f.bool(keys::FEATURED),
        visible: f.bool(keys::VISIBLE),
    }
}

pub fn project_to_record(project: &Project) -> Value {
    record([
        (keys::TITLE, json!(project.title)),
        (keys::CATEGORY, json!(project.category)),
        (keys::DESCRIPTION, json!(project.description)),
        (keys::FULL_DESCRIPTION, json!(project.full_description)),
        (keys::IMAGE, json!(project.image)),
        (keys::TECH_STACK, json!(project.tech_stack)),
        (keys::DEMO_LINK, json!(project.demo_link)),
        (keys::GITHUB_LINK, json!(project.github_link)),
        (keys::FEATURED, json!(project.featured)),
        (keys::VISIBLE, json!(project.visible)),
    ])
}

pub fn experience_from_record(record: &Value) -> ExperienceItem {
    let f = Fields::of(record);
    ExperienceItem {
        id: f.str(keys::ID),
        role: f.str(keys::ROLE),
        company: f.str(keys::COMPANY),
        period: f.str(keys::PERIOD),
        description: f.strings(keys::DESCRIPTION),
        kind: ExperienceKind::parse(&f.str(keys::TYPE)),
        visible: f.bool(keys::VISIBLE),
    }
}

pub fn experience_to_record(item: &ExperienceItem) -> Value {
    record([
        (keys::ROLE, json!(item.role)),
        (keys::COMPANY, json!(item.company)),
        (keys::PERIOD, json!(item.period)),
        (keys::DESCRIPTION, json!(item.description)),
        (keys::TYPE, json!(item.kind.as_str())),
        (keys::VISIBLE, json!(item.visible)),
    ])
}

pub fn skill_from_record(record: &Value) -> Skill {
    let f = Fields::of(record);
    Skill {
        id: f.opt_text(keys::ID),
        name: f.str(keys::NAME),
        category: SkillCategory::parse(&f.str(keys::CATEGORY)),
        level: f.i64(keys::LEVEL).clamp(0, 100) as u8,
    }
}

pub fn skill_to_record(skill: &Skill) -> Value {
    record([
        (keys::NAME, json!(skill.name)),
        (keys::CATEGORY, json!(skill.category.as_str())),
        (keys::LEVEL, json!(skill.level.min(100))),
    ])
}

pub fn service_from_record(record: &Value) -> Service {
    let f = Fields::of(record);
    Service {
        id: f.str(keys::ID),
        title: f.str(keys::TITLE),
        tagline: f.opt_text(keys::TAGLINE),
        description: f.str(keys::DESCRIPTION),
        icon: f.str(keys::ICON),
        price_start: f.opt_text(keys::PRICE_START),
        features: f.strings(keys::FEATURES),
        visible: f.bool(keys::VISIBLE),
    }
}

pub fn service_to_record(service: &Service) -> Value {
    record([
        (keys::TITLE, json!(service.title)),
        (keys::TAGLINE, json!(service.tagline)),
        (keys::DESCRIPTION, json!(service.description)),
        (keys::ICON, json!(service.icon)),
        (keys::PRICE_START, json!(service.price_start)),
        (keys::FEATURES, json!(service.features)),
        (keys::VISIBLE, json!(service.visible)),
    ])
}

pub fn achievement_from_record(record: &Value) -> Achievement {
    let f = Fields::of(record);
    Achievement {
        id: f.str(keys::ID),
        title: f.str(keys::TITLE),
        issuer: f.str(keys::ISSUER),
        date: f.str(keys::DATE),
        kind: AchievementKind::parse(&f.str(keys::TYPE)),
        image: f.opt_text(keys::IMAGE),
        visible: f.bool(keys::VISIBLE),
    }
}

pub fn achievement_to_record(achievement: &Achievement) -> Value {
    record([
        (keys::TITLE, json!(achievement.title)),
        (keys::ISSUER, json!(achievement.issuer)),
        (keys::DATE, json!(achievement.date)),
        (keys::TYPE, json!(achievement.kind.as_str())),
        (keys::IMAGE, json!(achievement.image)),
        (keys::VISIBLE, json!(achievement.visible)),
    ])
}

pub fn blog_from_record(record: &Value) -> BlogPost {
    let f = Fields::of(record);
    BlogPost {
        id: f.str(keys::ID),
        title: f.str(keys::TITLE),
        excerpt: f.str(keys::EXCERPT),
        content: f.str(keys::CONTENT),
        cover_image: f.str(keys::COVER_IMAGE),
        date: f.str(keys::DATE),
        tags: f.strings(keys::TAGS),
        status: PostStatus::parse(&f.str(keys::STATUS)),
        views: f.i64(keys::VIEWS).max(0) as u64,
    }
}

pub fn blog_to_record(post: &BlogPost) -> Value {
    record([
        (keys::TITLE, json!(post.title)),
        (keys::EXCERPT, json!(post.excerpt)),
        (keys::CONTENT, json!(post.content)),
        (keys::COVER_IMAGE, json!(post.cover_image)),
        (keys::DATE, json!(post.date)),
        (keys::TAGS, json!(post.tags)),
        (keys::STATUS, json!(post.status.as_str())),
        (keys::VIEWS, json!(post.views)),
    ])
}

pub fn testimonial_from_record(record: &Value) -> Testimonial {
    let f = Fields::of(record);
    Testimonial {
        id: f.str(keys::ID),
        client_name: f.str(keys::CLIENT_NAME),
        company: f.str(keys::COMPANY),
        image: f.str(keys::IMAGE),
        review: f.str(keys::REVIEW),
        rating: f.i64(keys::RATING).clamp(1, 5) as u8,
        project: f.opt_text(keys::PROJECT),
        visible: f.bool(keys::VISIBLE),
    }
}

pub fn testimonial_to_record(testimonial: &Testimonial) -> Value {
    record([
        (keys::CLIENT_NAME, json!(testimonial.client_name)),
        (keys::COMPANY, json!(testimonial.company)),
        (keys::IMAGE, json!(testimonial.image)),
        (keys::REVIEW, json!(testimonial.review)),
        (keys::RATING, json!(testimonial.rating.clamp(1, 5))),
        (keys::PROJECT, json!(testimonial.project)),
        (keys::VISIBLE, json!(testimonial.visible)),
    ])
}

pub fn lead_from_record(record: &Value) -> Lead {
    let f = Fields::of(record);
    Lead {
        id: f.str(keys::ID),
        name: f.str(keys::NAME),
        email: f.str(keys::EMAIL),
        message: f.str(keys::MESSAGE),
        date: f.str(keys::DATE),
        status: LeadStatus::parse(&f.str(keys::STATUS)),
        source: f
            .opt_text(keys::SOURCE)
            .unwrap_or_else(|| CONTACT_FORM_SOURCE.to_string()),
    }
}

pub fn lead_to_record(lead: &Lead) -> Value {
    record([
        (keys::NAME, json!(lead.name)),
        (keys::EMAIL, json!(lead.email)),
        (keys::MESSAGE, json!(lead.message)),
        (keys::DATE, json!(lead.date)),
        (keys::STATUS, json!(lead.status.as_str())),
        (keys::SOURCE, json!(lead.source)),
    ])
}

/// Settings row to model; every empty field takes its built-in default
pub fn settings_from_record(record: &Value) -> SiteSettings {
    let f = Fields::of(record);
    let or_default = |key: &str, fallback: &str| {
        f.opt_text(key).unwrap_or_else(|| fallback.to_string())
    };
    SiteSettings {
        id: f.opt_text(keys::ID),
        hero_title: or_default(keys::HERO_TITLE, defaults::HERO_TITLE),
        hero_subtitle: or_default(keys::HERO_SUBTITLE, defaults::HERO_SUBTITLE),
        contact_email: or_default(keys::CONTACT_EMAIL, defaults::CONTACT_EMAIL),
        github_url: or_default(keys::GITHUB_URL, defaults::GITHUB_URL),
        linkedin_url: or_default(keys::LINKEDIN_URL, defaults::LINKEDIN_URL),
        resume_url: or_default(keys::RESUME_URL, defaults::RESUME_URL),
        theme: f
            .opt_text(keys::THEME)
            .and_then(|t| Theme::parse(&t))
            .unwrap_or_default(),
    }
}

pub fn settings_to_record(settings: &SiteSettings) -> Value {
    record([
        (keys::HERO_TITLE, json!(settings.hero_title)),
        (keys::HERO_SUBTITLE, json!(settings.hero_subtitle)),
        (keys::CONTACT_EMAIL, json!(settings.contact_email)),
        (keys::GITHUB_URL, json!(settings.github_url)),
        (keys::LINKEDIN_URL, json!(settings.linkedin_url)),
        (keys::RESUME_URL, json!(settings.resume_url)),
        (keys::THEME, json!(settings.theme.as_str())),
    ])
}

fn record<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

/// Map a whole collection with one of the `*_from_record` functions
pub fn map_all<T>(records: &[Value], map: fn(&Value) -> T) -> Vec<T> {
    records.iter().map(map).collect()
}
