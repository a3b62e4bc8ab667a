//! Data models for Folio
//!
//! In-memory read model of every content collection. Field names follow the
//! camelCase convention when serialized; the persisted snake_case shape lives
//! in [`crate::mapping`].

use serde::{Deserialize, Serialize};

/// A portfolio project
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub category: String,
    /// Short card description
    pub description: String,
    /// Long-form description shown in the detail view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    pub image: String,
    pub tech_stack: Vec<String>,
    pub demo_link: String,
    pub github_link: String,
    pub featured: bool,
    pub visible: bool,
}

/// Kind of experience entry
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    #[default]
    Work,
    Education,
    Hackathon,
}

impl ExperienceKind {
    /// Parse a stored tag, defaulting to `Work` for anything unknown
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "education" => Self::Education,
            "hackathon" => Self::Hackathon,
            _ => Self::Work,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Education => "education",
            Self::Hackathon => "hackathon",
        }
    }
}

/// A work, education or hackathon entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceItem {
    pub id: String,
    pub role: String,
    pub company: String,
    /// Free-form label such as "2022 - Present"
    pub period: String,
    /// Bullet points, in display order
    pub description: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ExperienceKind,
    pub visible: bool,
}

/// Skill grouping
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkillCategory {
    Frontend,
    Backend,
    Cloud,
    #[serde(rename = "AI/ML")]
    AiMl,
    Tools,
}

impl SkillCategory {
    /// Display order used when grouping skills
    pub const ALL: [SkillCategory; 5] = [
        SkillCategory::Frontend,
        SkillCategory::Backend,
        SkillCategory::Cloud,
        SkillCategory::AiMl,
        SkillCategory::Tools,
    ];

    /// Parse a stored tag, defaulting to `Tools` for anything unknown
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "frontend" => Self::Frontend,
            "backend" => Self::Backend,
            "cloud" => Self::Cloud,
            "ai/ml" | "ai" | "ml" => Self::AiMl,
            _ => Self::Tools,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "Frontend",
            Self::Backend => "Backend",
            Self::Cloud => "Cloud",
            Self::AiMl => "AI/ML",
            Self::Tools => "Tools",
        }
    }
}

/// A skill with proficiency level
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    /// Built-in default skills have no id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub category: SkillCategory,
    /// Proficiency, 0-100
    pub level: u8,
}

impl Skill {
    pub fn new(name: impl Into<String>, category: SkillCategory, level: u8) -> Self {
        Self {
            id: None,
            name: name.into(),
            category,
            level: level.min(100),
        }
    }
}

/// A service offered by the agency
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub description: String,
    /// Icon name understood by the front end
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_start: Option<String>,
    pub features: Vec<String>,
    pub visible: bool,
}

/// Kind of achievement
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AchievementKind {
    Award,
    #[default]
    Certificate,
    Hackathon,
}

impl AchievementKind {
    /// Parse a stored tag, defaulting to `Certificate` for anything unknown
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "award" => Self::Award,
            "hackathon" => Self::Hackathon,
            _ => Self::Certificate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Award => "Award",
            Self::Certificate => "Certificate",
            Self::Hackathon => "Hackathon",
        }
    }
}

/// An award, certificate or hackathon result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub issuer: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub visible: bool,
}

/// Publication state of a blog post
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("published") {
            Self::Published
        } else {
            Self::Draft
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

/// A blog post
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    /// Markdown body
    pub content: String,
    pub cover_image: String,
    /// Publish date, `YYYY-MM-DD`
    pub date: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub views: u64,
}

/// A client review
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub client_name: String,
    pub company: String,
    pub image: String,
    pub review: String,
    /// 1-5
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub visible: bool,
}

/// Inbox state of a lead
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Read,
    Replied,
    Converted,
}

impl LeadStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "read" => Self::Read,
            "replied" => Self::Replied,
            "converted" => Self::Converted,
            _ => Self::New,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Replied => "replied",
            Self::Converted => "converted",
        }
    }

    /// Inbox toggle: `new` becomes `read`, everything else becomes `new`
    pub fn toggled(&self) -> Self {
        match self {
            Self::New => Self::Read,
            _ => Self::New,
        }
    }
}

/// A contact-form submission
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    /// Submission date, `YYYY-MM-DD`
    pub date: String,
    pub status: LeadStatus,
    pub source: String,
}

/// Colour theme of the public site
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Singleton site-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    /// Store row id; `None` when running on built-in defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub contact_email: String,
    pub github_url: String,
    pub linkedin_url: String,
    pub resume_url: String,
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing_is_lenient() {
        assert_eq!(ExperienceKind::parse("Education"), ExperienceKind::Education);
        assert_eq!(ExperienceKind::parse("volunteer"), ExperienceKind::Work);
        assert_eq!(SkillCategory::parse("AI/ML"), SkillCategory::AiMl);
        assert_eq!(SkillCategory::parse("design"), SkillCategory::Tools);
        assert_eq!(AchievementKind::parse("award"), AchievementKind::Award);
        assert_eq!(PostStatus::parse("PUBLISHED"), PostStatus::Published);
        assert_eq!(PostStatus::parse(""), PostStatus::Draft);
        assert_eq!(LeadStatus::parse("converted"), LeadStatus::Converted);
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse("neon"), None);
    }

    #[test]
    fn test_lead_status_toggle() {
        assert_eq!(LeadStatus::New.toggled(), LeadStatus::Read);
        assert_eq!(LeadStatus::Read.toggled(), LeadStatus::New);
        assert_eq!(LeadStatus::Replied.toggled(), LeadStatus::New);
    }

    #[test]
    fn test_skill_level_is_clamped() {
        let skill = Skill::new("Rust", SkillCategory::Backend, 250);
        assert_eq!(skill.level, 100);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let project = Project {
            full_description: Some("long".to_string()),
            ..Project::default()
        };
        let value = serde_json::to_value(&project).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("techStack"));
        assert!(obj.contains_key("fullDescription"));
        assert!(!obj.contains_key("tech_stack"));
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let item = ExperienceItem {
            kind: ExperienceKind::Hackathon,
            ..ExperienceItem::default()
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "hackathon");
        let cat = serde_json::to_value(SkillCategory::AiMl).unwrap();
        assert_eq!(cat, "AI/ML");
    }
}
