//! Built-in content used when the store has nothing to offer

use crate::models::{SiteSettings, Skill, SkillCategory, Theme};

pub const HERO_TITLE: &str = "Full-Stack Developer | AI Enthusiast";
pub const HERO_SUBTITLE: &str = "Founder of HyperBuild Labs";
pub const CONTACT_EMAIL: &str = "contact@veerendra.dev";
pub const GITHUB_URL: &str = "https://github.com";
pub const LINKEDIN_URL: &str = "https://linkedin.com";
pub const RESUME_URL: &str = "/resume.pdf";

/// Skills shown when the skills table is empty or unreachable
pub fn default_skills() -> Vec<Skill> {
    vec![
        Skill::new("React/Next.js", SkillCategory::Frontend, 95),
        Skill::new("TypeScript", SkillCategory::Frontend, 90),
        Skill::new("Tailwind CSS", SkillCategory::Frontend, 95),
        Skill::new("Node.js", SkillCategory::Backend, 85),
        Skill::new("Python", SkillCategory::Backend, 80),
        Skill::new("PostgreSQL", SkillCategory::Backend, 80),
        Skill::new("TensorFlow", SkillCategory::AiMl, 70),
        Skill::new("Gemini API", SkillCategory::AiMl, 90),
        Skill::new("AWS", SkillCategory::Cloud, 75),
        Skill::new("Docker", SkillCategory::Cloud, 80),
    ]
}

/// Settings used when the settings row is missing
pub fn default_settings() -> SiteSettings {
    SiteSettings {
        id: None,
        hero_title: HERO_TITLE.to_string(),
        hero_subtitle: HERO_SUBTITLE.to_string(),
        contact_email: CONTACT_EMAIL.to_string(),
        github_url: GITHUB_URL.to_string(),
        linkedin_url: LINKEDIN_URL.to_string(),
        resume_url: RESUME_URL.to_string(),
        theme: Theme::Dark,
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        default_settings()
    }
}
