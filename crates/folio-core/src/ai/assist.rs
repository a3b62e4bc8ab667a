//! Admin writing assists
//!
//! Blog drafting, lead replies, tech-stack suggestions, writing polish and
//! resume extraction. Suggestions and polish degrade to a neutral result on
//! failure; drafting and resume parsing report the error.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::warn;

use super::client::{AiError, GenerateRequest, TextGenerator};
use crate::models::{
    Achievement, AchievementKind, ExperienceItem, ExperienceKind, Lead, Project, SiteSettings,
};

/// Maximum number of suggested technologies
pub const MAX_TECH_SUGGESTIONS: usize = 5;

const PLACEHOLDER_IMAGE: &str = "https://picsum.photos/800/600";
const PLACEHOLDER_LINK: &str = "#";

/// Draft a markdown blog post body for `title`
pub async fn generate_blog_post(
    generator: &dyn TextGenerator,
    title: &str,
    tags: &[String],
) -> Result<String, AiError> {
    let prompt = format!(
        "Write a comprehensive, engaging, and technical blog post with the title: \"{}\".\n\
         Tags/Topics: {}.\n\n\
         Requirements:\n\
         - Use Markdown formatting (## Headers, **bold**, code blocks, lists).\n\
         - Tone: Professional, authoritative, yet accessible (Developer focused).\n\
         - Structure: Introduction, 3-4 Key Sections with technical depth, Conclusion.\n\
         - Length: Approximately 400-600 words.\n\
         - Do NOT include the title in the body (it will be rendered separately).",
        title,
        tags.join(", ")
    );
    generator.generate(GenerateRequest::new(prompt)).await
}

/// Draft a reply to a contact-form lead, signed by `signer`
pub async fn draft_email_reply(
    generator: &dyn TextGenerator,
    lead: &Lead,
    signer: &str,
) -> Result<String, AiError> {
    let prompt = format!(
        "Draft a professional, friendly, and persuasive email reply to a potential client.\n\n\
         Client Name: {}\n\
         Client Message: \"{}\"\n\n\
         My Role: {}.\n\n\
         Requirements:\n\
         - Acknowledge their specific needs based on the message.\n\
         - Propose a brief call to discuss details.\n\
         - Tone: Professional, confident, but approachable.\n\
         - No placeholders like [Date], just say \"at your earliest convenience\".\n\
         - Sign off with my name.",
        lead.name, lead.message, signer
    );
    generator.generate(GenerateRequest::new(prompt)).await
}

/// Suggest up to five technologies for a project description
///
/// Returns an empty list when generation fails.
pub async fn suggest_tech_stack(generator: &dyn TextGenerator, description: &str) -> Vec<String> {
    let prompt = format!(
        "Based on the following project description, suggest a list of relevant modern \
         technologies (Tech Stack) used to build it.\n\
         Description: \"{}\"\n\n\
         Return ONLY a comma-separated list of technologies. E.g. \"React, Node.js, Firebase\".\n\
         Max {} items.",
        description, MAX_TECH_SUGGESTIONS
    );
    match generator.generate(GenerateRequest::new(prompt)).await {
        Ok(text) => parse_tech_list(&text),
        Err(e) => {
            warn!("Tech stack suggestion failed: {}", e);
            Vec::new()
        }
    }
}

fn parse_tech_list(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '.' || c == '*' || c == '-'))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .take(MAX_TECH_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

/// Rewrite bullet points to sound more impactful
///
/// Returns `text` unchanged when generation fails.
pub async fn improve_writing(generator: &dyn TextGenerator, text: &str) -> String {
    let prompt = format!(
        "Rewrite the following job description bullet points to be more professional, \
         impactful, and results-oriented (using the STAR method where possible).\n\
         Keep the meaning but make it sound impressive for a resume/portfolio.\n\n\
         Input:\n\"{}\"\n\n\
         Return ONLY the rewritten text, preserving the bullet point format (one item per line).",
        text
    );
    match generator.generate(GenerateRequest::new(prompt)).await {
        Ok(rewritten) => rewritten,
        Err(e) => {
            warn!("Writing improvement failed: {}", e);
            text.to_string()
        }
    }
}

/// Strip markdown code fences wrapped around a JSON answer
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Personal details pulled from a resume
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub email: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeExperience {
    pub role: String,
    pub company: String,
    pub period: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "string_or_list")]
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeProject {
    pub title: String,
    pub category: String,
    pub description: String,
    pub full_description: String,
    #[serde(deserialize_with = "string_or_list")]
    pub tech_stack: Vec<String>,
    pub demo_link: String,
    pub github_link: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeAchievement {
    pub title: String,
    pub issuer: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Structured content extracted from a resume
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeExtract {
    pub personal_info: Option<PersonalInfo>,
    pub experience: Vec<ResumeExperience>,
    pub projects: Vec<ResumeProject>,
    pub achievements: Vec<ResumeAchievement>,
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.trim().to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ResumeExtract {
    /// Experience entries ready to insert, visible by default
    pub fn experience_items(&self) -> Vec<ExperienceItem> {
        self.experience
            .iter()
            .map(|e| ExperienceItem {
                id: String::new(),
                role: or(&e.role, "Unknown Role"),
                company: or(&e.company, "Unknown Company"),
                period: or(&e.period, "Unknown Dates"),
                description: if e.description.is_empty() {
                    vec![String::new()]
                } else {
                    e.description.clone()
                },
                kind: ExperienceKind::parse(&e.kind),
                visible: true,
            })
            .collect()
    }

    /// Projects ready to insert, visible and not featured
    pub fn project_items(&self) -> Vec<Project> {
        self.projects
            .iter()
            .map(|p| {
                let full = if p.full_description.trim().is_empty() {
                    p.description.clone()
                } else {
                    p.full_description.clone()
                };
                Project {
                    id: String::new(),
                    title: or(&p.title, "Untitled Project"),
                    category: or(&p.category, "Development"),
                    description: p.description.clone(),
                    full_description: Some(full),
                    image: PLACEHOLDER_IMAGE.to_string(),
                    tech_stack: p.tech_stack.clone(),
                    demo_link: or(&p.demo_link, PLACEHOLDER_LINK),
                    github_link: or(&p.github_link, PLACEHOLDER_LINK),
                    featured: false,
                    visible: true,
                }
            })
            .collect()
    }

    /// Achievements ready to insert; undated ones get the current year
    pub fn achievement_items(&self) -> Vec<Achievement> {
        let this_year = Utc::now().year().to_string();
        self.achievements
            .iter()
            .map(|a| Achievement {
                id: String::new(),
                title: or(&a.title, "Untitled Achievement"),
                issuer: or(&a.issuer, "Unknown Issuer"),
                date: or(&a.date, &this_year),
                kind: AchievementKind::parse(&a.kind),
                image: None,
                visible: true,
            })
            .collect()
    }

    /// `current` with extracted personal details applied, if any were found
    pub fn merged_settings(&self, current: &SiteSettings) -> Option<SiteSettings> {
        let info = self.personal_info.as_ref()?;
        let mut settings = current.clone();
        if let Some(v) = non_empty(&info.hero_title) {
            settings.hero_title = v.to_string();
        }
        if let Some(v) = non_empty(&info.hero_subtitle) {
            settings.hero_subtitle = v.to_string();
        }
        if let Some(v) = non_empty(&info.email) {
            settings.contact_email = v.to_string();
        }
        if let Some(v) = non_empty(&info.github) {
            settings.github_url = v.to_string();
        }
        if let Some(v) = non_empty(&info.linkedin) {
            settings.linkedin_url = v.to_string();
        }
        Some(settings)
    }

    pub fn is_empty(&self) -> bool {
        self.personal_info.is_none()
            && self.experience.is_empty()
            && self.projects.is_empty()
            && self.achievements.is_empty()
    }
}

/// Output schema the model must follow when reading a resume
pub fn resume_schema() -> Value {
    let string = json!({ "type": "STRING" });
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "personalInfo": {
                "type": "OBJECT",
                "properties": {
                    "heroTitle": { "type": "STRING", "description": "Professional title, e.g., Full Stack Developer" },
                    "heroSubtitle": { "type": "STRING", "description": "Short 1-sentence bio or summary" },
                    "email": string,
                    "github": string,
                    "linkedin": string
                }
            },
            "experience": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "role": string,
                        "company": string,
                        "period": { "type": "STRING", "description": "e.g., 2023 - Present" },
                        "type": { "type": "STRING", "description": "Must be one of: work, education, hackathon" },
                        "description": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "List of bullet points describing responsibilities"
                        }
                    }
                }
            },
            "projects": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string,
                        "category": { "type": "STRING", "description": "e.g. Web Dev, AI/ML, Mobile App" },
                        "description": { "type": "STRING", "description": "Short summary for cards (max 100 chars)" },
                        "fullDescription": { "type": "STRING", "description": "Detailed description of the project" },
                        "techStack": strings,
                        "demoLink": string,
                        "githubLink": string
                    }
                }
            },
            "achievements": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string,
                        "issuer": string,
                        "date": string,
                        "type": { "type": "STRING", "description": "Certificate, Award, or Hackathon" }
                    }
                }
            }
        }
    })
}

/// Extract structured portfolio content from a resume document
pub async fn parse_resume(
    generator: &dyn TextGenerator,
    document: Vec<u8>,
    mime_type: &str,
) -> Result<ResumeExtract, AiError> {
    let prompt = "Analyze the attached resume document.\n\
                  Extract the work experience, projects, skills/achievements, and personal details.\n\
                  Map them strictly to the JSON schema provided.\n\n\
                  - For 'experience.type', infer if it is 'work', 'education' or 'hackathon' based on context.\n\
                  - For 'projects.techStack', extract list of technologies used.\n\
                  - If a field is missing, leave it as an empty string or empty array.";

    let request = GenerateRequest::new(prompt)
        .with_attachment(mime_type, document)
        .with_schema(resume_schema());
    let text = generator.generate(request).await?;
    let json = strip_code_fences(&text);
    if json.is_empty() {
        return Err(AiError::Empty);
    }
    serde_json::from_str(&json).map_err(|e| AiError::Malformed(e.to_string()))
}
