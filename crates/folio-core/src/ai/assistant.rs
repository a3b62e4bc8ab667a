//! Visitor-facing chat assistant
//!
//! Answers questions about the portfolio using a bounded summary of the
//! current snapshot. `ask` never fails: every failure maps to a fixed reply.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use super::client::{AiError, GenerateRequest, TextGenerator};
use crate::sync::Snapshot;

pub const NO_KEY_REPLY: &str = "I'm sorry, my AI brain isn't connected right now (API Key missing). Please use the contact form to reach out directly!";
pub const SERVICE_ERROR_REPLY: &str =
    "I'm currently experiencing high traffic. Please try again later.";
pub const EMPTY_REPLY: &str = "I couldn't generate a response.";

/// Items per section included in the context
const MAX_ITEMS: usize = 12;
/// Characters kept from any single free-text field
const MAX_TEXT: usize = 160;

/// Chat assistant over an optional generator
///
/// Without a generator (no API key configured) every answer is the fixed
/// "not connected" reply.
#[derive(Clone)]
pub struct ChatAssistant {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ChatAssistant {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn is_connected(&self) -> bool {
        self.generator.is_some()
    }

    /// Answer `question` with the snapshot as context
    pub async fn ask(&self, question: &str, snapshot: &Snapshot) -> String {
        let Some(ref generator) = self.generator else {
            return NO_KEY_REPLY.to_string();
        };

        let request = GenerateRequest::new(question).with_system(system_prompt(snapshot));
        match generator.generate(request).await {
            Ok(text) => text,
            Err(AiError::Empty) => EMPTY_REPLY.to_string(),
            Err(AiError::MissingApiKey) => NO_KEY_REPLY.to_string(),
            Err(e) => {
                warn!("Chat generation failed: {}", e);
                SERVICE_ERROR_REPLY.to_string()
            }
        }
    }
}

/// Cut `text` to at most `MAX_TEXT` characters
fn clip(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_TEXT {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(MAX_TEXT).collect();
    clipped.push('…');
    clipped
}

fn section<T>(out: &mut String, title: &str, items: &[T], line: impl Fn(&T) -> String) {
    let _ = writeln!(out, "{}:", title);
    if items.is_empty() {
        let _ = writeln!(out, "- (none listed)");
    }
    for item in items.iter().take(MAX_ITEMS) {
        let _ = writeln!(out, "- {}", line(item));
    }
    if items.len() > MAX_ITEMS {
        let _ = writeln!(out, "- ...and {} more", items.len() - MAX_ITEMS);
    }
    out.push('\n');
}

/// System instruction built from the visible portfolio content
pub fn system_prompt(snapshot: &Snapshot) -> String {
    let settings = &snapshot.settings;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are an AI assistant on the portfolio of a developer ({}; {}).",
        clip(&settings.hero_title),
        clip(&settings.hero_subtitle)
    );
    out.push_str("Your goal is to impress recruiters and potential clients visiting the portfolio.\n\n");
    out.push_str("Here is the live data about the portfolio owner:\n\n");

    let experience: Vec<_> = snapshot.experience.iter().filter(|e| e.visible).collect();
    section(&mut out, "EXPERIENCE", &experience, |e| {
        format!(
            "{} at {} ({}): {}",
            e.role,
            e.company,
            e.period,
            clip(&e.description.join(", "))
        )
    });

    let projects: Vec<_> = snapshot.projects.iter().filter(|p| p.visible).collect();
    section(&mut out, "PROJECTS", &projects, |p| {
        format!(
            "{} ({}): {}. Tech: {}",
            p.title,
            p.category,
            clip(&p.description),
            p.tech_stack.join(", ")
        )
    });

    let services: Vec<_> = snapshot.services.iter().filter(|s| s.visible).collect();
    section(&mut out, "SERVICES", &services, |s| {
        format!(
            "{}: {} (Starts at {})",
            s.title,
            clip(&s.description),
            s.price_start.as_deref().unwrap_or("on request")
        )
    });

    let achievements: Vec<_> = snapshot.achievements.iter().filter(|a| a.visible).collect();
    section(&mut out, "ACHIEVEMENTS", &achievements, |a| {
        format!("{} from {} ({})", a.title, a.issuer, a.date)
    });

    out.push_str("Tone: Professional, enthusiastic, concise, and helpful.\n");
    out.push_str("If asked about contact info, suggest using the contact form on the site.\n");
    out.push_str("Keep answers under 50 words unless asked for detail.\n");
    debug!("Chat context is {} bytes", out.len());
    out
}
