//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use folio_core::views::{ActivityBucket, DashboardStats};
use folio_core::{Lead, Project, SiteSettings, Snapshot};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print any serializable value as pretty JSON
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    /// Print a list of projects
    pub fn print_projects(&self, projects: &[&Project]) {
        match self.format {
            OutputFormat::Human => {
                if projects.is_empty() {
                    println!("No projects found.");
                    return;
                }
                for project in projects {
                    let mut flags = String::new();
                    if project.featured {
                        flags.push('★');
                    }
                    if !project.visible {
                        flags.push_str(" (hidden)");
                    }
                    println!(
                        "{:>6} | {}{} | {} | {}",
                        project.id,
                        truncate(&project.title, 30),
                        flags,
                        truncate(&project.category, 15),
                        truncate(&project.tech_stack.join(", "), 35)
                    );
                }
                println!("\n{} project(s)", projects.len());
            }
            OutputFormat::Json => self.json(projects),
            OutputFormat::Quiet => {
                for project in projects {
                    println!("{}", project.id);
                }
            }
        }
    }

    /// Print the lead inbox
    pub fn print_leads(&self, leads: &[Lead]) {
        match self.format {
            OutputFormat::Human => {
                if leads.is_empty() {
                    println!("No leads yet.");
                    return;
                }
                for lead in leads {
                    println!(
                        "{:>6} | {} | {:<9} | {} <{}> | {}",
                        lead.id,
                        lead.date,
                        lead.status.as_str(),
                        truncate(&lead.name, 20),
                        lead.email,
                        truncate_line(&lead.message, 40)
                    );
                }
                println!("\n{} lead(s)", leads.len());
            }
            OutputFormat::Json => self.json(leads),
            OutputFormat::Quiet => {
                for lead in leads {
                    println!("{}", lead.id);
                }
            }
        }
    }

    pub fn print_settings(&self, settings: &SiteSettings) {
        match self.format {
            OutputFormat::Human => {
                println!("Site settings{}:", if settings.id.is_none() { " (defaults)" } else { "" });
                println!("  hero_title:    {}", settings.hero_title);
                println!("  hero_subtitle: {}", settings.hero_subtitle);
                println!("  contact_email: {}", settings.contact_email);
                println!("  github_url:    {}", settings.github_url);
                println!("  linkedin_url:  {}", settings.linkedin_url);
                println!("  resume_url:    {}", settings.resume_url);
                println!("  theme:         {}", settings.theme.as_str());
            }
            OutputFormat::Json => self.json(settings),
            OutputFormat::Quiet => println!("{}", settings.hero_title),
        }
    }

    /// One-line-per-collection summary of a snapshot
    pub fn print_snapshot_summary(&self, snapshot: &Snapshot) {
        match self.format {
            OutputFormat::Human => {
                let fetched = snapshot
                    .fetched_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "Snapshot #{} ({}, fetched {})",
                    snapshot.generation,
                    if snapshot.authenticated { "admin" } else { "public" },
                    fetched
                );
                println!("  projects:     {}", snapshot.projects.len());
                println!("  experience:   {}", snapshot.experience.len());
                println!("  services:     {}", snapshot.services.len());
                println!("  achievements: {}", snapshot.achievements.len());
                println!("  blogs:        {}", snapshot.blogs.len());
                println!("  testimonials: {}", snapshot.testimonials.len());
                println!("  leads:        {}", snapshot.leads.len());
                println!("  skills:       {}", snapshot.skills.len());
                if !snapshot.failed.is_empty() {
                    let failed: Vec<String> =
                        snapshot.failed.iter().map(|c| c.to_string()).collect();
                    println!("  using defaults for: {}", failed.join(", "));
                }
                if let Some(ref error) = snapshot.error {
                    println!("  ⚠ {}", error);
                }
            }
            OutputFormat::Json => self.json(snapshot),
            OutputFormat::Quiet => println!("{}", snapshot.generation),
        }
    }

    pub fn print_dashboard(&self, stats: &DashboardStats, activity: &[ActivityBucket]) {
        match self.format {
            OutputFormat::Human => {
                println!("Dashboard");
                println!("=========");
                println!();
                println!("  Total views:      {}", stats.total_views);
                println!("  Leads:            {} ({} new)", stats.lead_count, stats.new_leads);
                println!("  Visible projects: {}", stats.visible_projects);
                println!();
                println!("Activity (leads / posts):");
                for bucket in activity {
                    println!("  {}  {:>3} / {:<3}", bucket.month, bucket.leads, bucket.posts);
                }
            }
            OutputFormat::Json => self.json(&serde_json::json!({
                "stats": stats,
                "activity": activity,
            })),
            OutputFormat::Quiet => println!("{}", stats.new_leads),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print generated text; quiet mode still prints it
    pub fn text(&self, label: &str, text: &str) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::json!({ label: text })),
            _ => println!("{}", text),
        }
    }
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
pub fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
