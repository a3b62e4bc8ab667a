//! Rendering of the named views

use anyhow::Result;
use chrono::Local;

use folio_core::views::{self, DashboardStats};
use folio_core::{Folio, Route, Snapshot};

use crate::output::{truncate, Output, OutputFormat};

const PRIVACY: &str = "\
Privacy Policy

This site collects only what you send through the contact form: your name,
email address and message. They are used solely to reply to you and are
never sold or shared. Ask through the contact form to have them deleted.";

const TERMS: &str = "\
Terms of Service

All content on this site is provided as-is for informational purposes.
Project descriptions and code samples remain the property of their authors.
Quotes and prices are indicative until confirmed in writing.";

/// Render the view selected by `fragment`
pub async fn render(app: &Folio, fragment: Option<String>, output: &Output) -> Result<()> {
    let snapshot = super::ready(app).await?;
    let route = Route::resolve(fragment.as_deref().unwrap_or(""), snapshot.authenticated);

    match route {
        Route::Portfolio => portfolio(&snapshot, output),
        Route::Admin => {
            let stats = DashboardStats::from_snapshot(&snapshot);
            let activity = views::monthly_activity(&snapshot, Local::now().date_naive());
            output.print_dashboard(&stats, &activity);
        }
        Route::Auth => output.message("Admin access requires signing in: folio login <email>"),
        Route::Privacy => output.text("privacy", PRIVACY),
        Route::Terms => output.text("terms", TERMS),
    }
    Ok(())
}

fn portfolio(snapshot: &Snapshot, output: &Output) {
    let projects = views::public_projects(snapshot);
    let experience = views::visible_experience(snapshot);
    let services = views::visible_services(snapshot);
    let achievements = views::visible_achievements(snapshot);
    let testimonials = views::visible_testimonials(snapshot);
    let blogs = views::published_blogs(snapshot);
    let skills = views::skills_by_category(snapshot);

    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({
            "settings": snapshot.settings,
            "projects": projects,
            "experience": experience,
            "skills": skills
                .iter()
                .map(|(category, skills)| serde_json::json!({
                    "category": category.as_str(),
                    "skills": skills,
                }))
                .collect::<Vec<_>>(),
            "services": services,
            "achievements": achievements,
            "testimonials": testimonials,
            "blogs": blogs,
        })),
        OutputFormat::Quiet => {
            for project in projects {
                println!("{}", project.id);
            }
        }
        OutputFormat::Human => {
            let settings = &snapshot.settings;
            println!("{}", settings.hero_title);
            println!("{}", settings.hero_subtitle);
            println!();

            println!("── Projects ──");
            for project in &projects {
                let star = if project.featured { "★ " } else { "" };
                println!("{}{} [{}]", star, project.title, project.category);
                println!("    {}", truncate(&project.description, 70));
            }

            println!();
            println!("── Experience ──");
            for item in &experience {
                println!("{} @ {} ({}, {})", item.role, item.company, item.period, item.kind.as_str());
                for line in &item.description {
                    println!("    • {}", truncate(line, 70));
                }
            }

            println!();
            println!("── Skills ──");
            for (category, skills) in &skills {
                let names: Vec<String> = skills
                    .iter()
                    .map(|s| format!("{} {}%", s.name, s.level))
                    .collect();
                println!("{:<9} {}", category.as_str(), names.join(", "));
            }

            if !services.is_empty() {
                println!();
                println!("── Services ──");
                for service in &services {
                    let price = service.price_start.as_deref().unwrap_or("on request");
                    println!("{} (from {})", service.title, price);
                }
            }

            if !achievements.is_empty() {
                println!();
                println!("── Achievements ──");
                for a in &achievements {
                    println!("{} - {} ({})", a.title, a.issuer, a.date);
                }
            }

            if !testimonials.is_empty() {
                println!();
                println!("── Testimonials ──");
                for t in &testimonials {
                    println!(
                        "{} \"{}\" - {}, {}",
                        "★".repeat(t.rating as usize),
                        truncate(&t.review, 60),
                        t.client_name,
                        t.company
                    );
                }
            }

            if !blogs.is_empty() {
                println!();
                println!("── Blog ──");
                for post in &blogs {
                    println!("{}  {}", post.date, post.title);
                }
            }

            println!();
            println!("Contact: {}", settings.contact_email);
        }
    }
}

/// Print the current snapshot
pub async fn snapshot(app: &Folio, output: &Output) -> Result<()> {
    let snapshot = super::ready(app).await?;
    match output.format {
        OutputFormat::Human => output.print_snapshot_summary(&snapshot),
        _ => output.json(snapshot.as_ref()),
    }
    Ok(())
}

/// Print a summary on every publication until interrupted
pub async fn watch(app: &Folio, output: &Output) -> Result<()> {
    let mut rx = app.sync.subscribe();
    let first = super::ready(app).await?;
    output.print_snapshot_summary(&first);
    let mut last = first.generation;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if snapshot.generation > last {
                    last = snapshot.generation;
                    if output.format == OutputFormat::Human {
                        println!();
                    }
                    output.print_snapshot_summary(&snapshot);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    output.message("Stopped watching.");
    Ok(())
}
