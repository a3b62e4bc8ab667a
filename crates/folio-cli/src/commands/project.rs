//! Project command handlers

use anyhow::Result;

use folio_core::views::public_projects;
use folio_core::{Folio, Project, Snapshot};

use super::{confirm, ready, resolve_id};
use crate::output::Output;

/// List public projects, or every project with `all`
pub async fn list(app: &Folio, all: bool, output: &Output) -> Result<()> {
    let snapshot = ready(app).await?;
    if all {
        let projects: Vec<&Project> = snapshot.projects.iter().collect();
        output.print_projects(&projects);
    } else {
        output.print_projects(&public_projects(&snapshot));
    }
    Ok(())
}

fn find(snapshot: &Snapshot, id: &str) -> Result<Project> {
    let id = resolve_id(
        "project",
        id,
        snapshot
            .projects
            .iter()
            .map(|p| (p.id.as_str(), p.title.as_str())),
    )?;
    snapshot
        .projects
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id))
}

pub async fn set_visible(app: &Folio, id: String, visible: bool, output: &Output) -> Result<()> {
    let project = find(&*ready(app).await?, &id)?;
    app.admin.set_project_visible(&project.id, visible).await?;
    output.success(&format!(
        "{} is now {}",
        project.title,
        if visible { "visible" } else { "hidden" }
    ));
    Ok(())
}

pub async fn set_featured(app: &Folio, id: String, featured: bool, output: &Output) -> Result<()> {
    let project = find(&*ready(app).await?, &id)?;
    app.admin.set_project_featured(&project.id, featured).await?;
    output.success(&format!(
        "{} is {}",
        project.title,
        if featured { "featured" } else { "no longer featured" }
    ));
    Ok(())
}

pub async fn delete(app: &Folio, id: String, output: &Output) -> Result<()> {
    let project = find(&*ready(app).await?, &id)?;

    if output.should_prompt() {
        println!("Delete project: {} - {}", project.id, project.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    app.admin.delete::<Project>(&project.id).await?;
    output.success(&format!("Deleted project: {}", project.id));
    Ok(())
}
