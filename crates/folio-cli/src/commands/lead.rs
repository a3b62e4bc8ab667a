//! Lead inbox command handlers

use anyhow::{bail, Result};

use folio_core::{Folio, Lead, Snapshot};

use super::{confirm, ready, resolve_id};
use crate::output::Output;

fn require_admin(snapshot: &Snapshot) -> Result<()> {
    if !snapshot.authenticated {
        bail!("The lead inbox is only available to the admin. Run `folio login` first.");
    }
    Ok(())
}

pub(crate) fn find(snapshot: &Snapshot, id: &str) -> Result<Lead> {
    require_admin(snapshot)?;
    let id = resolve_id(
        "lead",
        id,
        snapshot.leads.iter().map(|l| (l.id.as_str(), l.name.as_str())),
    )?;
    snapshot
        .leads
        .iter()
        .find(|l| l.id == id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Lead not found: {}", id))
}

pub async fn list(app: &Folio, output: &Output) -> Result<()> {
    let snapshot = ready(app).await?;
    require_admin(&snapshot)?;
    output.print_leads(&snapshot.leads);
    Ok(())
}

pub async fn toggle(app: &Folio, id: String, output: &Output) -> Result<()> {
    let lead = find(&*ready(app).await?, &id)?;
    let status = app.admin.toggle_lead_status(&lead).await?;
    output.success(&format!("Lead from {} marked {}", lead.name, status.as_str()));
    Ok(())
}

pub async fn delete(app: &Folio, id: String, output: &Output) -> Result<()> {
    let lead = find(&*ready(app).await?, &id)?;

    if output.should_prompt() {
        println!("Delete lead from {} <{}>", lead.name, lead.email);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    app.admin.delete::<Lead>(&lead.id).await?;
    output.success(&format!("Deleted lead: {}", lead.id));
    Ok(())
}
