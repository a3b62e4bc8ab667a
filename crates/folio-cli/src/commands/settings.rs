//! Site settings command handlers

use anyhow::{bail, Result};

use folio_core::models::Theme;
use folio_core::{Folio, SiteSettings};

use super::ready;
use crate::output::Output;

pub async fn show(app: &Folio, output: &Output) -> Result<()> {
    let snapshot = ready(app).await?;
    output.print_settings(&snapshot.settings);
    Ok(())
}

/// Apply one `key = value` change to `settings`
fn apply(settings: &mut SiteSettings, key: &str, value: String) -> Result<()> {
    match key {
        "hero_title" => settings.hero_title = value,
        "hero_subtitle" => settings.hero_subtitle = value,
        "contact_email" => settings.contact_email = value,
        "github_url" => settings.github_url = value,
        "linkedin_url" => settings.linkedin_url = value,
        "resume_url" => settings.resume_url = value,
        "theme" => match Theme::parse(&value) {
            Some(theme) => settings.theme = theme,
            None => bail!("Invalid theme '{}'. Use 'dark' or 'light'.", value),
        },
        _ => bail!(
            "Unknown setting: '{}'\n\
             Valid keys: hero_title, hero_subtitle, contact_email, github_url, linkedin_url, \
             resume_url, theme",
            key
        ),
    }
    Ok(())
}

pub async fn set(app: &Folio, key: String, value: String, output: &Output) -> Result<()> {
    let snapshot = ready(app).await?;
    let mut settings = snapshot.settings.clone();
    apply(&mut settings, &key, value.clone())?;

    app.admin.save_settings(&settings).await?;
    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
