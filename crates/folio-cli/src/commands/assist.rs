//! AI assist command handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use folio_core::ai::{assist, generator_from_config, TextGenerator};
use folio_core::{Config, Folio};

use super::ready;
use crate::output::Output;

fn require_generator(generator: Option<Arc<dyn TextGenerator>>) -> Result<Arc<dyn TextGenerator>> {
    match generator {
        Some(generator) => Ok(generator),
        None => bail!(
            "AI features are not configured. Set a key with:\n  folio config set ai_api_key <key>"
        ),
    }
}

/// Draft a blog post body
pub async fn blog(config: &Config, title: String, tags: Vec<String>, output: &Output) -> Result<()> {
    let generator = require_generator(generator_from_config(config))?;
    let body = assist::generate_blog_post(generator.as_ref(), &title, &tags)
        .await
        .context("Failed to generate post")?;
    output.text("content", &body);
    Ok(())
}

/// Suggest technologies for a project description
pub async fn suggest_stack(config: &Config, description: String, output: &Output) -> Result<()> {
    let generator = require_generator(generator_from_config(config))?;
    let stack = assist::suggest_tech_stack(generator.as_ref(), &description).await;
    if output.is_json() {
        output.json(&stack);
    } else if stack.is_empty() {
        output.message("No suggestions available right now.");
    } else {
        println!("{}", stack.join(", "));
    }
    Ok(())
}

/// Rewrite bullet points; the input comes back unchanged if generation fails
pub async fn improve(config: &Config, text: String, output: &Output) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Nothing to improve");
    }
    let generator = require_generator(generator_from_config(config))?;
    let improved = assist::improve_writing(generator.as_ref(), &text).await;
    output.text("text", &improved);
    Ok(())
}

/// Draft a reply to a lead
pub async fn draft_reply(
    app: &Folio,
    id: String,
    signer: Option<String>,
    output: &Output,
) -> Result<()> {
    let generator = require_generator(app.generator.clone())?;
    let snapshot = ready(app).await?;
    let lead = super::lead::find(&snapshot, &id)?;
    let signer = signer.unwrap_or_else(|| snapshot.settings.hero_title.clone());

    let reply = assist::draft_email_reply(generator.as_ref(), &lead, &signer)
        .await
        .context("Failed to draft reply")?;
    output.text("reply", &reply);
    Ok(())
}

/// Media type for a resume file, from its extension
fn mime_type(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    Ok(match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => bail!("Unsupported resume format: {:?} (use PDF, PNG, JPEG, WebP or TXT)", path),
    })
}

/// Parse a resume and insert what it contains
pub async fn import_resume(app: &Folio, path: PathBuf, output: &Output) -> Result<()> {
    let generator = require_generator(app.generator.clone())?;
    let mime = mime_type(&path)?;
    let document = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    // The settings merge needs the current row id
    ready(app).await?;
    if !output.is_quiet() && !output.is_json() {
        println!("Reading {}...", path.display());
    }
    let extract = assist::parse_resume(generator.as_ref(), document, mime)
        .await
        .context("Failed to read the resume")?;
    let summary = app.admin.import_resume(&extract).await?;

    if output.is_json() {
        output.json(&serde_json::json!({
            "experience": summary.experience,
            "projects": summary.projects,
            "achievements": summary.achievements,
            "settings_updated": summary.settings_updated,
        }));
    } else {
        output.success(&format!(
            "Imported {} experience entries, {} projects and {} achievements{}",
            summary.experience,
            summary.projects,
            summary.achievements,
            if summary.settings_updated { "; updated site settings" } else { "" }
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(mime_type(Path::new("cv.PDF")).unwrap(), "application/pdf");
        assert_eq!(mime_type(Path::new("scan.jpeg")).unwrap(), "image/jpeg");
        assert!(mime_type(Path::new("resume.docx")).is_err());
        assert!(mime_type(Path::new("resume")).is_err());
    }

    #[tokio::test]
    async fn test_improve_rejects_blank_text() {
        let output = Output::new(OutputFormat::Quiet);
        let err = improve(&Config::default(), "  \n".to_string(), &output)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Nothing to improve"));
    }

    #[tokio::test]
    async fn test_improve_requires_ai_key() {
        let output = Output::new(OutputFormat::Quiet);
        let config = Config {
            ai_api_key: None,
            ..Config::default()
        };
        let err = improve(&config, "- Built things".to_string(), &output)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ai_api_key"));
    }
}
