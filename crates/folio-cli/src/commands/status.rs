//! Status command handler

use anyhow::Result;

use folio_core::{Folio, SessionProvider};

use crate::output::{Output, OutputFormat};

/// Show connection, session and content status
pub async fn show(app: &Folio, output: &Output) -> Result<()> {
    let session = app.auth.current_session().await;
    let snapshot = super::ready(app).await?;
    let config = &app.config;

    let signed_in = match session {
        Ok(Some(ref s)) => Some(s.email().to_string()),
        _ => None,
    };
    let session_error = session.as_ref().err().map(|e| e.to_string());

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "store_url": config.store_url,
                    "realtime_enabled": config.realtime_enabled,
                    "signed_in_as": signed_in,
                    "session_error": session_error,
                    "ai_enabled": app.generator.is_some(),
                    "ai_model": config.ai_model,
                    "generation": snapshot.generation,
                    "failed": snapshot.failed,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", signed_in.as_deref().unwrap_or("anonymous"));
        }
        OutputFormat::Human => {
            println!("Folio Status");
            println!("============");
            println!();
            println!("Store:");
            println!("  URL:      {}", config.store_url.as_deref().unwrap_or("(not set)"));
            println!(
                "  Realtime: {}",
                if config.realtime_enabled { "enabled" } else { "disabled" }
            );
            println!();
            println!("Session:");
            match (&signed_in, &session_error) {
                (Some(email), _) => println!("  Signed in as {}", email),
                (None, Some(error)) => println!("  Unknown ({})", error),
                (None, None) => println!("  Anonymous"),
            }
            println!();
            println!("AI:");
            if app.generator.is_some() {
                println!("  Model: {}", config.ai_model);
            } else {
                println!("  Disabled (set ai_api_key to enable)");
            }
            println!();
            output.print_snapshot_summary(&snapshot);
        }
    }

    Ok(())
}
