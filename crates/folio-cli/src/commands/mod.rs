//! Command handlers

pub mod account;
pub mod assist;
pub mod chat;
pub mod config;
pub mod contact;
pub mod lead;
pub mod project;
pub mod settings;
pub mod status;
pub mod view;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use folio_core::{Folio, Snapshot};

/// Wait for the first complete snapshot
pub async fn ready(app: &Folio) -> Result<Arc<Snapshot>> {
    app.sync
        .ready()
        .await
        .context("Failed to load portfolio content")
}

/// Resolve an id (exact or unique prefix) among `(id, label)` pairs
pub fn resolve_id<'a>(
    kind: &str,
    id: &str,
    candidates: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<String> {
    let candidates: Vec<_> = candidates.collect();
    if let Some((exact, _)) = candidates.iter().find(|(c, _)| *c == id) {
        return Ok(exact.to_string());
    }

    let matches: Vec<_> = candidates
        .iter()
        .filter(|(c, _)| c.starts_with(id))
        .collect();
    match matches.len() {
        0 => bail!("No {} found matching: {}", kind, id),
        1 => Ok(matches[0].0.to_string()),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, id);
            for (c, label) in &matches {
                eprintln!("  {} - {}", c, label);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Read one trimmed line after printing `prompt`; None at end of input
pub fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Take the password from the flag or ask for it
pub fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    match prompt_line("Password: ")? {
        Some(password) if !password.is_empty() => Ok(password),
        _ => bail!("A password is required"),
    }
}
