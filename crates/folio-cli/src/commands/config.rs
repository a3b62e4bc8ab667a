//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use folio_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "store_url": config.store_url,
                    "store_key_set": config.store_key.is_some(),
                    "realtime_enabled": config.realtime_enabled,
                    "ai_api_key_set": config.ai_api_key.is_some(),
                    "ai_model": config.ai_model,
                    "request_timeout_secs": config.request_timeout_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:             {}", config.data_dir.display());
            println!(
                "  store_url:            {}",
                config.store_url.as_deref().unwrap_or("(not set)")
            );
            println!("  store_key:            {}", masked(config.store_key.as_deref()));
            println!("  realtime_enabled:     {}", config.realtime_enabled);
            println!("  ai_api_key:           {}", masked(config.ai_api_key.as_deref()));
            println!("  ai_model:             {}", config.ai_model);
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Secrets are shown as set/unset only
fn masked(value: Option<&str>) -> &'static str {
    match value {
        Some(_) => "(set)",
        None => "(not set)",
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => config.data_dir = value.clone().into(),
        "store_url" => config.store_url = optional(&value),
        "store_key" => config.store_key = optional(&value),
        "realtime_enabled" => {
            config.realtime_enabled = value
                .parse()
                .context("Invalid value for realtime_enabled. Use 'true' or 'false'.")?;
        }
        "ai_api_key" => config.ai_api_key = optional(&value),
        "ai_model" => {
            if value.is_empty() {
                bail!("ai_model cannot be empty");
            }
            config.ai_model = value.clone();
        }
        "request_timeout_secs" => {
            let secs: u64 = value
                .parse()
                .context("Invalid value for request_timeout_secs. Use a number of seconds.")?;
            config.request_timeout_secs = secs.max(1);
        }
        "log_file" => config.log_file = optional(&value).map(PathBuf::from),
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, store_url, store_key, realtime_enabled, ai_api_key, \
                 ai_model, request_timeout_secs, log_file",
                key
            );
        }
    }

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key.ends_with("_key") { "(hidden)" } else { value.as_str() };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_writes_to_cli_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set(
            "store_url".into(),
            "https://demo.supabase.co".into(),
            Some(&path),
            &output,
        )
        .unwrap();
        set("request_timeout_secs".into(), "0".into(), Some(&path), &output).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.store_url.as_deref(), Some("https://demo.supabase.co"));
        assert_eq!(config.request_timeout_secs, 1);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);
        assert!(set("nope".into(), "x".into(), Some(&path), &output).is_err());
        assert!(!path.exists());
    }
}
