//! Handlers for the four CLI subcommands (SPEC_FULL.md §6). Kept separate
//! from `main` so the binary stays a thin wiring layer.

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::Config;
use crate::pipeline::llm::AnthropicClient;
use crate::request::Request;
use crate::settings;
use crate::types::Decision;

pub fn install() -> Result<()> {
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    let settings_path = settings::resolve_settings_path(&cwd)?;
    let binary_path = current_binary_path()?;

    settings::install(&settings_path, &binary_path)?;
    eprintln!("Installed hook in {}", settings_path.display());
    Ok(())
}

pub fn uninstall() -> Result<()> {
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    let settings_path = settings::resolve_settings_path(&cwd)?;
    let binary_path = current_binary_path()?;

    settings::uninstall(&settings_path, &binary_path)?;
    eprintln!("Removed hook from {}", settings_path.display());
    Ok(())
}

fn current_binary_path() -> Result<String> {
    let path = std::env::current_exe().context("could not determine this binary's own path")?;
    Ok(path.display().to_string())
}

/// Interactively prompts for each config field, leaving a field unchanged
/// when the user enters a blank line, then persists with 0600 permissions.
pub fn config() -> Result<()> {
    let path = crate::config::default_config_path().context("could not determine home directory")?;
    let mut cfg = Config::load(Some(&path)).unwrap_or_default();

    let stdin = io::stdin();

    print!(
        "Anthropic API key [{}]: ",
        if cfg.credential.api_key.is_some() { "set, press enter to keep" } else { "none" }
    );
    io::stdout().flush().ok();
    if let Some(line) = prompt_line(&stdin)? {
        cfg.credential.api_key = Some(line);
    }

    print!("Triage model [{}]: ", cfg.models.triage);
    io::stdout().flush().ok();
    if let Some(line) = prompt_line(&stdin)? {
        cfg.models.triage = line;
    }

    print!("Review model [{}]: ", cfg.models.review);
    io::stdout().flush().ok();
    if let Some(line) = prompt_line(&stdin)? {
        cfg.models.review = line;
    }

    print!(
        "Trusted domains, comma-separated [{}]: ",
        cfg.trusted_domains.join(", ")
    );
    io::stdout().flush().ok();
    if let Some(line) = prompt_line(&stdin)? {
        cfg.trusted_domains = split_csv(&line);
    }

    print!("Enable file logging? [y/N]: ");
    io::stdout().flush().ok();
    if let Some(line) = prompt_line(&stdin)? {
        cfg.logging.enabled = matches!(line.trim().to_lowercase().as_str(), "y" | "yes");
    }

    cfg.save(&path)?;
    eprintln!("Saved config to {}", path.display());
    Ok(())
}

fn prompt_line(stdin: &io::Stdin) -> Result<Option<String>> {
    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("failed to read from stdin")?;
    let trimmed = line.trim();
    Ok(if trimmed.is_empty() { None } else { Some(trimmed.to_string()) })
}

fn split_csv(line: &str) -> Vec<String> {
    line.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Reads a `Request` as JSON from stdin, runs the decision pipeline, and
/// writes the Decision envelope as JSON to stdout. Stdout carries exactly
/// one JSON document; all diagnostics go to stderr via `tracing`.
pub async fn check(config: &Config) -> Result<()> {
    let mut raw = String::new();
    io::stdin().read_to_string(&mut raw).context("failed to read request from stdin")?;

    let decision = match serde_json::from_str::<Request>(&raw) {
        Ok(request) => {
            let client = config
                .resolve_credential()
                .map(AnthropicClient::new);
            let llm: Option<&dyn crate::pipeline::llm::LlmClient> =
                client.as_ref().map(|c| c as &dyn crate::pipeline::llm::LlmClient);
            crate::pipeline::decide(&request, config, llm).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "malformed request JSON on stdin");
            Decision::deny(
                crate::types::DecisionSource::NonShellTool,
                "request could not be parsed; denying as a precaution",
            )
        }
    };

    tracing::info!(
        target: "audit",
        behavior = ?decision.behavior,
        source = ?decision.source,
        "decision"
    );

    let envelope = json!({
        "hookSpecificOutput": {
            "hookEventName": "PermissionRequest",
            "decision": {
                "behavior": decision.behavior,
                "message": decision.user_message.clone().unwrap_or_else(|| decision.reason.clone()),
            }
        }
    });

    println!("{}", serde_json::to_string(&envelope)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_empties() {
        assert_eq!(split_csv("github.com, npmjs.com ,,"), vec!["github.com", "npmjs.com"]);
    }
}
