use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::GuardError;

const DOTNAME: &str = ".cmdsentry";
const CREDENTIAL_ENV_VAR: &str = "CMDSENTRY_API_KEY";
const DEFAULT_TRIAGE_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_REVIEW_MODEL: &str = "claude-sonnet-4-5-20250929";

/// User preferences, loaded once per request lifecycle and treated as a
/// read-only, request-scoped input by the decision pipeline. The persisted
/// form is a JSON file at `<home>/.cmdsentry/config.json` (see SPEC_FULL.md §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub credential: CredentialConfig,
    pub models: ModelsConfig,
    #[serde(rename = "trustedDomains")]
    pub trusted_domains: Vec<String>,
    #[serde(rename = "customPatterns")]
    pub custom_patterns: CustomPatternsConfig,
    #[serde(rename = "allowedMCPTools")]
    pub allowed_mcp_tools: Vec<String>,
    #[serde(rename = "allowedExtensionTools")]
    pub allowed_extension_tools: Vec<String>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub triage: String,
    pub review: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            triage: DEFAULT_TRIAGE_MODEL.to_string(),
            review: DEFAULT_REVIEW_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomPatternsConfig {
    pub allow: Vec<String>,
    pub block: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credential: CredentialConfig::default(),
            models: ModelsConfig::default(),
            trusted_domains: default_trusted_domains(),
            custom_patterns: CustomPatternsConfig::default(),
            allowed_mcp_tools: Vec::new(),
            allowed_extension_tools: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_trusted_domains() -> Vec<String> {
    [
        "github.com",
        "npmjs.com",
        "npmjs.org",
        "pypi.org",
        "crates.io",
        "docs.rs",
        "rust-lang.org",
        "python.org",
        "nodejs.org",
        "golang.org",
        "anthropic.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Mirrors the "explicit path, else default location, else built-in
    /// defaults" fallback this codebase already uses for its own settings
    /// file, keyed to this project's dotname and JSON instead of TOML.
    pub fn load(explicit_path: Option<&Path>) -> Result<Config, GuardError> {
        let path = match explicit_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let Some(path) = path else {
            return Ok(Config::default());
        };

        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| GuardError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|source| GuardError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;

        Ok(config)
    }

    /// Persists the config with owner-only read/write permissions (0600),
    /// since it may carry a credential.
    pub fn save(&self, path: &Path) -> Result<(), GuardError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| GuardError::ConfigWrite {
                path: path.display().to_string(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(self).expect("Config always serializes");
        std::fs::write(path, contents).map_err(|source| GuardError::ConfigWrite {
            path: path.display().to_string(),
            source,
        })?;

        restrict_to_owner(path).map_err(|source| GuardError::ConfigWrite {
            path: path.display().to_string(),
            source,
        })?;

        Ok(())
    }

    /// The single recognized environment variable overrides the config
    /// credential when both are set.
    pub fn resolve_credential(&self) -> Option<String> {
        std::env::var(CREDENTIAL_ENV_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.credential.api_key.clone())
    }

    /// Consults both `allowedExtensionTools` and `allowedMCPTools` — the
    /// config file recognizes them as two separate user-facing keys, but
    /// they gate the same `ExtensionTool` dispatch branch, so either one
    /// listing a matching pattern is enough.
    pub fn is_extension_tool_preapproved(&self, tool_name: &str) -> bool {
        self.allowed_extension_tools
            .iter()
            .chain(self.allowed_mcp_tools.iter())
            .any(|pattern| matches_wildcard(pattern, tool_name))
    }
}

fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => candidate.starts_with(prefix),
        None => pattern == candidate,
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DOTNAME).join("config.json"))
}

pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DOTNAME).join("cmdsentry.log"))
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_seed_trusted_domains_and_default_models() {
        let cfg = Config::default();
        assert!(cfg.trusted_domains.contains(&"github.com".to_string()));
        assert_eq!(cfg.models.triage, DEFAULT_TRIAGE_MODEL);
        assert_eq!(cfg.models.review, DEFAULT_REVIEW_MODEL);
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.models.triage, DEFAULT_TRIAGE_MODEL);
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"trustedDomains": ["example.com"], "models": {"triage": "cheap", "review": "strong"}}"#,
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.trusted_domains, vec!["example.com".to_string()]);
        assert_eq!(cfg.models.triage, "cheap");
        assert_eq!(cfg.models.review, "strong");
    }

    #[test]
    fn save_round_trips_and_sets_owner_only_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut cfg = Config::default();
        cfg.credential.api_key = Some("sk-test".to_string());
        cfg.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.credential.api_key, Some("sk-test".to_string()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn env_var_credential_wins_over_config_file() {
        std::env::set_var(CREDENTIAL_ENV_VAR, "env-key");
        let mut cfg = Config::default();
        cfg.credential.api_key = Some("config-key".to_string());
        assert_eq!(cfg.resolve_credential(), Some("env-key".to_string()));
        std::env::remove_var(CREDENTIAL_ENV_VAR);
    }

    #[test]
    fn config_credential_used_when_env_var_absent() {
        std::env::remove_var(CREDENTIAL_ENV_VAR);
        let mut cfg = Config::default();
        cfg.credential.api_key = Some("config-key".to_string());
        assert_eq!(cfg.resolve_credential(), Some("config-key".to_string()));
    }

    #[test]
    fn extension_tool_preapproval_supports_wildcard_prefix() {
        let mut cfg = Config::default();
        cfg.allowed_extension_tools = vec!["mcp__github__*".to_string()];
        assert!(cfg.is_extension_tool_preapproved("mcp__github__create_issue"));
        assert!(!cfg.is_extension_tool_preapproved("mcp__slack__post_message"));
    }

    #[test]
    fn allowed_mcp_tools_also_preapproves() {
        let mut cfg = Config::default();
        cfg.allowed_mcp_tools = vec!["mcp__slack__post_message".to_string()];
        assert!(cfg.is_extension_tool_preapproved("mcp__slack__post_message"));
        assert!(!cfg.is_extension_tool_preapproved("mcp__github__create_issue"));
    }
}
