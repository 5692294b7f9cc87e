use serde::{Deserialize, Serialize};

/// Severity of a built-in pattern match (path sensitivity or high-risk corpus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Risk level attached to a review-stage LLM verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// What kind of sensitive action a shell command represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    UrlShortener,
    ScriptExecution,
    Network,
    PackageInstall,
    GitOperation,
    EnvModification,
    FileSensitive,
}

impl std::fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckpointKind::UrlShortener => "url_shortener",
            CheckpointKind::ScriptExecution => "script_execution",
            CheckpointKind::Network => "network",
            CheckpointKind::PackageInstall => "package_install",
            CheckpointKind::GitOperation => "git_operation",
            CheckpointKind::EnvModification => "env_modification",
            CheckpointKind::FileSensitive => "file_sensitive",
        };
        write!(f, "{s}")
    }
}

/// A label applied to a shell command indicating what class of sensitive
/// action it represents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub kind: CheckpointKind,
    pub original_command: String,
    pub description: String,
}

/// Classification returned by the cheap triage model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriageClassification {
    SelfHandle,
    Escalate,
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResult {
    pub classification: TriageClassification,
    pub reason: String,
    #[serde(default)]
    pub risk_indicators: Vec<String>,
}

/// Verdict returned by the strong review model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewVerdict {
    Allow,
    AskUser,
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub verdict: ReviewVerdict,
    pub risk_level: RiskLevel,
    pub reason: String,
    #[serde(default)]
    pub user_message: Option<String>,
}

/// Where a terminal decision came from. Surfaced to the host for diagnostics
/// and asserted on in tests; never shown to the end user directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionSource {
    InstantAllow,
    InstantBlock,
    HighRisk,
    TrustedDomain,
    NoCheckpoint,
    Checkpoint,
    NonShellTool,
    Haiku,
    Sonnet,
    CustomAllow,
    CustomBlock,
}

/// Behavior the host should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Allow,
    Deny,
}

/// The pipeline's sole output. Immutable once constructed; never carries a
/// reference back into the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub behavior: Behavior,
    pub reason: String,
    pub source: DecisionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Default auto-deny window for an ordinary denial.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 7;
/// Window for plan-approval denials: the operator may be away.
pub const PLAN_APPROVAL_TIMEOUT_SECONDS: u64 = 72 * 60 * 60;

impl Decision {
    pub fn allow(source: DecisionSource, reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Allow,
            reason: reason.into(),
            source,
            checkpoint: None,
            user_message: None,
            timeout_seconds: None,
        }
    }

    pub fn deny(source: DecisionSource, reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Deny,
            reason: reason.into(),
            source,
            checkpoint: None,
            user_message: None,
            timeout_seconds: Some(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}
