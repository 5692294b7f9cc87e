use thiserror::Error;

/// Errors surfaced by the ambient CLI/config layer. Never crosses the
/// `decide()` boundary itself: the core pipeline always resolves to a
/// concrete `Decision`, coercing every failure mode it encounters along the
/// way (see DESIGN.md, §7 of SPEC_FULL.md).
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    ConfigWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("failed to read settings file {path}: {source}")]
    SettingsRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write settings file {path}: {source}")]
    SettingsWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    SettingsParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid request JSON: {0}")]
    InputFormat(#[from] serde_json::Error),

    #[error("llm transport error: {0}")]
    LlmTransport(#[from] reqwest::Error),

    #[error("llm call timed out after {0:?}")]
    LlmTimeout(std::time::Duration),

    #[error("llm reply was not a recognizable JSON object")]
    LlmShape,
}
