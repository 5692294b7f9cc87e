//! Dispatcher (SPEC_FULL.md §4.1). Branches on the tagged `ToolKind` sum
//! derived from `tool_name`; never an open trait-object hierarchy (§9).

use crate::config::Config;
use crate::pipeline::path_sensitivity::{self, PathAction};
use crate::pipeline::response;
use crate::request::{Request, ToolKind};
use crate::types::{Decision, DecisionSource, Severity, PLAN_APPROVAL_TIMEOUT_SECONDS};

/// Dispatches every non-shell tool kind to a terminal decision. Returns
/// `None` only for `ToolKind::Shell`, which the caller continues routing
/// through the rest of the pipeline with the raw command string.
pub fn dispatch(request: &Request, config: &Config) -> Option<Decision> {
    let kind = ToolKind::classify(&request.tool_name);

    match kind {
        ToolKind::Write | ToolKind::Edit => {
            Some(check_path(request.file_path(), PathAction::Write))
        }
        ToolKind::Read => Some(check_path(request.file_path(), PathAction::Read)),
        ToolKind::NotebookEdit => Some(check_path(request.notebook_path(), PathAction::Edit)),
        ToolKind::PlanExit => Some(
            Decision::deny(DecisionSource::NonShellTool, "plan exit requires operator approval")
                .with_timeout(PLAN_APPROVAL_TIMEOUT_SECONDS)
                .with_user_message(
                    "PLAN APPROVAL REQUIRED\n\nThe agent wants to exit planning mode and begin \
                     making changes. Review the plan before approving."
                        .to_string(),
                ),
        ),
        ToolKind::ExtensionTool(ref name) => {
            if config.is_extension_tool_preapproved(name) {
                Some(Decision::allow(DecisionSource::NonShellTool, format!("{name} is pre-approved")))
            } else {
                Some(
                    Decision::deny(DecisionSource::NonShellTool, format!("{name} requires approval"))
                        .with_user_message(format!(
                            "[EXTENSION TOOL] {name} requires approval.\n\nThis tool is not on your \
                             pre-approved list. Add it to allowedExtensionTools or allowedMCPTools if \
                             you trust it."
                        )),
                )
            }
        }
        ToolKind::KnownSafeAuxiliary => {
            Some(Decision::allow(DecisionSource::NonShellTool, "known safe auxiliary tool"))
        }
        ToolKind::Shell => None,
        ToolKind::Unknown(name) => Some(
            Decision::deny(DecisionSource::NonShellTool, format!("unrecognized tool: {name}"))
                .with_user_message(format!(
                    "[UNKNOWN TOOL] '{name}' is not a recognized tool and cannot be evaluated safely."
                )),
        ),
    }
}

fn check_path(path: &str, action: PathAction) -> Decision {
    match path_sensitivity::check(path, action) {
        Some(hit) => {
            let timeout = crate::types::DEFAULT_TIMEOUT_SECONDS;
            let label = match hit.severity {
                Severity::Critical => "[SENSITIVE FILE — CRITICAL]",
                Severity::High => "[SENSITIVE FILE]",
                Severity::Medium => "[SENSITIVE FILE — LOW]",
            };
            Decision::deny(DecisionSource::HighRisk, hit.description.to_string())
                .with_user_message(response::sensitive_file_message(label, hit.description, hit.risk, hit.legitimate_uses, timeout))
        }
        None => Decision::allow(DecisionSource::NonShellTool, "path is not sensitive"),
    }
}
