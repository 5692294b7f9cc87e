use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What the host agent delivers for a single permission check. Unknown
/// `tool_input` fields are preserved but never consumed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Request {
    pub session_id: String,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub permission_mode: String,
    #[serde(default)]
    pub hook_event_name: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: BTreeMap<String, Value>,
}

impl Request {
    pub fn input_str(&self, field: &str) -> Option<&str> {
        self.tool_input.get(field).and_then(Value::as_str)
    }

    pub fn command(&self) -> &str {
        self.input_str("command").unwrap_or("")
    }

    pub fn file_path(&self) -> &str {
        self.input_str("file_path").unwrap_or("")
    }

    pub fn notebook_path(&self) -> &str {
        self.input_str("notebook_path").unwrap_or("")
    }
}

/// The tagged sum the Dispatcher matches on. Derived from `tool_name`;
/// deliberately not an open trait hierarchy (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    Write,
    Edit,
    Read,
    NotebookEdit,
    PlanExit,
    ExtensionTool(String),
    KnownSafeAuxiliary,
    Shell,
    Unknown(String),
}

/// Tools allowed through without further inspection: they have no mutating
/// effect on the filesystem or network beyond what the host already scopes.
const SAFE_AUXILIARY_TOOLS: &[&str] = &[
    "WebFetch",
    "WebSearch",
    "Task",
    "Glob",
    "Grep",
    "LS",
    "NotebookRead",
    "TodoRead",
    "TodoWrite",
];

/// Prefix identifying an extension (MCP-style) tool, e.g. `mcp__github__create_issue`.
const EXTENSION_TOOL_PREFIX: &str = "mcp__";

const PLAN_EXIT_TOOL: &str = "ExitPlanMode";

impl ToolKind {
    pub fn classify(tool_name: &str) -> ToolKind {
        match tool_name {
            "Write" => ToolKind::Write,
            "Edit" | "MultiEdit" => ToolKind::Edit,
            "Read" => ToolKind::Read,
            "NotebookEdit" => ToolKind::NotebookEdit,
            "Bash" => ToolKind::Shell,
            name if name == PLAN_EXIT_TOOL => ToolKind::PlanExit,
            name if SAFE_AUXILIARY_TOOLS.contains(&name) => ToolKind::KnownSafeAuxiliary,
            name if name.starts_with(EXTENSION_TOOL_PREFIX) => {
                ToolKind::ExtensionTool(name.to_string())
            }
            other => ToolKind::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_tool_names() {
        assert_eq!(ToolKind::classify("Write"), ToolKind::Write);
        assert_eq!(ToolKind::classify("Bash"), ToolKind::Shell);
        assert_eq!(ToolKind::classify("ExitPlanMode"), ToolKind::PlanExit);
        assert_eq!(
            ToolKind::classify("WebFetch"),
            ToolKind::KnownSafeAuxiliary
        );
    }

    #[test]
    fn classifies_extension_tools_by_prefix() {
        match ToolKind::classify("mcp__github__create_issue") {
            ToolKind::ExtensionTool(name) => assert_eq!(name, "mcp__github__create_issue"),
            other => panic!("expected ExtensionTool, got {other:?}"),
        }
    }

    #[test]
    fn classifies_unrecognized_tool_as_unknown() {
        match ToolKind::classify("SomeFutureTool") {
            ToolKind::Unknown(name) => assert_eq!(name, "SomeFutureTool"),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn request_exposes_command_and_file_path_helpers() {
        let json = serde_json::json!({
            "session_id": "s1",
            "tool_name": "Bash",
            "tool_input": {"command": "git status"}
        });
        let req: Request = serde_json::from_value(json).unwrap();
        assert_eq!(req.command(), "git status");
        assert_eq!(req.file_path(), "");
    }
}
