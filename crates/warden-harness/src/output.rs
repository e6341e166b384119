// crates/warden-harness/src/output.rs
// ============================================================================
// Module: Warden Headless Output
// Description: Parsing of headless process stdout.
// Purpose: Normalize the JSON (or plain text) a headless agent prints.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A headless process reports its result as JSON on stdout. Several field
//! aliases are recognized (`result`/`text`/`content`, `toolsUsed`/`tools`,
//! `filesModified`/`files`). Stdout that is not a JSON object degrades to a
//! plain-text result with empty tool and file lists and no errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Parsed Output
// ============================================================================

/// Normalized headless process output.
///
/// # Invariants
/// - Absent fields default to empty collections and `has_errors = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeadlessOutput {
    /// Result text.
    pub result: String,
    /// Tool names the agent used.
    pub tools_used: Vec<String>,
    /// File paths the agent modified.
    pub files_modified: Vec<String>,
    /// Whether the agent reported errors.
    pub has_errors: bool,
    /// Free-form metadata object.
    pub metadata: Value,
}

impl HeadlessOutput {
    /// Parses stdout into a normalized output record.
    ///
    /// Non-JSON stdout is treated as `{result: stdout, toolsUsed: [],
    /// filesModified: [], hasErrors: false}`.
    #[must_use]
    pub fn parse(stdout: &str) -> Self {
        match serde_json::from_str::<Value>(stdout.trim()) {
            Ok(Value::Object(fields)) => Self::from_fields(&fields),
            _ => Self {
                result: stdout.to_string(),
                tools_used: Vec::new(),
                files_modified: Vec::new(),
                has_errors: false,
                metadata: Value::Object(Map::new()),
            },
        }
    }

    /// Builds the record from a parsed JSON object, honoring field aliases.
    fn from_fields(fields: &Map<String, Value>) -> Self {
        let result = ["result", "text", "content"]
            .iter()
            .find_map(|name| fields.get(*name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let tools_used = string_array(fields, &["toolsUsed", "tools"]);
        let files_modified = string_array(fields, &["filesModified", "files"]);
        let has_errors = fields.get("hasErrors").and_then(Value::as_bool).unwrap_or(false);
        let metadata = fields
            .get("metadata")
            .filter(|value| value.is_object())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        Self {
            result,
            tools_used,
            files_modified,
            has_errors,
            metadata,
        }
    }
}

/// Extracts the first present alias as an array of strings.
fn string_array(fields: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    aliases
        .iter()
        .find_map(|name| fields.get(*name))
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().filter_map(Value::as_str).map(ToString::to_string).collect()
        })
        .unwrap_or_default()
}
