//! Fill, undo and handler response types.
//!
//! Everything here is plain data with camelCase wire names.

use serde::{Deserialize, Serialize};

use super::field::{InputKind, WireField};

/// Operator-approved instruction to write one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInstruction {
    pub selector: String,
    pub stable_id: String,
    pub value: String,
    pub input_kind: InputKind,
}

/// Outcome of one instruction; produced 1:1 with instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub stable_id: String,
    pub selector: String,
    pub success: bool,
    pub previous_value: String,
    pub error: Option<String>,
}

impl FillResult {
    pub fn ok(instruction: &FillInstruction, previous_value: String) -> Self {
        Self {
            stable_id: instruction.stable_id.clone(),
            selector: instruction.selector.clone(),
            success: true,
            previous_value,
            error: None,
        }
    }

    pub fn failed(instruction: &FillInstruction, previous_value: String, error: impl Into<String>) -> Self {
        Self {
            stable_id: instruction.stable_id.clone(),
            selector: instruction.selector.clone(),
            success: false,
            previous_value,
            error: Some(error.into()),
        }
    }
}

/// Pre-fill state of one targeted element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoEntry {
    pub stable_id: String,
    pub selector: String,
    pub previous_value: String,
    pub input_kind: InputKind,
    /// Checked flags of the whole radio group, in group order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_state: Vec<bool>,
}

/// Response of the `detect` handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub fields: Vec<WireField>,
    pub board: Option<String>,
    pub url: String,
    pub context_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of the `fill` handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub filled: usize,
    pub failed: usize,
    pub results: Vec<FillResult>,
    pub undo_entries: Vec<UndoEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FillResponse {
    /// Whole-batch failure: nothing counts as filled.
    pub fn aborted(instruction_count: usize, error: impl Into<String>) -> Self {
        Self {
            filled: 0,
            failed: instruction_count,
            results: Vec::new(),
            undo_entries: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Response of the `undo` handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResponse {
    pub undone: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_omitted_when_absent() {
        let response = UndoResponse {
            undone: 2,
            failed: 0,
            error: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_aborted_batch_reports_every_instruction_failed() {
        let response = FillResponse::aborted(4, "boom");
        assert_eq!(response.filled, 0);
        assert_eq!(response.failed, 4);
        assert!(response.results.is_empty());
        assert!(response.undo_entries.is_empty());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["undoEntries"], serde_json::json!([]));
    }
}
