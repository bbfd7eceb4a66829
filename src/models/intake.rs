//! Lead-intake form models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which lead form a wizard drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormVariant {
    /// Single-step contact / quote form
    Contact,
    /// Four-step service request
    ServiceRequest,
}

impl FormVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormVariant::Contact => "contact",
            FormVariant::ServiceRequest => "service-request",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "contact" => Some(FormVariant::Contact),
            "service-request" => Some(FormVariant::ServiceRequest),
            _ => None,
        }
    }
}

/// Current value of a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// True when the value carries no user input.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Flag(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Editable, possibly incomplete form state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub values: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl DraftState {
    /// Trimmed text of a field, empty when unset or not text.
    pub fn text(&self, field: &str) -> String {
        self.values
            .get(field)
            .and_then(FieldValue::as_text)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    pub fn list(&self, field: &str) -> Vec<String> {
        match self.values.get(field) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    pub fn flag(&self, field: &str) -> bool {
        matches!(self.values.get(field), Some(FieldValue::Flag(true)))
    }

    /// True when at least one field holds user input.
    pub fn has_input(&self) -> bool {
        self.values.values().any(|v| match v {
            FieldValue::Flag(b) => *b,
            other => !other.is_blank(),
        })
    }
}

/// Lifecycle of a wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStatus {
    Editing,
    Submitted,
    Failed,
}

/// Serializable view of a wizard for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub variant: FormVariant,
    pub current_step: usize,
    pub total_steps: usize,
    pub status: WizardStatus,
    pub values: BTreeMap<String, FieldValue>,
    pub errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}

/// An intake session as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeSession {
    pub session_id: String,
    #[serde(flatten)]
    pub wizard: WizardSnapshot,
}

/// Request body for opening an intake session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntakeRequest {
    pub variant: FormVariant,
    /// Resume the draft of an earlier session
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Request body for setting a field.
#[derive(Debug, Clone, Deserialize)]
pub struct SetFieldRequest {
    pub value: FieldValue,
}

/// Request body for toggling one option of a multi-select field.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleOptionRequest {
    pub option: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_untagged_json() {
        let v: FieldValue = serde_json::from_str("\"Jo\"").unwrap();
        assert_eq!(v, FieldValue::Text("Jo".to_string()));
        let v: FieldValue = serde_json::from_str("[\"glass-repair\"]").unwrap();
        assert_eq!(v, FieldValue::List(vec!["glass-repair".to_string()]));
        let v: FieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, FieldValue::Flag(true));
    }

    #[test]
    fn test_draft_has_input() {
        let mut draft = DraftState::default();
        draft
            .values
            .insert("preferredContact".to_string(), FieldValue::Text("  ".to_string()));
        draft.values.insert("urgent".to_string(), FieldValue::Flag(false));
        assert!(!draft.has_input());

        draft
            .values
            .insert("city".to_string(), FieldValue::Text("London".to_string()));
        assert!(draft.has_input());
    }
}
