//! Multi-step lead-intake wizard.
//!
//! A wizard owns the editable draft of one form, gates step changes on
//! validation, auto-saves the draft and hands the normalized payload to a
//! [`NotificationSender`] on submit.

mod autosave;
mod fields;
mod labels;
mod registry;

pub use autosave::*;
pub use fields::*;
pub use labels::*;
pub use registry::*;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::db::Store;
use crate::models::{DraftState, FieldValue, FormVariant, WizardSnapshot, WizardStatus};
use crate::notify::NotificationSender;

#[derive(Debug, Error)]
pub enum WizardError {
    /// Fields that failed validation, keyed by field name
    #[error("{} field(s) failed validation", .0.len())]
    Validation(BTreeMap<String, String>),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("field {field} expects a {expected} value")]
    WrongKind {
        field: String,
        expected: &'static str,
    },
    #[error("cannot {action} {reason}")]
    InvalidTransition {
        action: &'static str,
        reason: &'static str,
    },
}

/// Deployment settings shared by every wizard.
#[derive(Debug, Clone)]
pub struct WizardSettings {
    /// Inbox that receives submissions
    pub destination: String,
    /// Offered to the user whenever delivery fails
    pub fallback_phone: String,
    pub debounce: Duration,
}

pub struct IntakeWizard {
    variant: FormVariant,
    draft: DraftState,
    current_step: usize,
    status: WizardStatus,
    failure_message: Option<String>,
    settings: WizardSettings,
    autosave: DraftAutosave,
}

impl IntakeWizard {
    /// Open a wizard, restoring field values from a saved draft if one exists.
    ///
    /// Hydration never restores the step; a restored wizard starts at step 1.
    pub async fn open(
        variant: FormVariant,
        store: Arc<dyn Store>,
        draft_key: impl Into<String>,
        settings: WizardSettings,
    ) -> Self {
        let autosave = DraftAutosave::new(store, draft_key, settings.debounce);
        let mut draft = variant.empty_draft();

        if let Some(saved) = autosave.load().await {
            let mut restored = 0;
            for (name, value) in saved {
                match variant.field(&name) {
                    Some(spec) if spec.accepts(&value) => {
                        draft.values.insert(name, value);
                        restored += 1;
                    }
                    _ => tracing::debug!(field = %name, "Dropping unrecognized draft field"),
                }
            }
            tracing::info!(key = autosave.key(), restored, "Restored intake draft");
        }

        Self {
            variant,
            draft,
            current_step: 1,
            status: WizardStatus::Editing,
            failure_message: None,
            settings,
            autosave,
        }
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    #[cfg(test)]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.variant.total_steps()
    }

    #[cfg(test)]
    pub fn status(&self) -> WizardStatus {
        self.status
    }

    #[cfg(test)]
    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    #[cfg(test)]
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.draft.errors
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            variant: self.variant,
            current_step: self.current_step,
            total_steps: self.total_steps(),
            status: self.status,
            values: self.draft.values.clone(),
            errors: self.draft.errors.clone(),
            failure_message: self.failure_message.clone(),
        }
    }

    /// Replace a field's value. Clears that field's error only.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), WizardError> {
        self.ensure_editing("edit a field")?;
        let spec = self.spec(name)?;
        if !spec.accepts(&value) {
            return Err(WizardError::WrongKind {
                field: name.to_string(),
                expected: expected_shape(spec.kind),
            });
        }

        self.draft.values.insert(name.to_string(), value);
        self.field_changed(name);
        Ok(())
    }

    /// Add `option` to a multi-select field, or remove it if already selected.
    pub fn toggle_option(&mut self, name: &str, option: &str) -> Result<(), WizardError> {
        self.ensure_editing("edit a field")?;
        let spec = self.spec(name)?;
        if spec.kind != FieldKind::MultiSelect {
            return Err(WizardError::WrongKind {
                field: name.to_string(),
                expected: expected_shape(FieldKind::MultiSelect),
            });
        }

        let mut selected = self.draft.list(name);
        match selected.iter().position(|s| s == option) {
            Some(idx) => {
                selected.remove(idx);
            }
            None => selected.push(option.to_string()),
        }
        self.draft
            .values
            .insert(name.to_string(), FieldValue::List(selected));
        self.field_changed(name);
        Ok(())
    }

    /// Move to the next step if the current step validates.
    pub fn advance(&mut self) -> Result<usize, WizardError> {
        self.ensure_editing("advance")?;
        if self.current_step >= self.total_steps() {
            return Err(WizardError::InvalidTransition {
                action: "advance",
                reason: "past the final step",
            });
        }

        let errors = validate_step(self.variant, &self.draft, self.current_step);
        self.draft.errors = errors.clone();
        if !errors.is_empty() {
            tracing::debug!(step = self.current_step, errors = errors.len(), "Step rejected");
            return Err(WizardError::Validation(errors));
        }

        self.current_step += 1;
        Ok(self.current_step)
    }

    /// Move back one step without validating. Stays on step 1.
    pub fn retreat(&mut self) -> Result<usize, WizardError> {
        self.ensure_editing("go back")?;
        self.current_step = self.current_step.saturating_sub(1).max(1);
        Ok(self.current_step)
    }

    /// Validate every step and deliver the normalized payload.
    ///
    /// Validation failures return an error and never reach the sender. A
    /// delivery failure is not an error here: the wizard moves to
    /// [`WizardStatus::Failed`] with its values intact.
    pub async fn submit(
        &mut self,
        sender: &dyn NotificationSender,
    ) -> Result<WizardStatus, WizardError> {
        self.ensure_editing("submit")?;
        if self.current_step != self.total_steps() {
            return Err(WizardError::InvalidTransition {
                action: "submit",
                reason: "before the final step",
            });
        }

        if let Some((step, errors)) = first_invalid_step(self.variant, &self.draft) {
            self.current_step = step;
            self.draft.errors = errors.clone();
            return Err(WizardError::Validation(errors));
        }
        self.draft.errors.clear();

        let payload = normalize(self.variant, &self.draft);
        match sender.send(&payload, &self.settings.destination).await {
            Ok(()) => {
                tracing::info!(kind = payload.kind(), "Intake submitted");
                self.status = WizardStatus::Submitted;
                self.failure_message = None;
                self.draft = self.variant.empty_draft();
                self.current_step = 1;
                self.autosave.erase().await;
            }
            Err(e) => {
                tracing::warn!(kind = payload.kind(), "Intake delivery failed: {}", e);
                self.status = WizardStatus::Failed;
                self.failure_message = Some(format!(
                    "We're sorry, but there was an error submitting your request. \
                     Please try again or call us directly at {}.",
                    self.settings.fallback_phone
                ));
            }
        }

        Ok(self.status)
    }

    /// Return from a failed delivery to the last data-entry step.
    pub fn retry(&mut self) -> Result<usize, WizardError> {
        if self.status != WizardStatus::Failed {
            return Err(WizardError::InvalidTransition {
                action: "retry",
                reason: "unless the last submission failed",
            });
        }
        self.status = WizardStatus::Editing;
        self.failure_message = None;
        self.current_step = self.total_steps();
        Ok(self.current_step)
    }

    /// Discard the draft, including any saved copy.
    pub async fn abandon(&mut self) {
        self.autosave.erase().await;
        self.draft = self.variant.empty_draft();
        self.current_step = 1;
        self.status = WizardStatus::Editing;
        self.failure_message = None;
    }

    /// Persist the pending draft without waiting for the debounce window.
    pub async fn flush_draft(&mut self) {
        self.autosave.flush().await;
    }

    fn spec(&self, name: &str) -> Result<&'static FieldSpec, WizardError> {
        self.variant
            .field(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))
    }

    fn field_changed(&mut self, name: &str) {
        self.draft.errors.remove(name);
        self.autosave.schedule(&self.draft);
    }

    fn ensure_editing(&self, action: &'static str) -> Result<(), WizardError> {
        match self.status {
            WizardStatus::Editing => Ok(()),
            WizardStatus::Submitted => Err(WizardError::InvalidTransition {
                action,
                reason: "after the request was submitted",
            }),
            WizardStatus::Failed => Err(WizardError::InvalidTransition {
                action,
                reason: "until the failed submission is retried",
            }),
        }
    }
}

fn expected_shape(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::MultiSelect => "list",
        FieldKind::Flag => "boolean",
        FieldKind::Text | FieldKind::Email | FieldKind::Choice => "text",
    }
}
