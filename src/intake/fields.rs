//! Field tables and per-step validation for the lead forms.

use std::collections::BTreeMap;

use crate::models::{DraftState, FieldValue, FormVariant};

/// How a field's value is entered and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    /// Single choice from a fixed option list; value is the option code
    Choice,
    /// Set of option codes
    MultiSelect,
    Flag,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// 1-based step the field belongs to
    pub step: usize,
    pub kind: FieldKind,
    /// Message shown when a required field is left blank
    pub required: Option<&'static str>,
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn new(name: &'static str, step: usize, kind: FieldKind) -> Self {
        Self {
            name,
            step,
            kind,
            required: None,
            default: None,
        }
    }

    const fn required(mut self, message: &'static str) -> Self {
        self.required = Some(message);
        self
    }

    const fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    /// Value a freshly opened form holds for this field.
    pub fn initial_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::MultiSelect => FieldValue::List(Vec::new()),
            FieldKind::Flag => FieldValue::Flag(false),
            _ => FieldValue::Text(self.default.unwrap_or_default().to_string()),
        }
    }

    /// Whether `value` has the shape this field stores.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self.kind, value),
            (FieldKind::MultiSelect, FieldValue::List(_))
                | (FieldKind::Flag, FieldValue::Flag(_))
                | (
                    FieldKind::Text | FieldKind::Email | FieldKind::Choice,
                    FieldValue::Text(_)
                )
        )
    }

    /// Error message for `value`, or `None` when it passes.
    pub fn check(&self, value: Option<&FieldValue>) -> Option<String> {
        let blank = value.map_or(true, FieldValue::is_blank);
        if blank {
            return self.required.map(str::to_string);
        }

        match value.and_then(FieldValue::as_text) {
            Some(text) if self.kind == FieldKind::Email && !is_valid_email(text.trim()) => {
                Some("Please enter a valid email".to_string())
            }
            _ => None,
        }
    }
}

const CONTACT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", 1, FieldKind::Text).required("Full name is required"),
    FieldSpec::new("email", 1, FieldKind::Email).required("Email is required"),
    FieldSpec::new("phone", 1, FieldKind::Text),
    FieldSpec::new("service", 1, FieldKind::Choice),
    FieldSpec::new("property", 1, FieldKind::Choice),
    FieldSpec::new("subject", 1, FieldKind::Text),
    FieldSpec::new("message", 1, FieldKind::Text).required("Please enter your message"),
    FieldSpec::new("urgent", 1, FieldKind::Flag),
    FieldSpec::new("source", 1, FieldKind::Text),
];

const SERVICE_REQUEST_FIELDS: &[FieldSpec] = &[
    // Personal information
    FieldSpec::new("firstName", 1, FieldKind::Text).required("First name is required"),
    FieldSpec::new("lastName", 1, FieldKind::Text).required("Last name is required"),
    FieldSpec::new("email", 1, FieldKind::Email).required("Email is required"),
    FieldSpec::new("phone", 1, FieldKind::Text).required("Phone number is required"),
    // Property
    FieldSpec::new("address", 2, FieldKind::Text).required("Address is required"),
    FieldSpec::new("city", 2, FieldKind::Text).required("City is required"),
    FieldSpec::new("postcode", 2, FieldKind::Text).required("Postcode is required"),
    // Requirements
    FieldSpec::new("services", 3, FieldKind::MultiSelect)
        .required("Please select at least one service"),
    FieldSpec::new("urgency", 3, FieldKind::Choice).required("Please select urgency level"),
    // Project details
    FieldSpec::new("description", 4, FieldKind::Text)
        .required("Please provide project details"),
    FieldSpec::new("budget", 4, FieldKind::Choice),
    FieldSpec::new("preferredContact", 4, FieldKind::Choice).default("email"),
];

impl FormVariant {
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            FormVariant::Contact => CONTACT_FIELDS,
            FormVariant::ServiceRequest => SERVICE_REQUEST_FIELDS,
        }
    }

    pub fn total_steps(&self) -> usize {
        match self {
            FormVariant::Contact => 1,
            FormVariant::ServiceRequest => 4,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Draft with every field at its initial value.
    pub fn empty_draft(&self) -> DraftState {
        DraftState {
            values: self
                .fields()
                .iter()
                .map(|f| (f.name.to_string(), f.initial_value()))
                .collect(),
            errors: BTreeMap::new(),
        }
    }
}

/// Errors for the fields of one step, keyed by field name.
pub fn validate_step(
    variant: FormVariant,
    draft: &DraftState,
    step: usize,
) -> BTreeMap<String, String> {
    variant
        .fields()
        .iter()
        .filter(|f| f.step == step)
        .filter_map(|f| {
            f.check(draft.values.get(f.name))
                .map(|msg| (f.name.to_string(), msg))
        })
        .collect()
}

/// First step with errors together with those errors.
pub fn first_invalid_step(
    variant: FormVariant,
    draft: &DraftState,
) -> Option<(usize, BTreeMap<String, String>)> {
    (1..=variant.total_steps())
        .map(|step| (step, validate_step(variant, draft, step)))
        .find(|(_, errors)| !errors.is_empty())
}

/// One `@`, a non-empty local part, and a dotted domain, without whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jo@example.com"));
        assert!(is_valid_email("jo.bloggs@mail.example.co.uk"));
        assert!(!is_valid_email("jo@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jo@@example.com"));
        assert!(!is_valid_email("jo@ex@ample.com"));
        assert!(!is_valid_email("jo@.com"));
        assert!(!is_valid_email("jo@example."));
        assert!(!is_valid_email("jo bloggs@example.com"));
    }

    #[test]
    fn test_step_one_reports_exactly_blank_required_fields() {
        let mut draft = FormVariant::ServiceRequest.empty_draft();
        draft.values.insert("firstName".to_string(), text("Jo"));
        draft.values.insert("email".to_string(), text("   "));

        let errors = validate_step(FormVariant::ServiceRequest, &draft, 1);
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["email", "lastName", "phone"]);
        assert_eq!(errors["lastName"], "Last name is required");
    }

    #[test]
    fn test_invalid_email_message() {
        let spec = FormVariant::Contact.field("email").unwrap();
        assert_eq!(
            spec.check(Some(&text("not-an-email"))).as_deref(),
            Some("Please enter a valid email")
        );
        assert_eq!(spec.check(Some(&text(" jo@example.com "))), None);
    }

    #[test]
    fn test_multi_select_requires_non_empty_set() {
        let spec = FormVariant::ServiceRequest.field("services").unwrap();
        assert_eq!(
            spec.check(Some(&FieldValue::List(vec![]))).as_deref(),
            Some("Please select at least one service")
        );
        assert_eq!(
            spec.check(Some(&FieldValue::List(vec!["glass-repair".to_string()]))),
            None
        );
    }

    #[test]
    fn test_description_only_needs_to_be_non_blank() {
        let spec = FormVariant::ServiceRequest.field("description").unwrap();
        assert_eq!(
            spec.check(None).as_deref(),
            Some("Please provide project details")
        );
        assert_eq!(
            spec.check(Some(&text("   "))).as_deref(),
            Some("Please provide project details")
        );
        assert_eq!(spec.check(Some(&text("Fix door"))), None);
    }

    #[test]
    fn test_optional_fields_never_fail_when_blank() {
        let draft = FormVariant::ServiceRequest.empty_draft();
        let errors = validate_step(FormVariant::ServiceRequest, &draft, 4);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("description"));
    }

    #[test]
    fn test_empty_draft_defaults() {
        let draft = FormVariant::ServiceRequest.empty_draft();
        assert_eq!(draft.values["preferredContact"], text("email"));
        assert_eq!(draft.values["services"], FieldValue::List(vec![]));
        assert_eq!(FormVariant::Contact.empty_draft().values["urgent"], FieldValue::Flag(false));
    }

    #[test]
    fn test_first_invalid_step() {
        let mut draft = FormVariant::ServiceRequest.empty_draft();
        for (k, v) in [
            ("firstName", "Jo"),
            ("lastName", "Bloggs"),
            ("email", "jo@example.com"),
            ("phone", "07949 821925"),
        ] {
            draft.values.insert(k.to_string(), text(v));
        }
        let (step, errors) = first_invalid_step(FormVariant::ServiceRequest, &draft).unwrap();
        assert_eq!(step, 2);
        assert_eq!(errors.len(), 3);
    }
}
