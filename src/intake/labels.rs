//! Code-to-label mapping and payload normalization.
//!
//! Every lookup is total: an unrecognized code is returned unchanged.

use crate::models::{
    ContactData, DraftState, FormVariant, ServiceRequestData, SubmissionPayload,
};

const SERVICES: &[(&str, &str)] = &[
    ("window-installation", "Window Installation"),
    ("door-replacement", "Door Replacement"),
    ("glass-repair", "Glass Repair"),
    ("double-glazing", "Double Glazing"),
    ("commercial-glazing", "Commercial Glazing"),
    ("emergency-repair", "Emergency Repair"),
    ("conservatory", "Conservatory Work"),
    ("skylight", "Skylight Installation"),
];

const URGENCY: &[(&str, &str)] = &[
    ("low", "Within 2 weeks"),
    ("medium", "Within 1 week"),
    ("high", "Within 3 days"),
    ("urgent", "Within 24 hours"),
];

const BUDGETS: &[(&str, &str)] = &[
    ("under-1000", "Under £1,000"),
    ("1000-2500", "£1,000 - £2,500"),
    ("2500-5000", "£2,500 - £5,000"),
    ("5000-10000", "£5,000 - £10,000"),
    ("over-10000", "Over £10,000"),
];

const CONTACT_METHODS: &[(&str, &str)] = &[
    ("email", "Email"),
    ("phone", "Phone Call"),
    ("text", "Text Message"),
    ("any", "Any Method"),
];

pub const BUDGET_NOT_SPECIFIED: &str = "Not specified";
pub const PHONE_NOT_PROVIDED: &str = "Not provided";

fn lookup(table: &[(&str, &'static str)], code: &str) -> String {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| code.to_string())
}

pub fn service_label(code: &str) -> String {
    lookup(SERVICES, code)
}

pub fn urgency_label(code: &str) -> String {
    lookup(URGENCY, code)
}

pub fn budget_label(code: &str) -> String {
    if code.is_empty() {
        return BUDGET_NOT_SPECIFIED.to_string();
    }
    lookup(BUDGETS, code)
}

pub fn contact_method_label(code: &str) -> String {
    lookup(CONTACT_METHODS, code)
}

/// Builds the normalized payload from a draft that passed validation.
pub fn normalize(variant: FormVariant, draft: &DraftState) -> SubmissionPayload {
    match variant {
        FormVariant::Contact => SubmissionPayload::Contact(normalize_contact(draft)),
        FormVariant::ServiceRequest => {
            SubmissionPayload::ServiceRequest(normalize_service_request(draft))
        }
    }
}

fn optional(draft: &DraftState, field: &str) -> Option<String> {
    Some(draft.text(field)).filter(|s| !s.is_empty())
}

fn normalize_contact(draft: &DraftState) -> ContactData {
    let service = optional(draft, "service");
    let subject = optional(draft, "subject").unwrap_or_else(|| {
        format!(
            "New Quote Request - {}",
            service.as_deref().unwrap_or("General Inquiry")
        )
    });

    ContactData {
        name: draft.text("name"),
        email: draft.text("email"),
        phone: optional(draft, "phone").unwrap_or_else(|| PHONE_NOT_PROVIDED.to_string()),
        subject,
        message: draft.text("message"),
        service,
        property: optional(draft, "property"),
        urgent: draft.flag("urgent"),
        source: optional(draft, "source"),
    }
}

fn normalize_service_request(draft: &DraftState) -> ServiceRequestData {
    let urgency = draft.text("urgency");

    ServiceRequestData {
        first_name: draft.text("firstName"),
        last_name: draft.text("lastName"),
        email: draft.text("email"),
        phone: draft.text("phone"),
        address: draft.text("address"),
        city: draft.text("city"),
        postcode: draft.text("postcode"),
        services: draft.list("services").iter().map(|s| service_label(s)).collect(),
        urgency: urgency_label(&urgency),
        urgency_level: urgency,
        budget: budget_label(&draft.text("budget")),
        preferred_contact: contact_method_label(&draft.text("preferredContact")),
        description: draft.text("description"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn service_draft() -> DraftState {
        let mut draft = FormVariant::ServiceRequest.empty_draft();
        for (k, v) in [
            ("firstName", "Jo"),
            ("lastName", "Bloggs"),
            ("email", "jo@example.com"),
            ("phone", "07949 821925"),
            ("address", "16 Industrial Estate"),
            ("city", "Welwyn Garden"),
            ("postcode", "AL7 4ST"),
            ("urgency", "high"),
            ("description", "Replace the misted unit in the lounge"),
            ("budget", "1000-2500"),
            ("preferredContact", "phone"),
        ] {
            draft
                .values
                .insert(k.to_string(), FieldValue::Text(v.to_string()));
        }
        draft.values.insert(
            "services".to_string(),
            FieldValue::List(vec!["glass-repair".to_string(), "skylight".to_string()]),
        );
        draft
    }

    #[test]
    fn test_known_codes_become_labels() {
        let SubmissionPayload::ServiceRequest(data) =
            normalize(FormVariant::ServiceRequest, &service_draft())
        else {
            panic!("expected service request payload");
        };

        assert_eq!(data.services, vec!["Glass Repair", "Skylight Installation"]);
        assert_eq!(data.urgency, "Within 3 days");
        assert_eq!(data.urgency_level, "high");
        assert_eq!(data.budget, "£1,000 - £2,500");
        assert_eq!(data.preferred_contact, "Phone Call");
        assert_eq!(data.full_name(), "Jo Bloggs");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        let mut draft = service_draft();
        draft.values.insert(
            "services".to_string(),
            FieldValue::List(vec!["roof-lantern".to_string(), "double-glazing".to_string()]),
        );
        draft
            .values
            .insert("urgency".to_string(), FieldValue::Text("asap".to_string()));
        draft
            .values
            .insert("budget".to_string(), FieldValue::Text("".to_string()));

        let SubmissionPayload::ServiceRequest(data) =
            normalize(FormVariant::ServiceRequest, &draft)
        else {
            panic!("expected service request payload");
        };
        assert_eq!(data.services, vec!["roof-lantern", "Double Glazing"]);
        assert_eq!(data.urgency, "asap");
        assert_eq!(data.urgency_level, "asap");
        assert_eq!(data.budget, "Not specified");
    }

    #[test]
    fn test_contact_defaults() {
        let mut draft = FormVariant::Contact.empty_draft();
        draft
            .values
            .insert("name".to_string(), FieldValue::Text(" Jo Bloggs ".to_string()));
        draft
            .values
            .insert("email".to_string(), FieldValue::Text("jo@example.com".to_string()));
        draft
            .values
            .insert("message".to_string(), FieldValue::Text("Quote please".to_string()));

        let SubmissionPayload::Contact(data) = normalize(FormVariant::Contact, &draft) else {
            panic!("expected contact payload");
        };
        assert_eq!(data.name, "Jo Bloggs");
        assert_eq!(data.phone, "Not provided");
        assert_eq!(data.subject, "New Quote Request - General Inquiry");
        assert_eq!(data.service, None);
        assert!(!data.urgent);
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = normalize(FormVariant::ServiceRequest, &service_draft());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "service-request");
        assert_eq!(json["data"]["firstName"], "Jo");
        assert_eq!(json["data"]["urgencyLevel"], "high");
    }
}
