//! Normalized submission payloads handed to the notification sender.

use serde::{Deserialize, Serialize};

/// Complete, label-resolved submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum SubmissionPayload {
    Contact(ContactData),
    ServiceRequest(ServiceRequestData),
}

impl SubmissionPayload {
    /// Address of the customer who submitted the form.
    pub fn customer_email(&self) -> &str {
        match self {
            SubmissionPayload::Contact(c) => &c.email,
            SubmissionPayload::ServiceRequest(s) => &s.email,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionPayload::Contact(_) => "contact",
            SubmissionPayload::ServiceRequest(_) => "service-request",
        }
    }
}

/// Contact / quote form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactData {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub urgent: bool,
    /// Page the form was submitted from, e.g. "Homepage Form"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Multi-step service request submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
    /// Display names of the selected services
    pub services: Vec<String>,
    /// Display text of the urgency, e.g. "Within 3 days"
    pub urgency: String,
    /// Urgency code used as the priority class
    pub urgency_level: String,
    pub budget: String,
    pub preferred_contact: String,
    pub description: String,
}

impl ServiceRequestData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
