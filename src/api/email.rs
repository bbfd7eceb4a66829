//! Direct lead delivery for forms that post a complete submission at once.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::intake::{first_invalid_step, normalize};
use crate::models::{DraftState, FieldValue, FormVariant};
use crate::notify::DeliveryError;
use crate::AppState;

/// Request body for `POST /api/send-email`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub form_data: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub message: &'static str,
}

/// Builds a draft of `variant` from raw form data. Unknown keys are ignored.
pub fn draft_from_form(
    variant: FormVariant,
    form_data: Map<String, Value>,
) -> Result<DraftState, AppError> {
    let mut draft = variant.empty_draft();
    for (name, raw) in form_data {
        let Some(spec) = variant.field(&name) else {
            continue;
        };
        let value: FieldValue = serde_json::from_value(raw).map_err(|_| AppError::Validation {
            message: format!("Invalid value for {}", name),
            details: Some(serde_json::json!({ "field": name })),
        })?;
        if !spec.accepts(&value) {
            return Err(AppError::Validation {
                message: format!("Invalid value for {}", name),
                details: Some(serde_json::json!({ "field": name })),
            });
        }
        draft.values.insert(name, value);
    }
    Ok(draft)
}

/// POST /api/send-email - Validate a complete form and email it.
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> ApiResult<SendEmailResponse> {
    let (Some(kind), Some(form_data)) = (request.kind, request.form_data) else {
        return Err(AppError::BadRequest(
            "Missing required fields: type and formData".to_string(),
        ));
    };
    let variant = FormVariant::from_str(&kind)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid form type: {}", kind)))?;

    let draft = draft_from_form(variant, form_data)?;
    if let Some((_, errors)) = first_invalid_step(variant, &draft) {
        return Err(AppError::Validation {
            message: "Please correct the highlighted fields".to_string(),
            details: Some(serde_json::json!({ "fields": errors })),
        });
    }

    let payload = normalize(variant, &draft);
    match state
        .sender
        .send(&payload, &state.config.business_email)
        .await
    {
        Ok(()) => success(SendEmailResponse {
            message: "Emails sent successfully",
        }),
        Err(DeliveryError::NotConfigured) => {
            tracing::error!("Email delivery requested but RESEND_API_KEY is not set");
            Err(AppError::Internal(
                "Server configuration error. Please contact support.".to_string(),
            ))
        }
        Err(e) => {
            tracing::error!(kind = payload.kind(), "Email delivery failed: {}", e);
            Err(AppError::Delivery(format!(
                "Failed to send email. Please try again or call us directly at {}.",
                state.config.fallback_phone
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_draft_from_form_ignores_unknown_keys() {
        let draft = draft_from_form(
            FormVariant::Contact,
            form(json!({ "name": "Jo", "utm_source": "flyer", "urgent": true })),
        )
        .unwrap();
        assert_eq!(draft.text("name"), "Jo");
        assert!(draft.flag("urgent"));
        assert!(!draft.values.contains_key("utm_source"));
    }

    #[test]
    fn test_draft_from_form_rejects_wrong_shapes() {
        let err = draft_from_form(
            FormVariant::ServiceRequest,
            form(json!({ "services": "glass-repair" })),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = draft_from_form(FormVariant::Contact, form(json!({ "phone": 7949821925u64 })))
            .unwrap_err();
        assert!(err.message().contains("phone"));
    }
}
