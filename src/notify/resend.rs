use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{render_emails, DeliveryError, Email, NotificationSender};
use crate::models::SubmissionPayload;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends lead emails through the Resend HTTP API.
pub struct ResendMailer {
    api_key: String,
    from: String,
    /// Number printed in customer confirmations
    phone: String,
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

impl ResendMailer {
    pub fn new(
        api_key: String,
        from: String,
        phone: String,
        base_url: &str,
    ) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Self {
            api_key,
            from,
            phone,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn deliver(&self, email: &Email) -> Result<(), DeliveryError> {
        let payload = ResendPayload {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let resp = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationSender for ResendMailer {
    async fn send(
        &self,
        payload: &SubmissionPayload,
        destination: &str,
    ) -> Result<(), DeliveryError> {
        let [business, customer] = render_emails(payload, destination, &self.phone);

        self.deliver(&business).await?;
        tracing::info!(kind = payload.kind(), "Business notification sent");

        self.deliver(&customer).await?;
        tracing::info!(kind = payload.kind(), "Customer confirmation sent");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::models::ContactData;

    #[derive(Clone, Default)]
    struct MockProvider {
        received: Arc<Mutex<Vec<(Option<String>, Value)>>>,
        status: Arc<Mutex<Vec<StatusCode>>>,
    }

    async fn emails(
        State(mock): State<MockProvider>,
        headers: axum::http::HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        mock.received.lock().unwrap().push((auth, body));
        let status = mock.status.lock().unwrap().pop().unwrap_or(StatusCode::OK);
        (status, Json(json!({ "id": "msg_1" })))
    }

    async fn start(mock: MockProvider) -> String {
        let app = Router::new().route("/emails", post(emails)).with_state(mock);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn payload() -> SubmissionPayload {
        SubmissionPayload::Contact(ContactData {
            name: "Jo Bloggs".to_string(),
            email: "jo@example.com".to_string(),
            phone: "Not provided".to_string(),
            subject: "Window quote".to_string(),
            message: "Three sash windows".to_string(),
            service: None,
            property: None,
            urgent: false,
            source: None,
        })
    }

    #[tokio::test]
    async fn test_sends_business_then_customer() {
        let mock = MockProvider::default();
        let base = start(mock.clone()).await;
        let mailer = ResendMailer::new(
            "re_test".to_string(),
            "Site <noreply@example.com>".to_string(),
            "01707 123456".to_string(),
            &base,
        )
        .unwrap();

        mailer.send(&payload(), "leads@example.com").await.unwrap();

        let received = mock.received.lock().unwrap().clone();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].0.as_deref(), Some("Bearer re_test"));
        assert_eq!(received[0].1["to"], json!(["leads@example.com"]));
        assert_eq!(received[0].1["from"], "Site <noreply@example.com>");
        assert_eq!(received[0].1["reply_to"], "jo@example.com");
        assert_eq!(received[1].1["to"], json!(["jo@example.com"]));
        assert!(received[1].1.get("reply_to").is_none());
        assert!(received[1].1["html"]
            .as_str()
            .unwrap()
            .contains("Call 01707 123456"));
    }

    #[tokio::test]
    async fn test_rejection_stops_delivery() {
        let mock = MockProvider::default();
        mock.status
            .lock()
            .unwrap()
            .push(StatusCode::UNPROCESSABLE_ENTITY);
        let base = start(mock.clone()).await;
        let mailer = ResendMailer::new(
            "re_test".to_string(),
            "noreply@example.com".to_string(),
            "01707 123456".to_string(),
            &base,
        )
        .unwrap();

        let err = mailer
            .send(&payload(), "leads@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { status: 422, .. }));
        assert_eq!(mock.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let mailer = ResendMailer::new(
            "re_test".to_string(),
            "noreply@example.com".to_string(),
            "01707 123456".to_string(),
            "http://127.0.0.1:1",
        )
        .unwrap();

        let err = mailer
            .send(&payload(), "leads@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }
}
