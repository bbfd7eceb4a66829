//! HTML email bodies for lead notifications and customer confirmations.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::config::DEFAULT_BUSINESS_EMAIL;
use crate::intake::PHONE_NOT_PROVIDED;
use crate::models::{ContactData, ServiceRequestData, SubmissionPayload};

pub const BUSINESS_NAME: &str = "Castle Crew Glazing";
pub const BUSINESS_EMAIL: &str = DEFAULT_BUSINESS_EMAIL;
pub const BUSINESS_ADDRESS: &str = "16 Industrial Estate, Welwyn Garden, AL7 4ST";

/// Contact-form source that marks a free estimate request.
pub const HOMEPAGE_SOURCE: &str = "Homepage Form";

const EMAIL_CSS: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.header { background-color: #475569; color: white; padding: 20px; text-align: center; }
.content { background-color: #f8fafc; padding: 20px; }
.section { margin-bottom: 20px; }
.label { font-weight: bold; color: #475569; }
.value { margin-bottom: 10px; }
.highlight { background-color: #e2e8f0; padding: 15px; border-radius: 5px; margin: 15px 0; }
.urgent { background-color: #fee2e2; border-left: 4px solid #dc2626; padding: 10px; }
.high { background-color: #fed7aa; border-left: 4px solid #ea580c; padding: 10px; }
.priority { background-color: #f59e0b; color: white; padding: 10px; border-radius: 5px; margin-bottom: 20px; }
.source { background-color: #e2e8f0; padding: 10px; border-radius: 5px; font-size: 12px; color: #64748b; margin-bottom: 20px; }
.offer { background-color: #059669; color: white; padding: 15px; border-radius: 5px; text-align: center; margin: 20px 0; }
.button { background-color: #475569; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block; margin: 10px 0; }
.quote { background: white; padding: 15px; border-radius: 5px; border-left: 4px solid #475569; }
.footer { font-size: 12px; color: #64748b; }
";

/// A rendered message ready for the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// Business notification followed by the customer confirmation.
///
/// `phone` is the number customers are told to call.
pub fn render_emails(payload: &SubmissionPayload, destination: &str, phone: &str) -> [Email; 2] {
    let customer = payload.customer_email().to_string();
    match payload {
        SubmissionPayload::ServiceRequest(data) => [
            Email {
                to: destination.to_string(),
                subject: format!("🏠 New Service Request - {}", data.full_name()),
                html: service_request_notification(data).into_string(),
                reply_to: Some(data.email.clone()),
            },
            Email {
                to: customer,
                subject: format!("Service Request Received - {}", BUSINESS_NAME),
                html: service_request_confirmation(data, phone).into_string(),
                reply_to: None,
            },
        ],
        SubmissionPayload::Contact(data) => [
            Email {
                to: destination.to_string(),
                subject: format!("📨 New Contact Form - {}", data.name),
                html: contact_notification(data).into_string(),
                reply_to: Some(data.email.clone()),
            },
            Email {
                to: customer,
                subject: format!("Thank you for contacting {}", BUSINESS_NAME),
                html: contact_confirmation(data, phone).into_string(),
                reply_to: None,
            },
        ],
    }
}

fn layout(title: &str, heading: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(EMAIL_CSS)) }
            }
            body {
                div class="container" {
                    div class="header" {
                        h1 { (heading) }
                        p { (BUSINESS_NAME) }
                    }
                    div class="content" { (body) }
                }
            }
        }
    }
}

/// Free text with line breaks preserved.
fn multiline(text: &str) -> Markup {
    html! {
        @for (i, line) in text.lines().enumerate() {
            @if i > 0 { br; }
            (line)
        }
    }
}

fn field(label: &str, value: &str) -> Markup {
    html! {
        div class="value" { span class="label" { (label) ":" } " " (value) }
    }
}

fn call_us(phone: &str) -> Markup {
    let tel: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    html! {
        h3 { "Need immediate assistance?" }
        p { "For urgent matters, don't hesitate to call us directly:" }
        p style="text-align: center;" {
            a href={ "tel:" (tel) } class="button" { "📞 Call " (phone) }
        }
    }
}

fn sign_off(phone: &str, closing: &str) -> Markup {
    html! {
        p { "Best regards," br; strong { "The " (BUSINESS_NAME) " Team" } br; "Professional Glazing Solutions" }
        hr;
        p class="footer" {
            (BUSINESS_NAME) " | " (BUSINESS_ADDRESS) br;
            "Email: " (BUSINESS_EMAIL) " | Phone: " (phone)
            @if !closing.is_empty() { br; br; (closing) }
        }
    }
}

pub fn service_request_notification(data: &ServiceRequestData) -> Markup {
    layout(
        "New Service Request",
        "🏠 New Service Request",
        html! {
            @match data.urgency_level.as_str() {
                "urgent" => div class="urgent" { strong { "⚠️ URGENT REQUEST - " (data.urgency) } },
                "high" => div class="high" { strong { "🔸 HIGH PRIORITY - " (data.urgency) } },
                _ => {},
            }
            div class="section" {
                h2 { "Customer Information" }
                (field("Name", &data.full_name()))
                (field("Email", &data.email))
                (field("Phone", &data.phone))
                (field("Preferred Contact", &data.preferred_contact))
            }
            div class="section" {
                h2 { "Property Details" }
                (field("Address", &data.address))
                (field("City", &data.city))
                (field("Postcode", &data.postcode))
            }
            div class="section" {
                h2 { "Service Requirements" }
                (field("Services", &data.services.join(", ")))
                (field("Urgency", &data.urgency))
                (field("Budget", &data.budget))
            }
            div class="section" {
                h2 { "Project Description" }
                div class="quote" { (multiline(&data.description)) }
            }
            div class="header" {
                p { strong { "Next Steps:" } }
                p { "1. Contact customer within 2 hours (business hours)" }
                p { "2. Schedule consultation" }
                p { "3. Prepare quote" }
            }
        },
    )
}

pub fn service_request_confirmation(data: &ServiceRequestData, phone: &str) -> Markup {
    layout(
        "Service Request Received",
        "✅ Request Received!",
        html! {
            h2 { "Dear " (data.first_name) "," }
            p {
                "Thank you for choosing " (BUSINESS_NAME) "! We've successfully received your "
                "service request and are excited to help you with your glazing project."
            }
            div class="highlight" {
                h3 { "📋 Your Request Summary:" }
                p { strong { "Services:" } " " (data.services.join(", ")) }
                p { strong { "Property:" } " " (data.address) ", " (data.city) ", " (data.postcode) }
                p { strong { "Priority:" } " " (data.urgency) }
            }
            h3 { "What happens next?" }
            ul {
                li { "✅ We'll review your requirements (within 2 hours)" }
                li { "📞 Our team will contact you to schedule a free consultation" }
                li { "📏 We'll visit your property for accurate measurements" }
                li { "💰 You'll receive a detailed, transparent quote" }
                li { "🔨 We'll schedule and complete your project" }
            }
            div class="offer" {
                h3 { "🆓 FREE Consultation & Quote" }
                p { "No obligation • Professional assessment • Transparent pricing" }
            }
            (call_us(phone))
            p { "We're looking forward to working with you!" }
            (sign_off(phone, ""))
        },
    )
}

pub fn contact_notification(data: &ContactData) -> Markup {
    let homepage = data.source.as_deref() == Some(HOMEPAGE_SOURCE);
    layout(
        "New Contact Form Submission",
        "📨 New Contact Form",
        html! {
            @if let Some(source) = &data.source {
                div class="source" { strong { "Source:" } " " (source) }
            }
            @if homepage {
                div class="priority" { strong { "🔥 PRIORITY:" } " Free Estimate Request from Homepage" }
            }
            @if data.urgent {
                div class="urgent" { strong { "⚠️ Customer marked this enquiry as urgent" } }
            }
            div class="section" {
                h2 { "Contact Details" }
                (field("Name", &data.name))
                (field("Email", &data.email))
                (field("Phone", &data.phone))
                (field("Subject", &data.subject))
                @if let Some(service) = &data.service { (field("Service", service)) }
                @if let Some(property) = &data.property { (field("Property", property)) }
            }
            div class="section" {
                h2 { "Message" }
                div class="quote" { (multiline(&data.message)) }
            }
            div class="header" {
                p { strong { "Action Required:" } " Respond to customer inquiry within 2 hours" }
                @if homepage { p { em { "High Priority - Free Estimate Request" } } }
            }
        },
    )
}

pub fn contact_confirmation(data: &ContactData, phone: &str) -> Markup {
    let homepage = data.source.as_deref() == Some(HOMEPAGE_SOURCE);
    let first_name = data.name.split_whitespace().next().unwrap_or(&data.name);
    let (title, heading) = if homepage {
        ("Free Estimate Request Received", "✅ Free Estimate Request Received!")
    } else {
        ("Message Received", "✅ Message Received!")
    };

    layout(
        title,
        heading,
        html! {
            h2 { "Dear " (first_name) "," }
            @if homepage {
                p {
                    "Thank you for requesting a free estimate from " (BUSINESS_NAME)
                    "! We're excited to help you transform your space with our premium glazing solutions."
                }
                div class="offer" {
                    h3 { "🆓 FREE Consultation & Estimate" }
                    p { "No obligation • Professional assessment • Transparent pricing" }
                }
                div class="highlight" {
                    h3 { "📋 Your Request Summary:" }
                    p {
                        strong { "Service Requested:" } " "
                        (data.subject.trim_start_matches("Free Estimate Request - "))
                    }
                    p {
                        strong { "Contact Method:" } " " (data.email)
                        @if data.phone != PHONE_NOT_PROVIDED { " | " (data.phone) }
                    }
                }
                h3 { "What happens next?" }
                ul {
                    li { "✅ We'll review your estimate request (within 2 hours)" }
                    li { "📞 Our team will contact you to discuss your project" }
                    li { "📏 We'll schedule a free on-site consultation" }
                    li { "💰 You'll receive a detailed, transparent quote" }
                    li { "🔨 We'll schedule and complete your project" }
                }
            } @else {
                p {
                    "Thank you for contacting " (BUSINESS_NAME)
                    "! We've received your message and appreciate you taking the time to reach out to us."
                }
                div class="highlight" {
                    h3 { "Your Message:" }
                    p { strong { "Subject:" } " " (data.subject) }
                    p style="font-style: italic;" { "\"" (data.message) "\"" }
                }
                h3 { "What's next?" }
                ul {
                    li { "✅ Our team will review your inquiry" }
                    li { "📞 We'll respond within 24 hours" }
                    li { "🆓 Free consultation available if needed" }
                }
            }
            (call_us(phone))
            p {
                "We're looking forward to "
                @if homepage { "working with you on your glazing project" } @else { "helping you" }
                "!"
            }
            @if homepage {
                (sign_off(phone, "Thank you for choosing Castle Crew Glazing for your glazing needs!"))
            } @else {
                (sign_off(phone, "Thank you for contacting Castle Crew Glazing!"))
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: &str = "+44 7949 821925";

    fn service_request(urgency_level: &str, urgency: &str) -> ServiceRequestData {
        ServiceRequestData {
            first_name: "Jo".to_string(),
            last_name: "Bloggs".to_string(),
            email: "jo@example.com".to_string(),
            phone: "07949 821925".to_string(),
            address: "1 High St".to_string(),
            city: "Hatfield".to_string(),
            postcode: "AL10 0AA".to_string(),
            services: vec!["Glass Repair".to_string()],
            urgency: urgency.to_string(),
            urgency_level: urgency_level.to_string(),
            budget: "Not specified".to_string(),
            preferred_contact: "Email".to_string(),
            description: "Cracked pane\nrear bedroom".to_string(),
        }
    }

    fn contact(source: Option<&str>) -> ContactData {
        ContactData {
            name: "Jo Bloggs".to_string(),
            email: "jo@example.com".to_string(),
            phone: "Not provided".to_string(),
            subject: "Free Estimate Request - Sliding Doors".to_string(),
            message: "Need a quote".to_string(),
            service: Some("Sliding Doors".to_string()),
            property: None,
            urgent: false,
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn test_urgent_banner_and_line_breaks() {
        let html = service_request_notification(&service_request("urgent", "Within 24 hours"))
            .into_string();
        assert!(html.contains("URGENT REQUEST - Within 24 hours"));
        assert!(html.contains("Cracked pane<br>rear bedroom"));
        assert!(!html.contains("HIGH PRIORITY"));

        let calm = service_request_notification(&service_request("low", "Within 2 weeks"))
            .into_string();
        assert!(!calm.contains("URGENT REQUEST"));
    }

    #[test]
    fn test_user_input_is_escaped() {
        let mut data = service_request("low", "Within 2 weeks");
        data.description = "<script>alert(1)</script>".to_string();
        let html = service_request_notification(&data).into_string();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_homepage_contact_wording() {
        let html = contact_confirmation(&contact(Some(HOMEPAGE_SOURCE)), PHONE).into_string();
        assert!(html.contains("Free Estimate Request Received"));
        assert!(html.contains("Dear Jo,"));
        assert!(html.contains("Service Requested:</strong> Sliding Doors"));
        assert!(!html.contains("| Not provided"));

        let plain = contact_confirmation(&contact(None), PHONE).into_string();
        assert!(plain.contains("Message Received!"));
        assert!(plain.contains("helping you"));
    }

    #[test]
    fn test_render_emails_addresses() {
        let payload = SubmissionPayload::Contact(contact(None));
        let [business, customer] = render_emails(&payload, "leads@example.com", PHONE);
        assert_eq!(business.to, "leads@example.com");
        assert_eq!(business.subject, "📨 New Contact Form - Jo Bloggs");
        assert_eq!(business.reply_to.as_deref(), Some("jo@example.com"));
        assert_eq!(customer.to, "jo@example.com");
    }

    #[test]
    fn test_confirmation_uses_configured_phone() {
        let payload = SubmissionPayload::ServiceRequest(service_request("low", "Within 2 weeks"));
        let [business, customer] = render_emails(&payload, "leads@example.com", "01707 123456");
        assert!(customer.html.contains("Call 01707 123456"));
        assert!(customer.html.contains("tel:01707123456"));
        assert!(!customer.html.contains(PHONE));
        assert!(!business.html.contains(PHONE));
    }
}
