//! SMTP delivery for contact form messages.
//!
//! Uses the SMTP settings from the `[email]` section of the config file.

use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{ContactMessage, Mailer, OutgoingEmail};
use crate::config::EmailConfig;

/// Mailer that relays through the configured SMTP server
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Send an email with HTML and plain text versions
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let smtp_host = self
            .config
            .smtp_host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;
        let from_address = self
            .config
            .from_address
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("From address not configured"))?;

        let from_mailbox = format!("{} <{}>", self.config.from_name, from_address);
        let from: Mailbox = from_mailbox.parse()?;
        let to: Mailbox = email.to.parse()?;

        let mut builder = Message::builder().from(from).to(to).subject(&email.subject);
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body.clone()),
                ),
        )?;

        let transport = if self.config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
        }
        .port(self.config.smtp_port);

        let transport = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            transport.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            transport
        };

        transport.build().send(message).await?;

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email sent successfully"
        );

        Ok(())
    }
}

/// Render the HTML version of a contact message
pub fn render_contact_html(message: &ContactMessage) -> String {
    let optional_row = |label: &str, value: &Option<String>| match value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        Some(v) => format!(
            r#"<tr><td class="label">{}</td><td>{}</td></tr>"#,
            label,
            html_escape(v)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; color: #1f2937; }}
        table {{ border-collapse: collapse; margin-bottom: 16px; }}
        td {{ padding: 4px 12px 4px 0; vertical-align: top; }}
        .label {{ color: #6b7280; font-weight: 600; }}
        .message {{ white-space: pre-wrap; background: #f9fafb; border-left: 4px solid #059669; padding: 12px 16px; }}
    </style>
</head>
<body>
    <h2>New message from the website</h2>
    <table>
        <tr><td class="label">Name</td><td>{name}</td></tr>
        <tr><td class="label">Email</td><td>{email}</td></tr>
        {phone}
        {subject}
    </table>
    <div class="message">{body}</div>
</body>
</html>"#,
        name = html_escape(message.name.trim()),
        email = html_escape(message.email.trim()),
        phone = optional_row("Phone", &message.phone),
        subject = optional_row("Subject", &message.subject),
        body = html_escape(message.message.trim()),
    )
}

/// Render the plain text version of a contact message
pub fn render_contact_text(message: &ContactMessage) -> String {
    let mut text = format!(
        "New message from the website\n\nName: {}\nEmail: {}\n",
        message.name.trim(),
        message.email.trim()
    );
    if let Some(phone) = message.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        text.push_str(&format!("Phone: {}\n", phone.trim()));
    }
    if let Some(subject) = message.subject.as_deref().filter(|s| !s.trim().is_empty()) {
        text.push_str(&format!("Subject: {}\n", subject.trim()));
    }
    text.push_str(&format!("\n{}\n", message.message.trim()));
    text
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
