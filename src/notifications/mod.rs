//! Outgoing mail.
//!
//! The contact form is the only thing that sends email. Handlers talk to a
//! [`Mailer`] so tests can swap the SMTP transport for a recorder.

mod email;

pub use email::{render_contact_html, render_contact_text, SmtpMailer};

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// A fully rendered message ready for delivery
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// A contact form submission
#[derive(Debug, Clone, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactMessage {
    /// Subject line of the forwarded message
    pub fn email_subject(&self) -> String {
        match self.subject.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(subject) => format!("Website contact: {}", subject),
            None => format!("Website contact from {}", self.name.trim()),
        }
    }

    /// Render the submission as an email to `recipient`, replying to the sender
    pub fn to_email(&self, recipient: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: recipient.to_string(),
            reply_to: Some(self.email.trim().to_string()),
            subject: self.email_subject(),
            text_body: render_contact_text(self),
            html_body: render_contact_html(self),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Whether mail can actually be delivered
    fn is_enabled(&self) -> bool;

    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}
