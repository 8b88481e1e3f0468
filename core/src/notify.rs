use std::time::Duration;

use lettre::message::{header::ContentType, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use thiserror::Error;

use crate::models::{Ticket, TicketStatus};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("smtp transport failed: {0}")]
    Transport(String),
    #[error("notifier disabled")]
    Disabled,
}

/// Outbound email to a ticket's customer.
pub trait Notifier {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError>;
}

/// Used when no mail relay is configured; every send reports `Disabled`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), NotifyError> {
        tracing::info!(to, subject, "notifier disabled, email not sent");
        Err(NotifyError::Disabled)
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .finish()
    }
}

/// Plain SMTP relay, e.g. a local MTA or smarthost.
pub struct SmtpNotifier {
    from: Mailbox,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|_| NotifyError::Address(settings.from.clone()))?;
        let mut builder = SmtpTransport::builder_dangerous(settings.host.as_str())
            .port(settings.port)
            .timeout(Some(Duration::from_secs(10)));
        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        let to_mailbox = to
            .parse::<Mailbox>()
            .map_err(|_| NotifyError::Address(to.to_string()))?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))?;
        self.transport
            .send(&email)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::info!(to, subject, "notification email sent");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEmail {
    pub subject: String,
    pub html_body: String,
}

pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_multiline(input: &str) -> String {
    html_escape(input)
        .replace("\r\n", "\n")
        .replace('\n', "<br />\n")
}

/// Customer-facing email announcing a staff reply.
pub fn render_reply_email(ticket: &Ticket, reply: &str, status: TicketStatus) -> ReplyEmail {
    let subject = format!("Support Update - Ticket #{}: {}", ticket.id, ticket.subject);
    let html_body = format!(
        r#"<html>
<head><title>Support Ticket Update</title></head>
<body>
  <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
    <div style="background-color: #0066CC; color: white; padding: 20px; text-align: center;">
      <h1>FreeReminders.net Support</h1>
    </div>
    <div style="padding: 20px; background-color: #f9f9f9;">
      <h2>Update on Your Support Ticket</h2>
      <p>Dear {name},</p>
      <p>Our support team has responded to your ticket <strong>#{id}</strong>.</p>
      <div style="background-color: white; padding: 15px; border-left: 4px solid #FF6600; margin: 20px 0;">
        <h3>Support Team Response:</h3>
        <p>{reply}</p>
      </div>
      <div style="background-color: white; padding: 15px; border-left: 4px solid #0066CC; margin: 20px 0;">
        <h3>Ticket Details:</h3>
        <p><strong>Ticket ID:</strong> #{id}</p>
        <p><strong>Subject:</strong> {subject}</p>
        <p><strong>Status:</strong> {status}</p>
      </div>
      <p>Thank you for using FreeReminders.net!</p>
      <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #ddd; color: #666; font-size: 12px;">
        <p>This is an automated message. You can reply to this email or log into your account to continue the conversation.</p>
      </div>
    </div>
  </div>
</body>
</html>
"#,
        name = html_escape(&ticket.name),
        id = ticket.id,
        reply = escape_multiline(reply),
        subject = html_escape(&ticket.subject),
        status = status.label(),
    );
    ReplyEmail { subject, html_body }
}
