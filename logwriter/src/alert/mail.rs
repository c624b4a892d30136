//! Письмо-оповещение об исключении и его отправка по SMTP.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Message, SmtpTransport, Transport};

use super::AlertEvent;
use crate::config::MailSettings;
use crate::error::LogError;
use crate::record::TIMESTAMP_FORMAT;

pub const DEFAULT_SENDER: &str = "noreply@logwriter.local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

pub trait MailTransport: Send + Sync {
    fn send(&self, settings: &MailSettings, mail: &AlertMail) -> Result<(), LogError>;
}

/// Список через `;`, пустые элементы пропускаются.
pub fn split_recipients(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn compose(event: &AlertEvent, machine_name: &str) -> AlertMail {
    let from = event
        .mail
        .sender
        .clone()
        .unwrap_or_else(|| DEFAULT_SENDER.to_owned());

    let html_body = format!(
        "<p>Hi Team,</p>\
         <p>Log Exception from <strong>{}</strong>.</p>\
         <p><strong>Error:</strong></p><p>{}</p>\
         <p><strong>Stack Trace:</strong></p><p>{}</p>\
         <p><strong>System Name:</strong></p><p>{}</p>\
         <p><strong>Log Path:</strong></p><p>{}</p>\
         <p><strong>Time: </strong>{}</p>\
         <p>Thanks,</p><p>Log Writer</p>",
        escape_html(&event.logger_name),
        escape_html(&event.error_message),
        escape_html(&event.stack_trace),
        escape_html(machine_name),
        escape_html(&event.log_path),
        event.event_time.format(TIMESTAMP_FORMAT),
    );

    AlertMail {
        from,
        to: split_recipients(&event.mail.recipients),
        subject: format!("Exception Alert from {}", event.logger_name),
        html_body,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

// ===== SMTP =====

/// Отправка через SMTP-сервер из настроек, без TLS и авторизации.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    fn build_message(mail: &AlertMail) -> Result<Message, LogError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&mail.from)?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML);
        for to in &mail.to {
            builder = builder.to(parse_mailbox(to)?);
        }
        builder
            .body(mail.html_body.clone())
            .map_err(|e| LogError::Mail(e.to_string()))
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, settings: &MailSettings, mail: &AlertMail) -> Result<(), LogError> {
        if settings.smtp_server.trim().is_empty() {
            return Err(LogError::Mail("no SMTP server configured".to_owned()));
        }
        let message = Self::build_message(mail)?;

        let mut transport = SmtpTransport::builder_dangerous(settings.smtp_server.trim());
        if let Some(port) = settings.smtp_port {
            transport = transport.port(port);
        }
        transport
            .build()
            .send(&message)
            .map(|_| ())
            .map_err(|e| LogError::Mail(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, LogError> {
    address.parse::<Mailbox>().map_err(|e| LogError::Address {
        address: address.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::sync::Arc;

    fn event(recipients: &str, sender: Option<&str>) -> AlertEvent {
        AlertEvent {
            logger_name: "billing".to_owned(),
            error_message: "balance < 0".to_owned(),
            stack_trace: "at ledger::post\nat main".to_owned(),
            log_path: "/var/log/billing/app_0.log".to_owned(),
            event_time: Local::now(),
            mail: Arc::new(MailSettings {
                smtp_server: "127.0.0.1".to_owned(),
                smtp_port: Some(1),
                recipients: recipients.to_owned(),
                sender: sender.map(str::to_owned),
            }),
        }
    }

    #[test]
    fn empty_recipient_tokens_are_skipped() {
        assert_eq!(
            split_recipients(";a@x.com;;b@x.com;"),
            vec!["a@x.com".to_owned(), "b@x.com".to_owned()]
        );
        assert!(split_recipients(";;").is_empty());
    }

    #[test]
    fn compose_uses_default_sender_and_escapes_body() {
        let mail = compose(&event("ops@example.com", None), "build-01");
        assert_eq!(mail.from, DEFAULT_SENDER);
        assert_eq!(mail.to, vec!["ops@example.com".to_owned()]);
        assert_eq!(mail.subject, "Exception Alert from billing");
        assert!(mail.html_body.contains("balance &lt; 0"));
        assert!(mail.html_body.contains("at ledger::post<br>at main"));
        assert!(mail.html_body.contains("build-01"));
        assert!(mail.html_body.contains("/var/log/billing/app_0.log"));
    }

    #[test]
    fn configured_sender_is_kept() {
        let mail = compose(&event("ops@example.com", Some("alerts@example.com")), "h");
        assert_eq!(mail.from, "alerts@example.com");
    }

    #[test]
    fn message_without_recipients_is_rejected() {
        let mail = compose(&event(";;", None), "h");
        assert!(matches!(SmtpMailer::build_message(&mail), Err(LogError::Mail(_))));
    }

    #[test]
    fn bad_recipient_is_an_address_error() {
        let mail = compose(&event("not an address", None), "h");
        assert!(matches!(
            SmtpMailer::build_message(&mail),
            Err(LogError::Address { .. })
        ));
    }

    #[test]
    fn missing_server_fails_without_network() {
        let mut settings = (*event("ops@example.com", None).mail).clone();
        settings.smtp_server.clear();
        let mail = compose(&event("ops@example.com", None), "h");
        assert!(SmtpMailer.send(&settings, &mail).is_err());
    }
}
