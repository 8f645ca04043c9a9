use crate::config::MailConfig;
use crate::dashboard::escape_html;
use crate::errors::{AppError, AppResult};
use crate::models::{DashboardDocument, DeliveryOutcome, DeliveryStage, ImageRef};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static SRC_ATTRIBUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src="([^"]*)""#).expect("valid src attribute regex"));
static CID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^cid:image(\d+)$").expect("valid cid regex"));

pub fn content_id(position: usize) -> String {
    format!("image{}", position)
}

// Replaces each image's plain `src` with `cid:imageN` (N = 1-based order) and
// checks the result references exactly the attachments, each once.
pub fn rewrite_cids(html: &str, images: &[ImageRef]) -> AppResult<String> {
    let mut rewritten = html.to_string();
    for (index, image) in images.iter().enumerate() {
        let needle = format!("src=\"{}\"", escape_html(&image.file_name));
        let found = rewritten.matches(&needle).count();
        if found != 1 {
            return Err(AppError::Delivery(format!(
                "Image '{}' is referenced {} time(s) in the dashboard, expected once",
                image.file_name, found
            )));
        }
        rewritten = rewritten.replacen(&needle, &format!("src=\"cid:{}\"", content_id(index + 1)), 1);
    }

    let mut seen = BTreeSet::new();
    for capture in SRC_ATTRIBUTE_RE.captures_iter(&rewritten) {
        let reference = &capture[1];
        let position = CID_RE
            .captures(reference)
            .and_then(|cid| cid[1].parse::<usize>().ok())
            .ok_or_else(|| AppError::Delivery(format!("Unmatched image reference '{}'", reference)))?;
        if !seen.insert(position) {
            return Err(AppError::Delivery(format!("Duplicate reference cid:{}", content_id(position))));
        }
    }
    let expected: BTreeSet<usize> = (1..=images.len()).collect();
    if seen != expected {
        return Err(AppError::Delivery(format!(
            "Content-ID references {:?} do not match {} attachment(s)",
            seen,
            images.len()
        )));
    }

    Ok(rewritten)
}

#[derive(Debug, Clone)]
pub struct EmailDraft {
    pub subject: String,
    pub address: String,
    pub html: String,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone)]
pub struct AttachedEmail {
    pub message: Message,
    pub html: String,
    pub attachments: usize,
}

impl EmailDraft {
    pub fn new(subject: &str, address: &str, document: &DashboardDocument) -> Self {
        Self {
            subject: subject.to_string(),
            address: address.to_string(),
            html: document.html.clone(),
            images: document.images.clone(),
        }
    }

    pub fn attach(self) -> AppResult<AttachedEmail> {
        let mailbox: Mailbox = self.address.parse()?;
        let html = rewrite_cids(&self.html, &self.images)?;
        let png = ContentType::parse("image/png").map_err(|err| AppError::Internal(err.to_string()))?;

        let mut body = MultiPart::related().singlepart(SinglePart::html(html.clone()));
        for (index, image) in self.images.iter().enumerate() {
            let bytes = std::fs::read(&image.path).map_err(|err| {
                AppError::Delivery(format!("Failed to read '{}': {}", image.path.display(), err))
            })?;
            body = body.singlepart(Attachment::new_inline(content_id(index + 1)).body(bytes, png.clone()));
        }

        let message = Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(self.subject)
            .multipart(body)?;

        Ok(AttachedEmail {
            message,
            html,
            attachments: self.images.len(),
        })
    }
}

pub trait MailTransport {
    fn send(&self, message: &Message) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &Message) -> AppResult<()> {
        let transport = SmtpTransport::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.address.clone(),
                self.config.password.clone(),
            ))
            .build();
        transport.send(message)?;
        Ok(())
    }
}

pub struct Notifier<'a, T: MailTransport> {
    transport: &'a T,
    address: String,
}

impl<'a, T: MailTransport> Notifier<'a, T> {
    pub fn new(transport: &'a T, address: &str) -> Self {
        Self {
            transport,
            address: address.to_string(),
        }
    }

    pub fn deliver(&self, document: &DashboardDocument, subject: &str) -> DeliveryOutcome {
        let draft = EmailDraft::new(subject, &self.address, document);
        tracing::info!(stage = DeliveryStage::Draft.as_str(), images = draft.images.len(), "email drafted");

        let attached = match draft.attach() {
            Ok(attached) => attached,
            Err(error) => return self.failed(DeliveryStage::Attached, error),
        };
        tracing::info!(
            stage = DeliveryStage::Attached.as_str(),
            attachments = attached.attachments,
            "email attachments ready"
        );

        if let Err(error) = self.transport.send(&attached.message) {
            return self.failed(DeliveryStage::Sent, error);
        }
        tracing::info!(stage = DeliveryStage::Sent.as_str(), "email sent");
        DeliveryOutcome::Sent {
            attachments: attached.attachments,
        }
    }

    fn failed(&self, stage: DeliveryStage, error: AppError) -> DeliveryOutcome {
        tracing::warn!(stage = stage.as_str(), error = %error, "email delivery failed");
        DeliveryOutcome::Failed {
            stage,
            cause: error.to_string(),
        }
    }
}
