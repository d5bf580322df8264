//! Email notification dispatcher.
use log::*;
use ogw_engine::{db_types::Order, NotificationError, NotificationType, Notifier};
use provider_tools::{is_sender_identity_rejection, Email, MailApi, ProviderApiError};

use super::templates::render;
use crate::config::MailIdentity;

/// Where rendered emails go.
#[derive(Clone)]
pub enum MailBackend {
    Http(MailApi),
    /// Writes emails to the log. Used when no mail API key is configured.
    LogOnly,
}

impl MailBackend {
    async fn send(&self, email: &Email) -> Result<(), ProviderApiError> {
        match self {
            MailBackend::Http(api) => api.send(email).await.map(|_| ()),
            MailBackend::LogOnly => {
                info!("📧️ [log-only] To: {} Subject: {}", email.to.join(", "), email.subject);
                trace!("📧️ [log-only] {}", email.html);
                Ok(())
            },
        }
    }
}

fn notification_error(e: ProviderApiError) -> NotificationError {
    if is_sender_identity_rejection(&e) {
        return NotificationError::SenderIdentity(e.to_string());
    }
    match e {
        ProviderApiError::Connection(s) | ProviderApiError::Timeout(s) => NotificationError::Unavailable(s),
        other => NotificationError::Rejected(other.to_string()),
    }
}

#[derive(Clone)]
pub struct EmailDispatcher {
    backend: MailBackend,
    identity: MailIdentity,
}

impl EmailDispatcher {
    pub fn new(backend: MailBackend, identity: MailIdentity) -> Self {
        Self { backend, identity }
    }

    fn build_email(&self, order: &Order, kind: NotificationType) -> Result<Email, NotificationError> {
        let rendered = render(order, kind)?;
        let bcc = match (kind, &self.identity.operator_bcc) {
            (NotificationType::Confirmation, Some(operator)) => vec![operator.clone()],
            _ => vec![],
        };
        Ok(Email {
            from: self.identity.from.clone(),
            to: vec![order.customer.email.clone()],
            bcc,
            subject: rendered.subject,
            html: rendered.html,
        })
    }
}

impl Notifier for EmailDispatcher {
    async fn notify(&self, order: &Order, kind: NotificationType) -> Result<(), NotificationError> {
        let mut email = self.build_email(order, kind)?;
        let err = match self.backend.send(&email).await {
            Ok(()) => return Ok(()),
            Err(e) => notification_error(e),
        };
        match (&err, &self.identity.fallback_from) {
            (NotificationError::SenderIdentity(reason), Some(fallback)) => {
                warn!("📧️ Sender {} was rejected ({reason}). Retrying once as {fallback}.", email.from);
                email.from = fallback.clone();
                self.backend.send(&email).await.map_err(notification_error)
            },
            _ => Err(err),
        }
    }
}
