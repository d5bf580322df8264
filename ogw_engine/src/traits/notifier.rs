use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    /// Payment approved, the order is in production
    Confirmation,
    /// The package was posted
    Tracking,
    /// The payment window closed without payment
    Expiry,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Confirmation => write!(f, "confirmation"),
            NotificationType::Tracking => write!(f, "tracking"),
            NotificationType::Expiry => write!(f, "expiry"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// The provider refused the `from` address (unverified domain, invalid sender and so on).
    #[error("The mail provider rejected the sender identity. {0}")]
    SenderIdentity(String),
    #[error("The mail provider rejected the message. {0}")]
    Rejected(String),
    #[error("The mail provider could not be reached. {0}")]
    Unavailable(String),
    #[error("Could not render the {0} email. {1}")]
    Template(NotificationType, String),
}

/// Sends transactional email to customers.
#[allow(async_fn_in_trait)]
pub trait Notifier: Clone {
    async fn notify(&self, order: &Order, kind: NotificationType) -> Result<(), NotificationError>;
}
