//! Account lifecycle errors.

use thiserror::Error;

use oakwood_core::EmailError;

use crate::db::RepositoryError;
use crate::services::mailer::MailerError;

/// Errors from the account lifecycle controller.
///
/// Each distinct failure gets its own variant so callers can react
/// per-condition instead of pattern-matching on message strings.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The email address is structurally invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The password does not meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// The two password fields do not match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// No account with this email exists.
    #[error("unknown email")]
    EmailNotFound,

    /// No account carries this verification token.
    #[error("unknown verification token")]
    TokenNotFound,

    /// The account exists but its email has not been confirmed.
    #[error("account is not activated")]
    NotActivated,

    /// Wrong email/password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// The identity store failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Notification dispatch failed after the state change was committed.
    #[error("notification error: {0}")]
    Notification(#[from] MailerError),
}

impl AccountError {
    /// Message shown inline on the submitting form, when the failure is the
    /// user's to fix. `None` means the error should propagate instead of
    /// re-rendering the form.
    #[must_use]
    pub fn form_message(&self) -> Option<String> {
        match self {
            Self::InvalidEmail(e) => Some(e.to_string()),
            Self::WeakPassword(msg) => Some(msg.clone()),
            Self::PasswordMismatch => Some("The two password fields do not match.".to_owned()),
            Self::EmailTaken => Some("An account with this email already exists.".to_owned()),
            Self::NotActivated => {
                Some("Please confirm your email address before logging in.".to_owned())
            }
            Self::InvalidCredentials => Some("Invalid email or password.".to_owned()),
            _ => None,
        }
    }
}
