//! Business services for the storefront.
//!
//! - [`accounts`] - Account lifecycle (register, confirm, reset, login)
//! - [`mailer`] - Outbound account notifications over SMTP
//! - [`moderation`] - Forbidden-word validation of submitted content
//! - [`tokens`] - Verification tokens and temporary passwords
//! - [`uploads`] - Multipart form parsing and file storage

pub mod accounts;
pub mod mailer;
pub mod moderation;
pub mod tokens;
pub mod uploads;

pub use accounts::{AccountError, AccountService};
pub use mailer::{AccountMailer, MailerError, SmtpMailer};
pub use moderation::{ContentField, ContentPolicy, ModerationError};
