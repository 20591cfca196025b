//! User identity domain types.

use chrono::{DateTime, Utc};

use oakwood_core::{Email, UserId};

/// A stored user account (domain type).
///
/// Lifecycle: created inactive at registration with a verification token,
/// activated by email confirmation. The email address doubles as the login
/// identifier; there is no separate username.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique, used for login).
    pub email: Email,
    /// Argon2id hash of the current password.
    pub password_hash: String,
    /// False until the email address has been confirmed.
    pub is_active: bool,
    /// Outstanding email-confirmation token, cleared once used.
    pub verification_token: Option<String>,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Optional country name.
    pub country: Option<String>,
    /// Stored path of the uploaded avatar, if any.
    pub avatar: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new identity record.
///
/// The verification token is part of the initial insert so the record never
/// exists in a state where it is pending confirmation without a token.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: Email,
    pub password_hash: String,
    pub verification_token: String,
    pub phone: Option<String>,
    pub country: Option<String>,
}

/// Profile fields a user may edit on their own record.
///
/// `phone` and `country` are written as given (a `None` clears the column);
/// `avatar` is only written when a new upload was provided.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub phone: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
}
