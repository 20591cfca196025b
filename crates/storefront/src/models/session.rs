//! Session-stored types.

use serde::{Deserialize, Serialize};

use oakwood_core::{Email, UserId};

/// Keys under which values are stored in the session.
pub mod session_keys {
    /// The logged-in user, if any.
    pub const CURRENT_USER: &str = "current_user";
}

/// The logged-in user as stored in the session cookie's server-side record.
///
/// Deliberately small: everything else is loaded from the database when a
/// handler needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
}

impl CurrentUser {
    #[must_use]
    pub const fn new(id: UserId, email: Email) -> Self {
        Self { id, email }
    }
}
