//! Port between the account lifecycle controller and identity persistence.

use async_trait::async_trait;

use oakwood_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::models::{Identity, NewIdentity, ProfileChanges};

/// Persistence operations the account lifecycle needs.
///
/// The production implementation is `PgIdentityStore` in `crate::db::users`;
/// tests use an in-memory store. Implementations must enforce email
/// uniqueness themselves (a constraint, not a pre-check) and report a
/// violation as [`RepositoryError::Conflict`].
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new record, inactive and carrying its verification token.
    async fn insert(&self, new: NewIdentity) -> Result<Identity, RepositoryError>;

    /// Look up a record by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError>;

    /// Look up a record by outstanding verification token.
    async fn find_by_token(&self, token: &str) -> Result<Option<Identity>, RepositoryError>;

    /// Look up a record by ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError>;

    /// Mark a record active and clear its verification token, atomically.
    async fn activate(&self, id: UserId) -> Result<(), RepositoryError>;

    /// Overwrite the stored password hash.
    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError>;

    /// Write profile fields on a record.
    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<(), RepositoryError>;
}
