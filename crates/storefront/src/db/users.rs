//! `PostgreSQL` implementation of the identity store.
//!
//! The [`IdentityStore`] trait itself lives with the account service; this
//! module provides the production implementation on top of sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use oakwood_core::{Email, UserId};

use super::RepositoryError;
use crate::models::{Identity, NewIdentity, ProfileChanges};
use crate::services::accounts::IdentityStore;

/// Columns selected for every identity lookup.
const IDENTITY_COLUMNS: &str = "id, email, password_hash, is_active, verification_token, \
     phone, country, avatar, created_at, updated_at";

/// Database row for a user record.
#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: i32,
    email: String,
    password_hash: String,
    is_active: bool,
    verification_token: Option<String>,
    phone: Option<String>,
    country: Option<String>,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IdentityRow {
    fn into_identity(self) -> Result<Identity, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Identity {
            id: UserId::new(self.id),
            email,
            password_hash: self.password_hash,
            is_active: self.is_active,
            verification_token: self.verification_token,
            phone: self.phone,
            country: self.country,
            avatar: self.avatar,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Identity store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    /// Insert a new identity record.
    ///
    /// Uniqueness of the email is enforced by the database constraint, so a
    /// concurrent registration for the same address surfaces as `Conflict`
    /// rather than racing an application-level pre-check.
    async fn insert(&self, new: NewIdentity) -> Result<Identity, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "INSERT INTO users (email, password_hash, verification_token, phone, country) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(&new.verification_token)
        .bind(&new.phone)
        .bind(&new.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_identity()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(IdentityRow::into_identity).transpose()
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE verification_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(IdentityRow::into_identity).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(IdentityRow::into_identity).transpose()
    }

    /// Activate an account, consuming its verification token.
    ///
    /// One statement sets the flag and clears the token, so a confirmed
    /// account can never be re-activated through a captured link.
    async fn activate(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET is_active = TRUE, verification_token = NULL, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id.as_i32())
                .bind(hash)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET phone = $2, country = $3, avatar = COALESCE($4, avatar), \
             updated_at = now() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(&changes.phone)
        .bind(&changes.country)
        .bind(&changes.avatar)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
