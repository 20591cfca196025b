//! Account lifecycle controller.
//!
//! Drives the identity state machine: `Unregistered ->
//! PendingVerification -> Active`, with password reset re-enterable from
//! `Active`. Persistence goes through [`IdentityStore`], notifications
//! through [`AccountMailer`]; both are injected so the flows can be tested
//! without a database or an SMTP relay.

mod error;
mod store;

pub use error::AccountError;
pub use store::IdentityStore;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use oakwood_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::models::{Identity, NewIdentity, ProfileChanges};
use crate::services::mailer::AccountMailer;
use crate::services::tokens;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration form input.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub phone: Option<String>,
    pub country: Option<String>,
}

/// Account lifecycle controller.
///
/// Handles registration, email confirmation, password reset, login, and
/// profile updates.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn IdentityStore>,
    mailer: Arc<dyn AccountMailer>,
    base_url: String,
}

impl AccountService {
    /// Create a new account service.
    ///
    /// `base_url` is embedded in confirmation links.
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        mailer: Arc<dyn AccountMailer>,
        base_url: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            store,
            mailer,
            base_url,
        }
    }

    /// Register a new account.
    ///
    /// The record is inserted inactive, already carrying its verification
    /// token, before any notification is attempted. Confirmation mail is
    /// best-effort: a dispatch failure is logged and the registration still
    /// succeeds, with the record left in `PendingVerification`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` if the email format is invalid.
    /// Returns `AccountError::PasswordMismatch` if the confirmation differs.
    /// Returns `AccountError::WeakPassword` if the password is too short.
    /// Returns `AccountError::EmailTaken` if the email is already registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<Identity, AccountError> {
        let email = Email::parse(&request.email)?;

        if request.password != request.password_confirm {
            return Err(AccountError::PasswordMismatch);
        }
        validate_password(&request.password)?;

        let password_hash = hash_password(&request.password)?;
        let token = tokens::issue_verification_token();

        let identity = self
            .store
            .insert(NewIdentity {
                email,
                password_hash,
                verification_token: token.clone(),
                phone: request.phone,
                country: request.country,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AccountError::EmailTaken,
                other => AccountError::Repository(other),
            })?;

        let url = format!("{}/users/email-confirm/{token}", self.base_url);
        if let Err(e) = self
            .mailer
            .send_confirmation_link(&identity.email, &url)
            .await
        {
            tracing::warn!(
                user_id = %identity.id,
                error = %e,
                "Failed to send confirmation email; account stays pending"
            );
        }

        Ok(identity)
    }

    /// Confirm an email address by verification token.
    ///
    /// Activation and token clearing happen in one store operation, so a
    /// confirmed link cannot be replayed.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::TokenNotFound` if no record carries the token.
    pub async fn confirm_email(&self, token: &str) -> Result<Identity, AccountError> {
        let mut identity = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(AccountError::TokenNotFound)?;

        self.store.activate(identity.id).await?;

        identity.is_active = true;
        identity.verification_token = None;
        Ok(identity)
    }

    /// Reset a password to a freshly issued temporary one.
    ///
    /// The new password is committed before the notification goes out. If
    /// the mail then fails, the error is surfaced to the caller but the
    /// committed change stands: rolling back would reopen the old password.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` if the email format is invalid.
    /// Returns `AccountError::EmailNotFound` if the email is unknown.
    /// Returns `AccountError::Notification` if the mail could not be sent.
    pub async fn reset_password(&self, email: &str) -> Result<(), AccountError> {
        let email = Email::parse(email)?;

        let identity = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::EmailNotFound)?;

        let password = tokens::issue_temporary_password();
        let password_hash = hash_password(&password)?;
        self.store
            .set_password_hash(identity.id, &password_hash)
            .await?;

        self.mailer
            .send_temporary_password(&identity.email, &password)
            .await?;

        Ok(())
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` if the email is unknown or
    /// the password wrong.
    /// Returns `AccountError::NotActivated` for a correct password on an
    /// unconfirmed account.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AccountError> {
        let email = Email::parse(email).map_err(|_| AccountError::InvalidCredentials)?;

        let identity = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        verify_password(password, &identity.password_hash)?;

        if !identity.is_active {
            return Err(AccountError::NotActivated);
        }

        Ok(identity)
    }

    /// Update profile fields on the caller's own record.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the record doesn't exist or the
    /// store fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<(), AccountError> {
        self.store.update_profile(id, changes).await?;
        Ok(())
    }

    /// Load an identity by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` with `NotFound` if the record
    /// doesn't exist.
    pub async fn get(&self, id: UserId) -> Result<Identity, AccountError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AccountError::Repository(RepositoryError::NotFound))
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AccountError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AccountError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AccountError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AccountError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::services::mailer::MailerError;

    /// In-memory identity store with the same uniqueness contract as the
    /// `PostgreSQL` implementation.
    #[derive(Default)]
    struct MemoryIdentityStore {
        records: Mutex<HashMap<i32, Identity>>,
        next_id: AtomicI32,
    }

    #[async_trait]
    impl IdentityStore for MemoryIdentityStore {
        async fn insert(&self, new: NewIdentity) -> Result<Identity, RepositoryError> {
            let mut records = self.records.lock().unwrap();

            if records.values().any(|r| r.email == new.email) {
                return Err(RepositoryError::Conflict("email already exists".to_owned()));
            }

            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let now = Utc::now();
            let identity = Identity {
                id: UserId::new(id),
                email: new.email,
                password_hash: new.password_hash,
                is_active: false,
                verification_token: Some(new.verification_token),
                phone: new.phone,
                country: new.country,
                avatar: None,
                created_at: now,
                updated_at: now,
            };
            records.insert(id, identity.clone());
            Ok(identity)
        }

        async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError> {
            let records = self.records.lock().unwrap();
            Ok(records.values().find(|r| &r.email == email).cloned())
        }

        async fn find_by_token(&self, token: &str) -> Result<Option<Identity>, RepositoryError> {
            let records = self.records.lock().unwrap();
            Ok(records
                .values()
                .find(|r| r.verification_token.as_deref() == Some(token))
                .cloned())
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
            let records = self.records.lock().unwrap();
            Ok(records.get(&id.as_i32()).cloned())
        }

        async fn activate(&self, id: UserId) -> Result<(), RepositoryError> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&id.as_i32())
                .ok_or(RepositoryError::NotFound)?;
            record.is_active = true;
            record.verification_token = None;
            Ok(())
        }

        async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&id.as_i32())
                .ok_or(RepositoryError::NotFound)?;
            record.password_hash = hash.to_owned();
            Ok(())
        }

        async fn update_profile(
            &self,
            id: UserId,
            changes: ProfileChanges,
        ) -> Result<(), RepositoryError> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&id.as_i32())
                .ok_or(RepositoryError::NotFound)?;
            record.phone = changes.phone;
            record.country = changes.country;
            if let Some(avatar) = changes.avatar {
                record.avatar = Some(avatar);
            }
            Ok(())
        }
    }

    /// What a recording mailer saw.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SentMail {
        Confirmation { to: String, url: String },
        TemporaryPassword { to: String, password: String },
    }

    /// Mailer double that records every dispatch, optionally failing.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<SentMail>>,
        fail: AtomicBool,
    }

    impl RecordingMailer {
        fn failing() -> Self {
            let mailer = Self::default();
            mailer.fail.store(true, Ordering::SeqCst);
            mailer
        }

        fn sent(&self) -> Vec<SentMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AccountMailer for RecordingMailer {
        async fn send_confirmation_link(
            &self,
            to: &Email,
            url: &str,
        ) -> Result<(), MailerError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MailerError::InvalidAddress("relay down".to_owned()));
            }
            self.sent.lock().unwrap().push(SentMail::Confirmation {
                to: to.to_string(),
                url: url.to_owned(),
            });
            Ok(())
        }

        async fn send_temporary_password(
            &self,
            to: &Email,
            password: &str,
        ) -> Result<(), MailerError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MailerError::InvalidAddress("relay down".to_owned()));
            }
            self.sent.lock().unwrap().push(SentMail::TemporaryPassword {
                to: to.to_string(),
                password: password.to_owned(),
            });
            Ok(())
        }
    }

    fn service() -> (AccountService, Arc<MemoryIdentityStore>, Arc<RecordingMailer>) {
        let store = Arc::new(MemoryIdentityStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let service = AccountService::new(
            store.clone(),
            mailer.clone(),
            "https://shop.example.com/",
        );
        (service, store, mailer)
    }

    fn request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_owned(),
            password: "correct horse".to_owned(),
            password_confirm: "correct horse".to_owned(),
            phone: None,
            country: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_pending_record_and_sends_one_mail() {
        let (service, _store, mailer) = service();

        let identity = service.register(request("anna@example.com")).await.unwrap();

        assert!(!identity.is_active);
        let token = identity.verification_token.clone().unwrap();
        assert_eq!(token.len(), 32);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            SentMail::Confirmation { to, url } => {
                assert_eq!(to, "anna@example.com");
                assert_eq!(
                    url,
                    &format!("https://shop.example.com/users/email-confirm/{token}")
                );
            }
            other => panic!("unexpected mail: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails_without_mutation() {
        let (service, store, mailer) = service();

        let first = service.register(request("anna@example.com")).await.unwrap();

        let err = service
            .register(request("anna@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));

        // The original record is untouched and no second mail went out.
        let stored = store.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, first.password_hash);
        assert_eq!(stored.verification_token, first.verification_token);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_password_mismatch() {
        let (service, _store, mailer) = service();

        let mut req = request("anna@example.com");
        req.password_confirm = "different!".to_owned();

        let err = service.register(req).await.unwrap_err();
        assert!(matches!(err, AccountError::PasswordMismatch));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let (service, _store, _mailer) = service();

        let mut req = request("anna@example.com");
        req.password = "short".to_owned();
        req.password_confirm = "short".to_owned();

        let err = service.register(req).await.unwrap_err();
        assert!(matches!(err, AccountError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_register_mail_failure_is_best_effort() {
        let store = Arc::new(MemoryIdentityStore::default());
        let mailer = Arc::new(RecordingMailer::failing());
        let service = AccountService::new(store.clone(), mailer, "https://shop.example.com");

        // Registration still succeeds; the record stays pending.
        let identity = service.register(request("anna@example.com")).await.unwrap();
        assert!(!identity.is_active);
        assert!(identity.verification_token.is_some());
        assert!(store.find_by_id(identity.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_confirm_email_activates_account() {
        let (service, store, _mailer) = service();

        let identity = service.register(request("anna@example.com")).await.unwrap();
        let token = identity.verification_token.unwrap();

        let confirmed = service.confirm_email(&token).await.unwrap();
        assert!(confirmed.is_active);
        assert!(confirmed.verification_token.is_none());

        let stored = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert!(stored.is_active);
        assert!(stored.verification_token.is_none());
    }

    #[tokio::test]
    async fn test_confirm_email_unknown_token() {
        let (service, _store, _mailer) = service();

        let err = service.confirm_email("deadbeef").await.unwrap_err();
        assert!(matches!(err, AccountError::TokenNotFound));
    }

    #[tokio::test]
    async fn test_confirm_email_token_is_single_use() {
        let (service, _store, _mailer) = service();

        let identity = service.register(request("anna@example.com")).await.unwrap();
        let token = identity.verification_token.unwrap();

        service.confirm_email(&token).await.unwrap();

        // The activating update cleared the token, so the link is dead.
        let err = service.confirm_email(&token).await.unwrap_err();
        assert!(matches!(err, AccountError::TokenNotFound));
    }

    #[tokio::test]
    async fn test_reset_password_changes_hash_and_sends_one_mail() {
        let (service, store, mailer) = service();

        let identity = service.register(request("anna@example.com")).await.unwrap();
        let old_hash = identity.password_hash.clone();

        service.reset_password("anna@example.com").await.unwrap();

        let stored = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, old_hash);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2); // confirmation + temporary password
        match &sent[1] {
            SentMail::TemporaryPassword { to, password } => {
                assert_eq!(to, "anna@example.com");
                assert_eq!(password.chars().count(), 10);
            }
            other => panic!("unexpected mail: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_password_unknown_email() {
        let (service, _store, _mailer) = service();

        let err = service
            .reset_password("nobody@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailNotFound));
    }

    #[tokio::test]
    async fn test_reset_password_mail_failure_keeps_committed_change() {
        let store = Arc::new(MemoryIdentityStore::default());
        let ok_mailer = Arc::new(RecordingMailer::default());
        let service = AccountService::new(
            store.clone(),
            ok_mailer,
            "https://shop.example.com",
        );
        let identity = service.register(request("anna@example.com")).await.unwrap();
        let old_hash = identity.password_hash;

        let failing = AccountService::new(
            store.clone(),
            Arc::new(RecordingMailer::failing()),
            "https://shop.example.com",
        );
        let err = failing.reset_password("anna@example.com").await.unwrap_err();
        assert!(matches!(err, AccountError::Notification(_)));

        // The password change was committed before the dispatch attempt.
        let stored = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, old_hash);
    }

    #[tokio::test]
    async fn test_login_lifecycle() {
        let (service, _store, _mailer) = service();

        let identity = service.register(request("anna@example.com")).await.unwrap();

        // Pending accounts cannot log in, even with the right password.
        let err = service
            .login("anna@example.com", "correct horse")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotActivated));

        service
            .confirm_email(&identity.verification_token.unwrap())
            .await
            .unwrap();

        let logged_in = service
            .login("anna@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(logged_in.id, identity.id);

        let err = service
            .login("anna@example.com", "wrong password")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        let err = service
            .login("nobody@example.com", "correct horse")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_update_profile_writes_own_fields() {
        let (service, store, _mailer) = service();

        let identity = service.register(request("anna@example.com")).await.unwrap();

        service
            .update_profile(
                identity.id,
                ProfileChanges {
                    phone: Some("+31 20 123 4567".to_owned()),
                    country: Some("Netherlands".to_owned()),
                    avatar: Some("avatars/a1.png".to_owned()),
                },
            )
            .await
            .unwrap();

        let stored = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert_eq!(stored.phone.as_deref(), Some("+31 20 123 4567"));
        assert_eq!(stored.country.as_deref(), Some("Netherlands"));
        assert_eq!(stored.avatar.as_deref(), Some("avatars/a1.png"));

        // Absent avatar leaves the stored one in place.
        service
            .update_profile(
                identity.id,
                ProfileChanges {
                    phone: None,
                    country: Some("Belgium".to_owned()),
                    avatar: None,
                },
            )
            .await
            .unwrap();

        let stored = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert_eq!(stored.phone, None);
        assert_eq!(stored.country.as_deref(), Some("Belgium"));
        assert_eq!(stored.avatar.as_deref(), Some("avatars/a1.png"));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("correct horse").unwrap();
        let b = hash_password("correct horse").unwrap();
        assert_ne!(a, b);
    }
}
