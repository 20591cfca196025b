//! Verification tokens and temporary passwords.
//!
//! Stateless: callers store the issued values on the identity record.

use rand::Rng;

/// Number of random bits in a verification token.
const TOKEN_BITS: usize = 128;

/// Length of a generated temporary password.
const TEMPORARY_PASSWORD_LENGTH: usize = 10;

/// Characters a temporary password is drawn from: ASCII letters, digits,
/// and punctuation.
const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789\
      !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Issue an opaque email-verification token.
///
/// 32 lowercase hex characters (128 bits) from the thread-local CSPRNG, so
/// collisions are negligible over any realistic number of accounts.
#[must_use]
pub fn issue_verification_token() -> String {
    let bits: u128 = rand::rng().random();
    format!("{bits:032x}")
}

/// Issue a temporary password for the reset flow.
///
/// 10 characters over letters, digits, and punctuation. Selection is by
/// index into the charset; not bias-free, but drawn from a source that is
/// not trivially predictable.
#[must_use]
pub fn issue_temporary_password() -> String {
    let mut rng = rand::rng();
    (0..TEMPORARY_PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_CHARSET.len());
            char::from(PASSWORD_CHARSET[idx])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_token_format() {
        let token = issue_verification_token();
        assert_eq!(token.len(), TOKEN_BITS / 4);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, token.to_lowercase());
    }

    #[test]
    fn test_verification_tokens_differ() {
        // Two draws colliding would mean a broken RNG.
        assert_ne!(issue_verification_token(), issue_verification_token());
    }

    #[test]
    fn test_temporary_password_format() {
        for _ in 0..100 {
            let password = issue_temporary_password();
            assert_eq!(password.chars().count(), TEMPORARY_PASSWORD_LENGTH);
            assert!(
                password
                    .bytes()
                    .all(|b| PASSWORD_CHARSET.contains(&b)),
                "unexpected character in {password:?}"
            );
        }
    }

    #[test]
    fn test_charset_covers_expected_classes() {
        assert!(PASSWORD_CHARSET.iter().any(u8::is_ascii_uppercase));
        assert!(PASSWORD_CHARSET.iter().any(u8::is_ascii_lowercase));
        assert!(PASSWORD_CHARSET.iter().any(u8::is_ascii_digit));
        assert!(PASSWORD_CHARSET.iter().any(u8::is_ascii_punctuation));
    }
}
