//! Password hashing and token/email helpers for the auth handlers.

use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;

pub(super) const USERNAME_MIN_LENGTH: usize = 3;
pub(super) const USERNAME_MAX_LENGTH: usize = 32;
pub(super) const PASSWORD_MIN_LENGTH: usize = 8;

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

pub(super) fn valid_username(username: &str) -> bool {
    let length = username.chars().count();
    (USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length)
}

pub(super) fn valid_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LENGTH
}

/// Hash a password with argon2id. The PHC string output carries its own salt
/// and parameters, so verification needs nothing else.
pub(super) fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))
}

/// Constant-time verification. Any failure, including an unparsable stored
/// hash, is reported as `false`; the plaintext is never logged.
pub(super) fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Opaque session token for the auth cookie: 32 bytes from the OS RNG,
/// URL-safe base64. Collisions are negligible at 256 bits of entropy.
pub(crate) fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Single-use verification token for email links.
pub(super) fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_username_enforces_bounds() {
        assert!(!valid_username("ab"));
        assert!(valid_username("abc"));
        assert!(valid_username(&"a".repeat(32)));
        assert!(!valid_username(&"a".repeat(33)));
    }

    #[test]
    fn valid_password_enforces_minimum() {
        assert!(!valid_password("short"));
        assert!(valid_password("longenough"));
    }

    #[test]
    fn hash_password_output_is_self_describing() -> anyhow::Result<()> {
        let hash = hash_password("pw123456")?;
        assert!(hash.starts_with("$argon2"));
        Ok(())
    }

    #[test]
    fn verify_password_accepts_only_exact_plaintext() -> anyhow::Result<()> {
        let hash = hash_password("correct horse")?;
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("correct horsf", &hash));
        assert!(!verify_password("", &hash));
        Ok(())
    }

    #[test]
    fn verify_password_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn hashing_same_password_twice_differs_by_salt() -> anyhow::Result<()> {
        let first = hash_password("pw123456")?;
        let second = hash_password("pw123456")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn generated_tokens_decode_to_32_bytes() {
        let session = generate_session_token();
        let verification = generate_verification_token();
        assert_eq!(
            URL_SAFE_NO_PAD.decode(session.as_bytes()).map(|b| b.len()),
            Ok(32)
        );
        assert_eq!(
            URL_SAFE_NO_PAD
                .decode(verification.as_bytes())
                .map(|b| b.len()),
            Ok(32)
        );
        assert_ne!(session, generate_session_token());
    }
}
