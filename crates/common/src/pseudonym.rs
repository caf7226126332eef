//! Pseudonym derivation for anonymous posting.
//!
//! Every account owns exactly one stable pseudonym, derived from its
//! immutable identifiers and a server-wide secret. Derivation is
//! deterministic, so everything an account writes carries the same
//! pseudonym, and one-way, so nobody without the secret can map a
//! pseudonym back to an account.
//!
//! # Examples
//!
//! ```
//! use quad_common::pseudonym::{derive_pseudonym, is_valid_pseudonym};
//!
//! let p = derive_pseudonym("u1", "a@x.com", "S").expect("secret is set");
//! let again = derive_pseudonym("u1", "a@x.com", "S").expect("secret is set");
//!
//! assert_eq!(p, again);
//! assert!(is_valid_pseudonym(&p));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{AppError, AppResult};

/// Length of a pseudonym in characters (128 bits of MAC output as hex).
pub const PSEUDONYM_LEN: usize = 32;

/// Separator between MAC input fields.
///
/// Account ids are ULIDs and emails cannot contain control characters,
/// so the concatenation is unambiguous.
const FIELD_SEPARATOR: u8 = 0x1f;

type HmacSha256 = Hmac<Sha256>;

/// Derives the stable pseudonym for an account.
///
/// The result depends only on the account id, the email, and the
/// server secret. Display name and other mutable profile fields never
/// enter the derivation, so profile edits cannot change an author's
/// pseudonym.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the server secret is empty. A missing
/// secret must never degrade into a guessable or constant pseudonym.
pub fn derive_pseudonym(account_id: &str, email: &str, secret: &str) -> AppResult<String> {
    mac_hex(account_id, email, secret, None)
}

/// Derives an alternate pseudonym for collision disambiguation.
///
/// Attempt 0 is identical to [`derive_pseudonym`]. Higher attempts fold
/// the counter into the MAC input, yielding an unrelated digest for the
/// same account. Callers persist whichever attempt first wins the
/// uniqueness race, so a collision between two accounts resolves to two
/// distinct stored pseudonyms.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the server secret is empty.
pub fn derive_pseudonym_with_nonce(
    account_id: &str,
    email: &str,
    secret: &str,
    attempt: u32,
) -> AppResult<String> {
    if attempt == 0 {
        return derive_pseudonym(account_id, email, secret);
    }
    mac_hex(account_id, email, secret, Some(attempt))
}

/// Returns whether a string has the shape of a derived pseudonym.
#[must_use]
pub fn is_valid_pseudonym(value: &str) -> bool {
    value.len() == PSEUDONYM_LEN
        && value
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[allow(clippy::expect_used)] // HMAC accepts any key size, this cannot fail
fn mac_hex(account_id: &str, email: &str, secret: &str, attempt: Option<u32>) -> AppResult<String> {
    if secret.trim().is_empty() {
        return Err(AppError::Config(
            "anonymity.server_secret is not set; refusing to derive pseudonyms".to_string(),
        ));
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(account_id.as_bytes());
    mac.update(&[FIELD_SEPARATOR]);
    mac.update(email.as_bytes());
    if let Some(attempt) = attempt {
        mac.update(&[FIELD_SEPARATOR]);
        mac.update(&attempt.to_be_bytes());
    }
    let digest = mac.finalize().into_bytes();

    Ok(hex::encode(&digest[..PSEUDONYM_LEN / 2]))
}
