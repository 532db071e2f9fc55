//! RFC 6238 time-based one-time passwords.
//!
//! Six digits, 30-second step, HMAC-SHA1: what every authenticator app
//! expects for `otpauth://totp/` URIs without extra parameters.  The same
//! codec serves per-entry account codes and the vault-unlock second
//! factor; only the storage location of the secret differs.

use std::sync::OnceLock;

use data_encoding::{Encoding, Specification, BASE32_NOPAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::errors::{Result, VaultError};

/// Length of one time step in seconds.
pub const STEP_SECS: u64 = 30;

/// Number of digits in a code.
pub const DIGITS: u32 = 6;

/// Random bytes in a generated secret (160 bits).
pub const SECRET_BYTES: usize = 20;

/// A code for one time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpCode {
    /// Zero-padded decimal code, e.g. `"004215"`.
    pub digits: String,
    /// Seconds until the window rolls over (1..=30).
    pub remaining_secs: u64,
}

/// Generate a fresh base32 secret from the OS-seeded CSPRNG.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let secret = BASE32_NOPAD.encode(&bytes);
    zeroize::Zeroize::zeroize(&mut bytes);
    secret
}

/// Canonical form of a user-supplied secret: uppercase, no spaces or
/// dashes, no `=` padding.  Fails if the result is not valid base32.
pub fn normalize_secret(secret: &str) -> Result<String> {
    let normalized = normalize_lenient(secret);
    decode_secret(&normalized)?;
    Ok(normalized)
}

/// Seconds left in the window containing `now` (unix seconds).
pub fn remaining_seconds(now: u64) -> u64 {
    STEP_SECS - (now % STEP_SECS)
}

/// The code for the window containing `now`.
pub fn code(secret: &str, now: u64) -> Result<TotpCode> {
    let key = decode_secret(&normalize_lenient(secret))?;
    Ok(TotpCode {
        digits: hotp(&key, now / STEP_SECS)?,
        remaining_secs: remaining_seconds(now),
    })
}

/// Check `candidate` against the previous, current and next window.
///
/// Comparison is constant-time per window and all three windows are
/// always computed.  Malformed candidates are simply rejected.
pub fn verify(secret: &str, candidate: &str, now: u64) -> Result<bool> {
    let key = decode_secret(&normalize_lenient(secret))?;
    let candidate = candidate.trim();
    if candidate.len() != DIGITS as usize || !candidate.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(false);
    }

    let counter = now / STEP_SECS;
    let mut matched = subtle::Choice::from(0u8);
    for window in [counter.checked_sub(1), Some(counter), counter.checked_add(1)]
        .into_iter()
        .flatten()
    {
        let expected = hotp(&key, window)?;
        matched |= expected.as_bytes().ct_eq(candidate.as_bytes());
    }
    Ok(bool::from(matched))
}

/// Build an `otpauth://` URI for QR-code enrollment.
pub fn provisioning_uri(secret: &str, label: &str, issuer: &str) -> String {
    let secret = normalize_lenient(secret);
    if issuer.is_empty() {
        return format!(
            "otpauth://totp/{}?secret={secret}",
            urlencoding::encode(label)
        );
    }
    format!(
        "otpauth://totp/{}:{}?secret={secret}&issuer={}",
        urlencoding::encode(issuer),
        urlencoding::encode(label),
        urlencoding::encode(issuer)
    )
}

/// Current unix time in seconds.
pub fn now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

fn normalize_lenient(secret: &str) -> String {
    secret
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != '-' && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Unpadded base32 that ignores non-zero trailing bits, as issuers hand
/// out secrets whose length is not a multiple of 8 characters.
fn lenient_base32() -> &'static Encoding {
    static ENCODING: OnceLock<Encoding> = OnceLock::new();
    ENCODING.get_or_init(|| {
        let mut spec = Specification::new();
        spec.symbols.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567");
        spec.check_trailing_bits = false;
        spec.encoding().unwrap_or_else(|_| BASE32_NOPAD.clone())
    })
}

fn decode_secret(normalized: &str) -> Result<Vec<u8>> {
    if normalized.is_empty() {
        return Err(VaultError::InvalidTotpSecret);
    }
    lenient_base32()
        .decode(normalized.as_bytes())
        .map_err(|_| VaultError::InvalidTotpSecret)
}

/// RFC 4226 HOTP with dynamic truncation.
fn hotp(key: &[u8], counter: u64) -> Result<String> {
    let mut mac =
        Hmac::<Sha1>::new_from_slice(key).map_err(|_| VaultError::InvalidTotpSecret)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset]) & 0x7f) << 24
        | u32::from(digest[offset + 1]) << 16
        | u32::from(digest[offset + 2]) << 8
        | u32::from(digest[offset + 3]);

    let value = binary % 10u32.pow(DIGITS);
    Ok(format!("{value:0width$}", width = DIGITS as usize))
}
