//! Random password generator.

use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 64;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Which character classes to draw from, and how many characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub special: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            special: true,
        }
    }
}

impl GeneratorOptions {
    fn classes(&self) -> Vec<&'static [u8]> {
        [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.digits, DIGITS),
            (self.special, SPECIAL),
        ]
        .into_iter()
        .filter_map(|(enabled, set)| enabled.then_some(set))
        .collect()
    }
}

/// Generate a password with at least one character from every selected
/// class, positions shuffled.
pub fn generate(options: &GeneratorOptions) -> Result<String> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&options.length) {
        return Err(VaultError::PolicyViolation(format!(
            "password length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {}",
            options.length
        )));
    }
    let classes = options.classes();
    if classes.is_empty() {
        return Err(VaultError::PolicyViolation(
            "select at least one character class".into(),
        ));
    }

    let mut rng = rand::rng();
    let pool: Vec<u8> = classes.concat();

    let mut chars: Vec<u8> = Vec::with_capacity(options.length);
    for set in &classes {
        chars.push(set[rng.random_range(0..set.len())]);
    }
    while chars.len() < options.length {
        chars.push(pool[rng.random_range(0..pool.len())]);
    }
    chars.shuffle(&mut rng);

    // Every byte comes from an ASCII table.
    let password = chars.iter().map(|&b| char::from(b)).collect();
    chars.zeroize();
    Ok(password)
}
