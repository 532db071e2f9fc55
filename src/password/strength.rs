//! Heuristic password strength.
//!
//! One point each for length >= 8, >= 12 and >= 16, and one for each of
//! lowercase, uppercase, digit and any other character.  Seven at most.

use std::fmt;

pub const MAX_SCORE: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrengthReport {
    pub score: u8,
    pub strength: Strength,
}

impl StrengthReport {
    /// Score scaled to 0..=100.
    pub fn percent(&self) -> u8 {
        // score <= 7, so the product fits in u16.
        (u16::from(self.score) * 100 / u16::from(MAX_SCORE)) as u8
    }
}

pub fn assess(password: &str) -> StrengthReport {
    let len = password.chars().count();
    let checks = [
        len >= 8,
        len >= 12,
        len >= 16,
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ];
    let score = checks.iter().filter(|&&hit| hit).count() as u8;

    let strength = match score {
        0..=3 => Strength::Weak,
        4..=5 => Strength::Medium,
        _ => Strength::Strong,
    };
    StrengthReport { score, strength }
}
