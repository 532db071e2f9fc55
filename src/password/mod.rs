//! Password helpers for entry creation: a random generator and a
//! heuristic strength score.

pub mod generator;
pub mod strength;

pub use generator::{generate, GeneratorOptions};
pub use strength::{assess, Strength, StrengthReport};
