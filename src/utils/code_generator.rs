//! Short code generation strategies.
//!
//! Two interchangeable [`CodeGenerator`] implementations:
//!
//! - [`RandomGenerator`] - uniform random codes over a 62-symbol alphabet
//! - [`HashGenerator`] - leading hex characters of the SHA-256 digest of the input
//!
//! Both produce codes of a fixed length and fail only on blank input.

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Symbols used by [`RandomGenerator`].
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Longest supported code. Bounded by the 64 hex characters of a SHA-256 digest.
pub const MAX_CODE_LENGTH: usize = 64;

/// Errors that can occur during code generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("input must not be blank")]
    EmptyInput,

    #[error("code length must be between 1 and {MAX_CODE_LENGTH}, got {0}")]
    InvalidLength(usize),
}

/// Produces a candidate short code for an input string.
///
/// Implementations must be safe to call concurrently.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    /// Generates a code for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::EmptyInput`] if `input` is blank after trimming.
    fn generate(&self, input: &str) -> Result<String, GeneratorError>;
}

fn check_length(length: usize) -> Result<usize, GeneratorError> {
    if length == 0 || length > MAX_CODE_LENGTH {
        return Err(GeneratorError::InvalidLength(length));
    }
    Ok(length)
}

fn ensure_not_blank(input: &str) -> Result<(), GeneratorError> {
    if input.trim().is_empty() {
        return Err(GeneratorError::EmptyInput);
    }
    Ok(())
}

/// Random alphanumeric codes.
///
/// Owns its RNG, seeded from the OS at construction and guarded by a mutex, so
/// independent generators never share state.
#[derive(Debug)]
pub struct RandomGenerator {
    length: usize,
    rng: Mutex<StdRng>,
}

impl RandomGenerator {
    /// Creates a generator producing codes of `length` symbols.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidLength`] unless `1 <= length <= 64`.
    pub fn new(length: usize) -> Result<Self, GeneratorError> {
        Ok(Self {
            length: check_length(length)?,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }
}

impl CodeGenerator for RandomGenerator {
    fn generate(&self, input: &str) -> Result<String, GeneratorError> {
        ensure_not_blank(input)?;

        // The RNG state stays valid even if a holder panicked.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        Ok((0..self.length)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect())
    }
}

/// Deterministic codes derived from the SHA-256 digest of the input.
///
/// The same input always maps to the same code, which makes retries
/// idempotent. Distinct inputs sharing a digest prefix collide.
#[derive(Debug, Clone)]
pub struct HashGenerator {
    length: usize,
}

impl HashGenerator {
    /// Creates a generator producing codes of `length` hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidLength`] unless `1 <= length <= 64`.
    pub fn new(length: usize) -> Result<Self, GeneratorError> {
        Ok(Self {
            length: check_length(length)?,
        })
    }
}

impl CodeGenerator for HashGenerator {
    fn generate(&self, input: &str) -> Result<String, GeneratorError> {
        ensure_not_blank(input)?;

        let mut code = hex::encode(Sha256::digest(input.as_bytes()));
        code.truncate(self.length);
        Ok(code)
    }
}

/// Selects a [`CodeGenerator`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Random,
    Hash,
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "hash" => Ok(Self::Hash),
            other => Err(format!(
                "unknown code generator '{other}', expected 'random' or 'hash'"
            )),
        }
    }
}

/// Builds the configured generator.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidLength`] for an unsupported length.
pub fn build_generator(
    kind: GeneratorKind,
    length: usize,
) -> Result<Arc<dyn CodeGenerator>, GeneratorError> {
    Ok(match kind {
        GeneratorKind::Random => Arc::new(RandomGenerator::new(length)?),
        GeneratorKind::Hash => Arc::new(HashGenerator::new(length)?),
    })
}
