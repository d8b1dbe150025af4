use std::ops::RangeInclusive;

use thiserror::Error;

pub const PASSWORD_LENGTH: RangeInclusive<usize> = 4..=64;
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PasswordOptionsError {
    #[error("password length must be between 4 and 64, got {0}")]
    LengthOutOfRange(usize),
}

/// Character classes and length for the password generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct PasswordOptions {
    length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_PASSWORD_LENGTH,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: false,
        }
    }
}

impl PasswordOptions {
    /// # Errors
    ///
    /// Returns `PasswordOptionsError::LengthOutOfRange` outside [`PASSWORD_LENGTH`].
    pub fn with_length(mut self, length: usize) -> Result<Self, PasswordOptionsError> {
        if !PASSWORD_LENGTH.contains(&length) {
            return Err(PasswordOptionsError::LengthOutOfRange(length));
        }
        self.length = length;
        Ok(self)
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Concatenated alphabet of the enabled classes; empty when none are.
    #[must_use]
    pub fn alphabet(&self) -> Vec<char> {
        [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .iter()
        .filter(|(enabled, _)| *enabled)
        .flat_map(|(_, chars)| chars.chars())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alphabet_excludes_symbols() {
        let alphabet = PasswordOptions::default().alphabet();
        assert_eq!(alphabet.len(), 26 + 26 + 10);
        assert!(!alphabet.contains(&'!'));
    }

    #[test]
    fn no_classes_means_empty_alphabet() {
        let options = PasswordOptions {
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: false,
            ..PasswordOptions::default()
        };
        assert!(options.alphabet().is_empty());
    }

    #[test]
    fn length_is_bounded() {
        assert!(PasswordOptions::default().with_length(3).is_err());
        assert!(PasswordOptions::default().with_length(65).is_err());
        assert_eq!(PasswordOptions::default().with_length(64).unwrap().length(), 64);
    }
}
