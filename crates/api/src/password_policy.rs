// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password policy validation and temporary password generation.

use rand::seq::{IndexedRandom, SliceRandom};
use studyq_domain::SystemSettings;
use thiserror::Error;

/// Symbols that satisfy the special-character rule.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Shortest generated temporary password.
pub const TEMPORARY_PASSWORD_LENGTH: usize = 12;

/// Alphabet for temporary passwords. Look-alike characters (I, L, O, l,
/// o, 0, 1) are left out.
const TEMPORARY_ALPHABET: &str = "ABCDEFGHJKMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789!@#$%&*";

/// One violated password rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordViolation {
    /// Password is too short.
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// No lowercase letter.
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    /// No uppercase letter.
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    /// No digit.
    #[error("Password must contain at least one number")]
    MissingDigit,

    /// No symbol from `PASSWORD_SYMBOLS`.
    #[error("Password must contain at least one special character")]
    MissingSymbol,

    /// Password and confirmation do not match.
    #[error("New passwords do not match")]
    ConfirmationMismatch,
}

/// The result of checking a password against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// True when no rule is violated.
    pub is_valid: bool,
    /// Every violated rule, in rule order.
    pub violations: Vec<PasswordViolation>,
}

impl PasswordStrength {
    fn from_violations(violations: Vec<PasswordViolation>) -> Self {
        Self {
            is_valid: violations.is_empty(),
            violations,
        }
    }

    /// Returns the violation messages.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

/// Password policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum password length in characters.
    pub min_length: usize,
    /// Require a lowercase letter.
    pub require_lowercase: bool,
    /// Require an uppercase letter.
    pub require_uppercase: bool,
    /// Require a digit.
    pub require_digit: bool,
    /// Require a symbol from `PASSWORD_SYMBOLS`.
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
            require_symbol: true,
        }
    }
}

impl PasswordPolicy {
    /// Builds the policy from the stored system settings.
    #[must_use]
    pub fn from_settings(settings: &SystemSettings) -> Self {
        Self {
            min_length: usize::try_from(settings.password_min_length).unwrap_or(usize::MAX),
            require_lowercase: settings.require_lowercase,
            require_uppercase: settings.require_uppercase,
            require_digit: settings.require_numbers,
            require_symbol: settings.require_special_chars,
        }
    }

    /// Checks every rule independently so all violations are reported.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to check
    #[must_use]
    pub fn validate_strength(&self, password: &str) -> PasswordStrength {
        let mut violations: Vec<PasswordViolation> = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(PasswordViolation::TooShort {
                min_length: self.min_length,
            });
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push(PasswordViolation::MissingLowercase);
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push(PasswordViolation::MissingUppercase);
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordViolation::MissingDigit);
        }
        if self.require_symbol && !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
            violations.push(PasswordViolation::MissingSymbol);
        }

        PasswordStrength::from_violations(violations)
    }

    /// Validates a new password and its confirmation.
    ///
    /// A mismatched confirmation is reported first, followed by any
    /// strength violations of the new password.
    #[must_use]
    pub fn validate_change(&self, new_password: &str, confirmation: &str) -> PasswordStrength {
        let mut violations: Vec<PasswordViolation> = Vec::new();
        if new_password != confirmation {
            violations.push(PasswordViolation::ConfirmationMismatch);
        }
        violations.extend(self.validate_strength(new_password).violations);
        PasswordStrength::from_violations(violations)
    }
}

/// Generates a temporary password that satisfies `policy`.
///
/// One character is drawn from each class, the rest from the full
/// alphabet, and the result is shuffled. The password is never shorter
/// than `TEMPORARY_PASSWORD_LENGTH`.
#[must_use]
pub fn generate_temporary_password(policy: &PasswordPolicy) -> String {
    let length: usize = policy.min_length.max(TEMPORARY_PASSWORD_LENGTH);
    let alphabet: Vec<char> = TEMPORARY_ALPHABET.chars().collect();
    let classes: [Vec<char>; 4] = [
        alphabet.iter().copied().filter(char::is_ascii_uppercase).collect(),
        alphabet.iter().copied().filter(char::is_ascii_lowercase).collect(),
        alphabet.iter().copied().filter(char::is_ascii_digit).collect(),
        alphabet
            .iter()
            .copied()
            .filter(|c| !c.is_ascii_alphanumeric())
            .collect(),
    ];

    let mut rng = rand::rng();
    let mut password: Vec<char> = classes
        .iter()
        .filter_map(|class| class.choose(&mut rng).copied())
        .collect();
    let remaining: usize = length.saturating_sub(password.len());
    password.extend((0..remaining).filter_map(|_| alphabet.choose(&mut rng).copied()));

    password.shuffle(&mut rng);
    password.into_iter().collect()
}
