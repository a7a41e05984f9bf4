// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Username is empty or malformed.
    InvalidUsername(String),
    /// Email address is empty or malformed.
    InvalidEmail(String),
    /// First or last name is empty or invalid.
    InvalidName(String),
    /// Role string does not name a known role.
    InvalidRole(String),
    /// Semester is outside the supported range.
    InvalidSemester {
        /// The rejected semester.
        semester: u8,
        /// The highest valid semester.
        max: u8,
    },
    /// Academic year is outside the supported range.
    InvalidAcademicYear(u16),
    /// A student account was created without its academic profile.
    MissingStudentProfile(String),
    /// WhatsApp number is malformed.
    InvalidWhatsAppNumber(String),
    /// Material title is empty or invalid.
    InvalidTitle(String),
    /// Material subject is empty or invalid.
    InvalidSubject(String),
    /// File name is empty or has no recognized extension.
    UnsupportedFileType(String),
    /// File exceeds the upload size limit.
    FileTooLarge {
        /// The rejected size in bytes.
        size: u64,
        /// The limit in bytes.
        max: u64,
    },
    /// Delivery channel string does not name a known channel.
    InvalidDeliveryChannel(String),
    /// Delivery status string does not name a known status.
    InvalidDeliveryStatus(String),
    /// Another account already uses this username.
    DuplicateUsername(String),
    /// Another account already uses this email address.
    DuplicateEmail(String),
    /// A system setting is outside its accepted range.
    SettingOutOfRange {
        /// The setting's wire name.
        setting: &'static str,
        /// The rejected value.
        value: u32,
        /// Lowest accepted value.
        min: u32,
        /// Highest accepted value.
        max: u32,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(msg) => write!(f, "Invalid username: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidRole(role) => write!(f, "Invalid role: {role}"),
            Self::InvalidSemester { semester, max } => {
                write!(f, "Invalid semester {semester}: must be between 1 and {max}")
            }
            Self::InvalidAcademicYear(year) => write!(f, "Invalid academic year: {year}"),
            Self::MissingStudentProfile(username) => {
                write!(f, "Student account '{username}' requires an academic profile")
            }
            Self::InvalidWhatsAppNumber(number) => {
                write!(f, "Invalid WhatsApp number: {number}")
            }
            Self::InvalidTitle(msg) => write!(f, "Invalid title: {msg}"),
            Self::InvalidSubject(msg) => write!(f, "Invalid subject: {msg}"),
            Self::UnsupportedFileType(name) => write!(f, "Unsupported file type: {name}"),
            Self::FileTooLarge { size, max } => {
                write!(f, "File of {size} bytes exceeds the {max} byte limit")
            }
            Self::InvalidDeliveryChannel(channel) => {
                write!(f, "Invalid delivery channel: {channel}")
            }
            Self::InvalidDeliveryStatus(status) => write!(f, "Invalid delivery status: {status}"),
            Self::DuplicateUsername(username) => {
                write!(f, "Username '{username}' is already in use")
            }
            Self::DuplicateEmail(email) => write!(f, "Email '{email}' is already in use"),
            Self::SettingOutOfRange {
                setting,
                value,
                min,
                max,
            } => write!(f, "{setting} must be between {min} and {max}, got {value}"),
        }
    }
}

impl std::error::Error for DomainError {}
