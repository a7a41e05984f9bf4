// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeSet;

use crate::account::{Account, StudentProfile};
use crate::error::DomainError;
use crate::material::Material;

/// Highest semester a student or material may carry.
pub const MAX_SEMESTER: u8 = 8;

/// Upload size limit in bytes (50 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// File extensions accepted for uploads.
pub const ALLOWED_FILE_EXTENSIONS: [&str; 8] =
    ["pdf", "doc", "docx", "ppt", "pptx", "txt", "jpg", "png"];

const MIN_ACADEMIC_YEAR: u16 = 2000;
const MAX_ACADEMIC_YEAR: u16 = 2100;

/// Validates the identity fields of an account and, for students, its profile.
///
/// # Errors
///
/// Returns an error if any field is empty or malformed, or if a student
/// account has no academic profile.
pub fn validate_account_fields(account: &Account) -> Result<(), DomainError> {
    validate_username(&account.username)?;
    validate_email(&account.email)?;

    if account.first_name.trim().is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "First name cannot be empty",
        )));
    }
    if account.last_name.trim().is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Last name cannot be empty",
        )));
    }

    if account.is_student() {
        let profile: &StudentProfile = account
            .student
            .as_ref()
            .ok_or_else(|| DomainError::MissingStudentProfile(account.username.clone()))?;
        validate_academic_year(profile.academic_year)?;
        validate_semester(profile.current_semester)?;
        if let Some(number) = &profile.whatsapp_number {
            validate_whatsapp_number(number)?;
        }
    }

    Ok(())
}

/// Validates a login name.
///
/// # Errors
///
/// Returns an error if the username is empty or contains whitespace.
pub fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.trim().is_empty() {
        return Err(DomainError::InvalidUsername(String::from(
            "Username cannot be empty",
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidUsername(format!(
            "Username '{username}' must not contain whitespace"
        )));
    }
    Ok(())
}

/// Validates an email address.
///
/// Only the basic `local@domain` shape is checked.
///
/// # Errors
///
/// Returns an error if the address is empty or lacks a local part or domain.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let trimmed: &str = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(())
        }
        _ => Err(DomainError::InvalidEmail(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

/// Validates a semester number.
///
/// # Errors
///
/// Returns an error if the semester is outside `1..=MAX_SEMESTER`.
pub const fn validate_semester(semester: u8) -> Result<(), DomainError> {
    if semester == 0 || semester > MAX_SEMESTER {
        return Err(DomainError::InvalidSemester {
            semester,
            max: MAX_SEMESTER,
        });
    }
    Ok(())
}

/// Validates an academic year.
///
/// # Errors
///
/// Returns an error if the year is outside the supported range.
pub const fn validate_academic_year(year: u16) -> Result<(), DomainError> {
    if year < MIN_ACADEMIC_YEAR || year > MAX_ACADEMIC_YEAR {
        return Err(DomainError::InvalidAcademicYear(year));
    }
    Ok(())
}

/// Validates a WhatsApp number.
///
/// Accepts an optional `whatsapp:` prefix, an optional leading `+`, and
/// spaces or dashes between 7 to 15 digits.
///
/// # Errors
///
/// Returns an error if the number is malformed.
pub fn validate_whatsapp_number(number: &str) -> Result<(), DomainError> {
    let trimmed: &str = number.trim();
    let without_prefix: &str = trimmed.strip_prefix("whatsapp:").unwrap_or(trimmed);
    let without_plus: &str = without_prefix
        .strip_prefix('+')
        .unwrap_or(without_prefix);

    let mut digits: usize = 0;
    for c in without_plus.chars() {
        if c.is_ascii_digit() {
            digits += 1;
        } else if c != ' ' && c != '-' {
            return Err(DomainError::InvalidWhatsAppNumber(number.to_string()));
        }
    }

    if !(7..=15).contains(&digits) {
        return Err(DomainError::InvalidWhatsAppNumber(number.to_string()));
    }
    Ok(())
}

/// Validates the descriptive fields of a material and its file metadata.
///
/// # Errors
///
/// Returns an error if the title or subject is empty, the semester or year
/// is out of range, or the file is too large or of an unsupported type.
pub fn validate_material_fields(material: &Material) -> Result<(), DomainError> {
    if material.title.trim().is_empty() {
        return Err(DomainError::InvalidTitle(String::from(
            "Title cannot be empty",
        )));
    }
    if material.subject.trim().is_empty() {
        return Err(DomainError::InvalidSubject(String::from(
            "Subject cannot be empty",
        )));
    }
    validate_semester(material.semester)?;
    validate_academic_year(material.academic_year)?;
    validate_file(&material.file_name, material.file_size)
}

/// Validates an upload's file name and size.
///
/// # Errors
///
/// Returns an error if the extension is not allowed or the size exceeds
/// `MAX_FILE_SIZE_BYTES`.
pub fn validate_file(file_name: &str, file_size: u64) -> Result<(), DomainError> {
    let extension: Option<String> = file_extension(file_name);
    let allowed: bool = extension
        .as_deref()
        .is_some_and(|ext| ALLOWED_FILE_EXTENSIONS.contains(&ext));
    if !allowed {
        return Err(DomainError::UnsupportedFileType(file_name.to_string()));
    }

    if file_size > MAX_FILE_SIZE_BYTES {
        return Err(DomainError::FileTooLarge {
            size: file_size,
            max: MAX_FILE_SIZE_BYTES,
        });
    }
    Ok(())
}

/// Returns the lowercase extension of a file name, if it has one.
#[must_use]
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Returns the MIME type for an allowed extension.
#[must_use]
pub fn mime_type_for(file_name: &str) -> &'static str {
    match file_extension(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("txt") => "text/plain",
        Some("jpg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Splits a comma-separated tag list into a set of trimmed, non-empty tags.
#[must_use]
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Derives the `first.last` login name for a new account.
#[must_use]
pub fn username_for(first_name: &str, last_name: &str) -> String {
    let clean = |part: &str| -> String {
        part.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    };
    format!("{}.{}", clean(first_name), clean(last_name))
}

/// Ensures no other account shares the candidate's username or email.
///
/// An existing record with the same id is the candidate itself and is ignored.
///
/// # Errors
///
/// Returns an error naming the first conflicting field.
pub fn validate_account_unique(
    existing: &[Account],
    candidate: &Account,
) -> Result<(), DomainError> {
    for other in existing.iter().filter(|a| a.id != candidate.id) {
        if other.username == candidate.username {
            return Err(DomainError::DuplicateUsername(candidate.username.clone()));
        }
        if other.email.eq_ignore_ascii_case(&candidate.email) {
            return Err(DomainError::DuplicateEmail(candidate.email.clone()));
        }
    }
    Ok(())
}
