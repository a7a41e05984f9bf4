// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;

use crate::account::Account;

/// Metadata for one uploaded study document.
///
/// File content is not stored; only the descriptive metadata and
/// the download counter live here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Unique material identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Subject the material belongs to.
    pub subject: String,
    /// Semester the material targets.
    pub semester: u8,
    /// Academic year the material targets.
    pub academic_year: u16,
    /// Identifier of the uploading account.
    pub uploaded_by: String,
    /// Name of the uploader at upload time.
    #[serde(default)]
    pub uploaded_by_name: String,
    /// Upload time.
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
    /// Original file name.
    pub file_name: String,
    /// File size in bytes.
    pub file_size: u64,
    /// MIME type of the file.
    pub file_type: String,
    /// Search tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Inactive materials are hidden from students.
    pub is_active: bool,
    /// Number of confirmed deliveries or downloads.
    #[serde(default)]
    pub download_count: u64,
}

impl Material {
    /// Returns whether `account` may see this material.
    ///
    /// Only students see materials, and only active ones from their own
    /// academic year up to their current semester.
    #[must_use]
    pub fn is_visible_to(&self, account: &Account) -> bool {
        if !account.is_student() {
            return false;
        }
        account.student.as_ref().is_some_and(|profile| {
            self.is_active
                && self.semester <= profile.current_semester
                && self.academic_year == profile.academic_year
        })
    }

    /// Returns whether any of title, description or tags contains `term`,
    /// ignoring case.
    #[must_use]
    pub fn matches_term(&self, term: &str) -> bool {
        let needle: String = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }

    /// Returns the tags as a comma-separated string.
    #[must_use]
    pub fn tags_display(&self) -> String {
        self.tags.iter().cloned().collect::<Vec<String>>().join(", ")
    }
}
