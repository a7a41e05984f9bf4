// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side queries over the material catalog.

use std::collections::BTreeSet;
use studyq_domain::{Account, Material};

/// Filters for a catalog search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialQuery {
    /// Free-text term matched against title, description and tags.
    pub term: Option<String>,
    /// Only this semester.
    pub semester: Option<u8>,
    /// Only this subject (exact match).
    pub subject: Option<String>,
}

/// Returns the materials `student` may see, newest upload first.
#[must_use]
pub fn materials_for_student<'a>(materials: &'a [Material], student: &Account) -> Vec<&'a Material> {
    let mut visible: Vec<&Material> = materials
        .iter()
        .filter(|material| material.is_visible_to(student))
        .collect();
    visible.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
    visible
}

/// Returns the materials uploaded by one account, active or not, newest first.
#[must_use]
pub fn materials_by_uploader<'a>(materials: &'a [Material], uploader_id: &str) -> Vec<&'a Material> {
    let mut owned: Vec<&Material> = materials
        .iter()
        .filter(|material| material.uploaded_by == uploader_id)
        .collect();
    owned.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
    owned
}

/// Searches active materials.
///
/// Every filter that is set must match.
#[must_use]
pub fn search_materials<'a>(materials: &'a [Material], query: &MaterialQuery) -> Vec<&'a Material> {
    materials
        .iter()
        .filter(|material| material.is_active)
        .filter(|material| {
            query
                .term
                .as_deref()
                .is_none_or(|term| material.matches_term(term))
        })
        .filter(|material| query.semester.is_none_or(|s| material.semester == s))
        .filter(|material| {
            query
                .subject
                .as_deref()
                .is_none_or(|subject| material.subject == subject)
        })
        .collect()
}

/// Returns the distinct subjects across all materials, sorted.
#[must_use]
pub fn subjects(materials: &[Material]) -> Vec<String> {
    materials
        .iter()
        .map(|material| material.subject.clone())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyq_domain::{Role, StudentProfile};
    use time::Duration;
    use time::macros::datetime;

    fn material(id: &str, subject: &str, semester: u8, minutes: i64) -> Material {
        Material {
            id: id.to_string(),
            title: format!("Title {id}"),
            description: String::from("lecture notes"),
            subject: subject.to_string(),
            semester,
            academic_year: 2024,
            uploaded_by: String::from("teacher-001"),
            uploaded_by_name: String::from("John Smith"),
            upload_date: datetime!(2026-01-01 00:00 UTC) + Duration::minutes(minutes),
            file_name: format!("{id}.pdf"),
            file_size: 10,
            file_type: String::from("application/pdf"),
            tags: BTreeSet::from([String::from("core")]),
            is_active: true,
            download_count: 0,
        }
    }

    fn student(semester: u8) -> Account {
        Account::new(
            String::from("s1"),
            String::from("john.doe"),
            String::from("john.doe@student.edu"),
            String::from("John"),
            String::from("Doe"),
            Role::Student,
            datetime!(2026-01-01 00:00 UTC),
        )
        .with_student_profile(StudentProfile::new(2024, semester, None))
    }

    #[test]
    fn test_materials_for_student_applies_visibility_newest_first() {
        let materials: Vec<Material> = vec![
            material("A", "CS", 1, 0),
            material("B", "CS", 3, 10),
            material("C", "CS", 4, 20),
        ];
        let ids: Vec<&str> = materials_for_student(&materials, &student(3))
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_materials_by_uploader_includes_inactive() {
        let mut hidden: Material = material("A", "CS", 1, 0);
        hidden.is_active = false;
        let mut other: Material = material("B", "CS", 1, 5);
        other.uploaded_by = String::from("teacher-002");
        let materials: Vec<Material> = vec![hidden, other];

        let owned: Vec<&Material> = materials_by_uploader(&materials, "teacher-001");
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, "A");
    }

    #[test]
    fn test_search_combines_filters_and_skips_inactive() {
        let mut inactive: Material = material("D", "Math", 2, 0);
        inactive.is_active = false;
        let materials: Vec<Material> = vec![
            material("A", "CS", 1, 0),
            material("B", "Math", 2, 0),
            material("C", "Math", 3, 0),
            inactive,
        ];

        let query: MaterialQuery = MaterialQuery {
            term: Some(String::from("LECTURE")),
            semester: Some(2),
            subject: Some(String::from("Math")),
        };
        let ids: Vec<&str> = search_materials(&materials, &query)
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["B"]);

        assert_eq!(
            search_materials(&materials, &MaterialQuery::default()).len(),
            3
        );
    }

    #[test]
    fn test_subjects_sorted_and_unique() {
        let materials: Vec<Material> = vec![
            material("A", "Physics", 1, 0),
            material("B", "Chemistry", 1, 0),
            material("C", "Physics", 1, 0),
        ];
        assert_eq!(
            subjects(&materials),
            vec![String::from("Chemistry"), String::from("Physics")]
        );
    }
}
