// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Outbound message rendering.

use studyq_domain::{Account, Material};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Hours a delivery link is advertised as valid.
pub const LINK_VALIDITY_HOURS: u8 = 24;

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Builds the download link for a material.
#[must_use]
pub fn download_link(public_url: &str, material_id: &str) -> String {
    format!("{}/download/{material_id}", public_url.trim_end_matches('/'))
}

/// Renders the material delivery email.
#[must_use]
pub fn material_email(material: &Material, student: &Account, link: &str) -> RenderedEmail {
    let body: String = format!(
        "Dear {name},\n\
         \n\
         The study material you requested is ready for download.\n\
         \n\
         Title: {title}\n\
         Subject: {subject}\n\
         Semester: {semester}\n\
         Student ID: {username}\n\
         \n\
         Download link: {link}\n\
         \n\
         The link is valid for {hours} hours. If the download does not work, \
         please contact your teacher.\n\
         \n\
         Best regards,\n\
         StudyQ Team\n",
        name = student.display_name(),
        title = material.title,
        subject = material.subject,
        semester = material.semester,
        username = student.username,
        hours = LINK_VALIDITY_HOURS,
    );

    RenderedEmail {
        subject: format!("Study Material: {}", material.title),
        body,
    }
}

/// Renders the material delivery WhatsApp message.
#[must_use]
pub fn material_whatsapp(material: &Material, student: &Account, link: &str) -> String {
    format!(
        "*StudyQ - Material Delivery*\n\
         \n\
         Hi {first}! Your study material is ready:\n\
         \n\
         *{title}* ({subject}, semester {semester})\n\
         \n\
         Download: {link}\n\
         Valid for {hours} hours. Need help? Contact your teacher.",
        first = student.first_name,
        title = material.title,
        subject = material.subject,
        semester = material.semester,
        hours = LINK_VALIDITY_HOURS,
    )
}

/// Renders the email that hands a new account its first password.
#[must_use]
pub fn login_credentials_email(
    account: &Account,
    temporary_password: &str,
    login_url: &str,
) -> RenderedEmail {
    let academic: String = account
        .student
        .as_ref()
        .map(|profile| {
            format!(
                "Academic Year: {}\nCurrent Semester: {}\n",
                profile.academic_year, profile.current_semester
            )
        })
        .unwrap_or_default();

    let body: String = format!(
        "Dear {name},\n\
         \n\
         An account has been created for you on StudyQ.\n\
         \n\
         Username: {username}\n\
         Password: {temporary_password}\n\
         Login URL: {login_url}\n\
         \n\
         Role: {role}\n\
         {academic}\
         \n\
         You will be asked to change this password when you first sign in. \
         Keep your credentials private.\n\
         \n\
         Best regards,\n\
         StudyQ Administration\n",
        name = account.display_name(),
        username = account.username,
        role = capitalize(account.role.as_str()),
    );

    RenderedEmail {
        subject: String::from("Your StudyQ Login Credentials"),
        body,
    }
}

/// Renders the email sent after an admin resets a password.
#[must_use]
pub fn password_reset_email(
    account: &Account,
    temporary_password: &str,
    login_url: &str,
) -> RenderedEmail {
    let body: String = format!(
        "Dear {name},\n\
         \n\
         Your password has been reset by an administrator.\n\
         \n\
         Username: {username}\n\
         New Password: {temporary_password}\n\
         Login URL: {login_url}\n\
         \n\
         You will be asked to change this password at your next sign-in. \
         If you did not expect this reset, contact your administrator.\n\
         \n\
         Best regards,\n\
         StudyQ Administration\n",
        name = account.display_name(),
        username = account.username,
    );

    RenderedEmail {
        subject: String::from("Password Reset - StudyQ"),
        body,
    }
}

/// Renders the email an admin sends to check the email channel.
#[must_use]
pub fn channel_check_email(sent_at: OffsetDateTime) -> RenderedEmail {
    RenderedEmail {
        subject: String::from("StudyQ Email Service Test"),
        body: format!(
            "This is a test email from StudyQ.\n\
             \n\
             Sent at: {timestamp}\n\
             \n\
             If you received this message, the email service is operational.\n",
            timestamp = timestamp(sent_at),
        ),
    }
}

/// Renders the message an admin sends to check the WhatsApp channel.
#[must_use]
pub fn channel_check_whatsapp(sent_at: OffsetDateTime) -> String {
    format!(
        "*StudyQ WhatsApp Test*\n\
         \n\
         Sent at: {timestamp}\n\
         The WhatsApp service is operational.",
        timestamp = timestamp(sent_at),
    )
}

fn timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
