// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Material delivery over email and WhatsApp.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use studyq::{
    ChannelReport, DeliveryOutcome, RenderedEmail, aggregate, download_link, material_email,
    material_whatsapp,
};
use studyq_domain::{Account, DeliveryChannel, DeliveryLog, DeliveryStatus, Material};
use studyq_notify::{Attachment, EmailMessage, EmailSender, WhatsAppMessage, WhatsAppSender};
use studyq_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::error::ApiError;

/// Reported for a WhatsApp request when the student has no number on file.
pub const MISSING_WHATSAPP_NUMBER: &str = "No WhatsApp number on file";

/// One channel's report, flagged when the sender panicked instead of
/// returning.
struct SenderReport {
    report: ChannelReport,
    panicked: bool,
}

impl SenderReport {
    const fn completed(report: ChannelReport) -> Self {
        Self {
            report,
            panicked: false,
        }
    }

    fn panicked(message: &str) -> Self {
        Self {
            report: ChannelReport::failed(message.to_string()),
            panicked: true,
        }
    }
}

/// Sends materials to students and records one delivery log per request.
#[derive(Clone)]
pub struct DeliveryDispatcher {
    email: Arc<dyn EmailSender>,
    whatsapp: Arc<dyn WhatsAppSender>,
    public_url: String,
}

impl std::fmt::Debug for DeliveryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryDispatcher")
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl DeliveryDispatcher {
    /// Creates a dispatcher.
    ///
    /// # Arguments
    ///
    /// * `email` - The email channel
    /// * `whatsapp` - The WhatsApp channel
    /// * `public_url` - Origin used to build download links
    #[must_use]
    pub fn new(
        email: Arc<dyn EmailSender>,
        whatsapp: Arc<dyn WhatsAppSender>,
        public_url: &str,
    ) -> Self {
        Self {
            email,
            whatsapp,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the email channel, for credential mail.
    #[must_use]
    pub fn email_sender(&self) -> &dyn EmailSender {
        self.email.as_ref()
    }

    /// Returns the WhatsApp channel.
    #[must_use]
    pub fn whatsapp_sender(&self) -> &dyn WhatsAppSender {
        self.whatsapp.as_ref()
    }

    /// Returns the origin used in links.
    #[must_use]
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    /// Delivers a material to a student over the requested channel(s).
    ///
    /// The persistence lock is taken to read the material and the student,
    /// released for the sends, and taken again to write the log. For
    /// `Both`, the two sends run concurrently and both finish before the
    /// log is written. A sender that panics counts as a failed channel; if
    /// the request fails overall after a panic, the outcome carries the
    /// generic system-error message.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The shared store
    /// * `material_id` - The material to deliver
    /// * `student_id` - The receiving student
    /// * `channel` - Requested channel(s)
    /// * `now` - Timestamp for the log entry
    ///
    /// # Returns
    ///
    /// The aggregated outcome. Failing channels are part of the outcome,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the material or student does not
    /// exist; nothing is sent or logged in that case. Returns `Internal`
    /// if the lookup itself fails.
    pub async fn deliver(
        &self,
        persistence: &Mutex<Persistence>,
        material_id: &str,
        student_id: &str,
        channel: DeliveryChannel,
        now: OffsetDateTime,
    ) -> Result<DeliveryOutcome, ApiError> {
        let mut store: MutexGuard<'_, Persistence> = persistence.lock().await;
        let material: Option<Material> = store.get_material(material_id)?;
        let student: Option<Account> = store
            .get_account_by_id(student_id)?
            .filter(Account::is_student);
        drop(store);

        let (Some(material), Some(student)) = (material, student) else {
            return Err(ApiError::ResourceNotFound {
                resource_type: String::from("Delivery target"),
                message: String::from("Material or student not found"),
            });
        };

        let link: String = download_link(&self.public_url, &material.id);
        let whatsapp_number: Option<String> = student.whatsapp_number().map(String::from);

        let email_send = async {
            if !channel.includes_email() {
                return None;
            }
            let rendered: RenderedEmail = material_email(&material, &student, &link);
            let message: EmailMessage = EmailMessage {
                to: student.email.clone(),
                subject: rendered.subject,
                body: rendered.body,
                attachment: Some(Attachment {
                    title: material.title.clone(),
                    url: link.clone(),
                }),
            };
            let sent: Result<ChannelReport, _> = AssertUnwindSafe(self.email.send_email(&message))
                .catch_unwind()
                .await;
            Some(sent.map_or_else(
                |_| {
                    error!(material_id = %material.id, "Email sender panicked");
                    SenderReport::panicked("Email delivery failed unexpectedly")
                },
                SenderReport::completed,
            ))
        };

        let whatsapp_send = async {
            if !channel.includes_whatsapp() {
                return None;
            }
            let Some(number) = whatsapp_number.as_deref() else {
                warn!(student_id = %student.id, "WhatsApp requested without a number on file");
                return Some(SenderReport::completed(ChannelReport::failed(String::from(
                    MISSING_WHATSAPP_NUMBER,
                ))));
            };
            let message: WhatsAppMessage = WhatsAppMessage {
                to: number.to_string(),
                body: material_whatsapp(&material, &student, &link),
                media_url: None,
            };
            let sent: Result<ChannelReport, _> =
                AssertUnwindSafe(self.whatsapp.send_whatsapp(&message))
                    .catch_unwind()
                    .await;
            Some(sent.map_or_else(
                |_| {
                    error!(material_id = %material.id, "WhatsApp sender panicked");
                    SenderReport::panicked("WhatsApp delivery failed unexpectedly")
                },
                SenderReport::completed,
            ))
        };

        let (email_report, whatsapp_report): (Option<SenderReport>, Option<SenderReport>) =
            futures::join!(email_send, whatsapp_send);
        let any_panicked: bool = [&email_report, &whatsapp_report]
            .iter()
            .any(|report| report.as_ref().is_some_and(|r| r.panicked));

        let mut outcome: DeliveryOutcome = aggregate(
            channel,
            email_report.as_ref().map(|r| &r.report),
            whatsapp_report.as_ref().map(|r| &r.report),
        );
        if !outcome.success && any_panicked {
            outcome = DeliveryOutcome::system_failure();
        }
        let status: DeliveryStatus = outcome.status();

        let log: DeliveryLog = DeliveryLog {
            id: format!("DL-{}", uuid::Uuid::new_v4()),
            material_id: material.id.clone(),
            material_title: material.title.clone(),
            student_id: student.id.clone(),
            student_name: student.display_name(),
            channel,
            status,
            message: outcome.message.clone(),
            timestamp: now,
            recipient_email: channel.includes_email().then(|| student.email.clone()),
            recipient_whatsapp: if channel.includes_whatsapp() {
                whatsapp_number
            } else {
                None
            },
        };

        let mut store: MutexGuard<'_, Persistence> = persistence.lock().await;
        if let Err(e) = store.append_delivery_log(log) {
            error!(error = %e, material_id = %material.id, "Failed to record delivery log");
        }
        let counted: Result<u64, _> = if status == DeliveryStatus::Sent {
            store.increment_download_count(&material.id)
        } else {
            Ok(material.download_count)
        };
        if let Err(e) = counted {
            error!(error = %e, material_id = %material.id, "Failed to update download count");
        }
        drop(store);

        info!(
            material_id = %material.id,
            student_id = %student.id,
            channel = channel.as_str(),
            status = status.as_str(),
            "Delivery finished"
        );

        Ok(outcome)
    }
}
