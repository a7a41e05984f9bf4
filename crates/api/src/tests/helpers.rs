// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions, fixtures and fake senders.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use studyq::ChannelReport;
use studyq_audit::ClientContext;
use studyq_domain::{Account, Material, Role, StudentProfile};
use studyq_notify::{EmailMessage, EmailSender, WhatsAppMessage, WhatsAppSender};
use studyq_persistence::{MIN_PASSWORD_COST, Persistence};
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Barrier;

use crate::{AuthenticatedActor, DeliveryDispatcher};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);
pub const PUBLIC_URL: &str = "https://portal.studyq.test";

pub fn create_test_persistence() -> Persistence {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    persistence.set_password_cost(MIN_PASSWORD_COST);
    persistence
}

/// Persistence holding the demo accounts and materials.
pub fn create_seeded_persistence() -> Persistence {
    let mut persistence: Persistence = create_test_persistence();
    persistence.seed_demo_data(NOW).unwrap();
    persistence
}

pub fn create_test_client() -> ClientContext {
    ClientContext::new(
        Some(String::from("127.0.0.1")),
        Some(String::from("studyq-tests")),
    )
}

/// Stores an account with a hashed password and returns it.
pub fn insert_account(
    persistence: &mut Persistence,
    id: &str,
    username: &str,
    role: Role,
    password: &str,
) -> Account {
    let mut account: Account = Account::new(
        id.to_string(),
        username.to_string(),
        format!("{username}@studyq.test"),
        String::from("Test"),
        format!("User {id}"),
        role,
        NOW,
    );
    if role == Role::Student {
        account = account.with_student_profile(StudentProfile::new(
            2024,
            3,
            Some(String::from("+15550001111")),
        ));
    }
    account.password_hash = Some(persistence.hash_password(password).unwrap());
    persistence.save_account(&account).unwrap();
    account
}

pub fn actor_for(account: &Account) -> AuthenticatedActor {
    AuthenticatedActor::from_account(account)
}

pub fn admin_actor(persistence: &mut Persistence) -> AuthenticatedActor {
    actor_for(&persistence.get_account_by_id("admin-001").unwrap().unwrap())
}

pub fn teacher_actor(persistence: &mut Persistence) -> AuthenticatedActor {
    actor_for(&persistence.get_account_by_id("teacher-001").unwrap().unwrap())
}

pub fn student_actor(persistence: &mut Persistence) -> AuthenticatedActor {
    actor_for(&persistence.get_account_by_id("student-001").unwrap().unwrap())
}

pub fn create_test_material(id: &str, uploaded_by: &str) -> Material {
    Material {
        id: id.to_string(),
        title: format!("Material {id}"),
        description: String::from("Lecture notes"),
        subject: String::from("Mathematics"),
        semester: 2,
        academic_year: 2024,
        uploaded_by: uploaded_by.to_string(),
        uploaded_by_name: String::from("John Smith"),
        upload_date: NOW,
        file_name: String::from("notes.pdf"),
        file_size: 1024,
        file_type: String::from("application/pdf"),
        tags: BTreeSet::new(),
        is_active: true,
        download_count: 0,
    }
}

// ============================================================================
// Fake senders
// ============================================================================

/// How a fake sender behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Email sender that records every message.
pub struct FakeEmailSender {
    behavior: Behavior,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl FakeEmailSender {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailSender for FakeEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> ChannelReport {
        self.sent.lock().unwrap().push(message.clone());
        match self.behavior {
            Behavior::Succeed => ChannelReport::sent(
                format!("Email sent successfully to {}", message.to),
                Some(String::from("EMAIL_TEST")),
            ),
            Behavior::Fail => ChannelReport::failed(String::from("SendGrid API error: 500")),
            Behavior::Panic => panic!("email provider exploded"),
        }
    }
}

/// WhatsApp sender that records every message.
pub struct FakeWhatsAppSender {
    behavior: Behavior,
    pub sent: Mutex<Vec<WhatsAppMessage>>,
}

impl FakeWhatsAppSender {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl WhatsAppSender for FakeWhatsAppSender {
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> ChannelReport {
        self.sent.lock().unwrap().push(message.clone());
        match self.behavior {
            Behavior::Succeed => ChannelReport::sent(
                format!("WhatsApp message sent successfully to {}", message.to),
                Some(String::from("WA_TEST")),
            ),
            Behavior::Fail => ChannelReport::failed(String::from("Twilio API error: 400")),
            Behavior::Panic => panic!("whatsapp provider exploded"),
        }
    }
}

/// Sender pair that only completes once both channels are in flight.
pub struct RendezvousSender {
    barrier: Barrier,
}

impl RendezvousSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            barrier: Barrier::new(2),
        })
    }
}

#[async_trait]
impl EmailSender for RendezvousSender {
    async fn send_email(&self, _message: &EmailMessage) -> ChannelReport {
        self.barrier.wait().await;
        ChannelReport::sent(String::from("email ok"), None)
    }
}

#[async_trait]
impl WhatsAppSender for RendezvousSender {
    async fn send_whatsapp(&self, _message: &WhatsAppMessage) -> ChannelReport {
        self.barrier.wait().await;
        ChannelReport::sent(String::from("whatsapp ok"), None)
    }
}

pub fn dispatcher(
    email: Arc<dyn EmailSender>,
    whatsapp: Arc<dyn WhatsAppSender>,
) -> DeliveryDispatcher {
    DeliveryDispatcher::new(email, whatsapp, PUBLIC_URL)
}
