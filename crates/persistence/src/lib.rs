// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the StudyQ material portal.
//!
//! Accounts, materials, audit events and delivery logs are each kept as a
//! JSON array under a fixed key of a durable key-value store; the system
//! settings are a single JSON object under their own key. Every
//! operation is a whole-collection read-modify-write, so callers that share
//! a `Persistence` across tasks must serialise access (the server holds it
//! behind a mutex).
//!
//! ## Backends
//!
//! - **`SQLite`** (default): Diesel with embedded migrations; in-memory
//!   databases for tests, WAL-mode files for deployments
//! - **Memory**: a plain map, for tests that do not need SQL
//!
//! ## Passwords
//!
//! Only bcrypt hashes are stored. The hashing cost defaults to
//! `bcrypt::DEFAULT_COST` and can be lowered for tests.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use studyq_audit::{AuditEvent, AuditTrail};
use studyq_domain::{Account, DeliveryLog, Material, SystemSettings};
use time::OffsetDateTime;
use tracing::{debug, info};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod seed;

#[cfg(test)]
mod tests;

pub use backend::KeyValueStore;
pub use backend::memory::MemoryKeyValueStore;
pub use backend::sqlite::SqliteKeyValueStore;
pub use data_models::SeedSummary;
pub use error::PersistenceError;
pub use seed::DEMO_TEACHER_ID;

/// Storage key of the account collection.
pub const USERS_KEY: &str = "study_platform_users";
/// Storage key of the material collection.
pub const MATERIALS_KEY: &str = "study_platform_materials";
/// Storage key of the audit trail.
pub const AUDIT_LOGS_KEY: &str = "study_platform_audit_logs";
/// Storage key of the delivery log.
pub const DELIVERY_LOGS_KEY: &str = "study_platform_delivery_logs";
/// Storage key of the system settings document.
pub const SETTINGS_KEY: &str = "study_platform_settings";

/// Maximum number of delivery log entries retained; older entries drop off.
pub const DELIVERY_LOG_CAPACITY: usize = 1000;

/// Lowest bcrypt cost accepted by `set_password_cost`.
pub const MIN_PASSWORD_COST: u32 = 4;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID, so
/// concurrently running tests never share a database.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter for every portal collection.
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
    password_cost: u32,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("password_cost", &self.password_cost)
            .finish_non_exhaustive()
    }
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;

        Ok(Self::with_store(Box::new(SqliteKeyValueStore::new(conn))))
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;

        Ok(Self::with_store(Box::new(SqliteKeyValueStore::new(conn))))
    }

    /// Creates a persistence adapter over any key-value store.
    #[must_use]
    pub fn with_store(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Sets the bcrypt cost used for new hashes, clamped to the minimum
    /// bcrypt accepts.
    pub fn set_password_cost(&mut self, cost: u32) {
        self.password_cost = cost.max(MIN_PASSWORD_COST);
    }

    fn load<T: DeserializeOwned>(&mut self, key: &str) -> Result<Vec<T>, PersistenceError> {
        match self.store.get(key)? {
            Some(raw) => {
                let items: Vec<T> = serde_json::from_str(&raw)?;
                Ok(items)
            }
            None => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<(), PersistenceError> {
        let raw: String = serde_json::to_string(items)?;
        self.store.set(key, &raw)
    }

    // ========================================================================
    // Passwords
    // ========================================================================

    /// Hashes a password with the configured cost.
    ///
    /// # Errors
    ///
    /// Returns an error if bcrypt rejects the input.
    pub fn hash_password(&self, password: &str) -> Result<String, PersistenceError> {
        bcrypt::hash(password, self.password_cost)
            .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))
    }

    /// Verifies a password against a stored hash.
    ///
    /// An empty password never matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed.
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
        if password.is_empty() {
            return Ok(false);
        }
        bcrypt::verify(password, password_hash)
            .map_err(|e| PersistenceError::Other(format!("Failed to verify password: {e}")))
    }

    /// Replaces an account's password hash.
    ///
    /// # Returns
    ///
    /// The updated account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id, or an error if hashing
    /// or storage fails.
    pub fn set_account_password(
        &mut self,
        account_id: &str,
        password: &str,
    ) -> Result<Account, PersistenceError> {
        let mut account: Account = self
            .get_account_by_id(account_id)?
            .ok_or_else(|| PersistenceError::AccountNotFound(account_id.to_string()))?;
        account.password_hash = Some(self.hash_password(password)?);
        self.save_account(&account)?;
        info!(account_id, "Account password updated");
        Ok(account)
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Lists every account in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be read.
    pub fn list_accounts(&mut self) -> Result<Vec<Account>, PersistenceError> {
        self.load(USERS_KEY)
    }

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be read.
    pub fn get_account_by_id(&mut self, id: &str) -> Result<Option<Account>, PersistenceError> {
        Ok(self.list_accounts()?.into_iter().find(|a| a.id == id))
    }

    /// Looks up an account by exact username.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be read.
    pub fn get_account_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Account>, PersistenceError> {
        Ok(self
            .list_accounts()?
            .into_iter()
            .find(|a| a.username == username))
    }

    /// Inserts or replaces an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    pub fn save_account(&mut self, account: &Account) -> Result<(), PersistenceError> {
        let mut accounts: Vec<Account> = self.list_accounts()?;
        match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        self.save(USERS_KEY, &accounts)?;
        debug!(account_id = %account.id, "Saved account");
        Ok(())
    }

    /// Removes an account.
    ///
    /// # Returns
    ///
    /// Whether an account was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    pub fn delete_account(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let mut accounts: Vec<Account> = self.list_accounts()?;
        let before: usize = accounts.len();
        accounts.retain(|a| a.id != id);
        if accounts.len() == before {
            return Ok(false);
        }
        self.save(USERS_KEY, &accounts)?;
        info!(account_id = id, "Deleted account");
        Ok(true)
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Lists every material in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be read.
    pub fn list_materials(&mut self) -> Result<Vec<Material>, PersistenceError> {
        self.load(MATERIALS_KEY)
    }

    /// Looks up a material by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be read.
    pub fn get_material(&mut self, id: &str) -> Result<Option<Material>, PersistenceError> {
        Ok(self.list_materials()?.into_iter().find(|m| m.id == id))
    }

    /// Inserts or replaces a material by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    pub fn save_material(&mut self, material: &Material) -> Result<(), PersistenceError> {
        let mut materials: Vec<Material> = self.list_materials()?;
        match materials.iter_mut().find(|m| m.id == material.id) {
            Some(existing) => *existing = material.clone(),
            None => materials.push(material.clone()),
        }
        self.save(MATERIALS_KEY, &materials)?;
        debug!(material_id = %material.id, "Saved material");
        Ok(())
    }

    /// Removes a material.
    ///
    /// # Returns
    ///
    /// Whether a material was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    pub fn delete_material(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let mut materials: Vec<Material> = self.list_materials()?;
        let before: usize = materials.len();
        materials.retain(|m| m.id != id);
        if materials.len() == before {
            return Ok(false);
        }
        self.save(MATERIALS_KEY, &materials)?;
        info!(material_id = id, "Deleted material");
        Ok(true)
    }

    /// Adds one to a material's download counter.
    ///
    /// # Returns
    ///
    /// The new count.
    ///
    /// # Errors
    ///
    /// Returns `MaterialNotFound` for an unknown id, or a storage error.
    pub fn increment_download_count(&mut self, id: &str) -> Result<u64, PersistenceError> {
        let mut materials: Vec<Material> = self.list_materials()?;
        let material: &mut Material = materials
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| PersistenceError::MaterialNotFound(id.to_string()))?;
        material.download_count = material.download_count.saturating_add(1);
        let count: u64 = material.download_count;
        self.save(MATERIALS_KEY, &materials)?;
        debug!(material_id = id, count, "Incremented download count");
        Ok(count)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Reads the audit trail, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored trail cannot be read.
    pub fn audit_trail(&mut self) -> Result<AuditTrail, PersistenceError> {
        let events: Vec<AuditEvent> = self.load(AUDIT_LOGS_KEY)?;
        Ok(AuditTrail::from_events(events))
    }

    /// Prepends an event to the audit trail, dropping the oldest entries
    /// beyond its capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the trail cannot be read or written.
    pub fn record_audit_event(&mut self, event: AuditEvent) -> Result<(), PersistenceError> {
        let mut trail: AuditTrail = self.audit_trail()?;
        debug!(
            action = %event.action(),
            actor = event.actor_id(),
            "Recording audit event"
        );
        trail.record(event);
        self.save(AUDIT_LOGS_KEY, trail.events())
    }

    /// Drops audit events recorded before `cutoff`.
    ///
    /// # Returns
    ///
    /// How many events were dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the trail cannot be read or written.
    pub fn prune_audit_events(&mut self, cutoff: OffsetDateTime) -> Result<usize, PersistenceError> {
        let mut trail: AuditTrail = self.audit_trail()?;
        let dropped: usize = trail.retain_since(cutoff);
        if dropped > 0 {
            self.save(AUDIT_LOGS_KEY, trail.events())?;
            info!(dropped, "Pruned audit events past retention");
        }
        Ok(dropped)
    }

    // ========================================================================
    // Delivery logs
    // ========================================================================

    /// Prepends a delivery log entry, dropping the oldest entries beyond
    /// `DELIVERY_LOG_CAPACITY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or written.
    pub fn append_delivery_log(&mut self, log: DeliveryLog) -> Result<(), PersistenceError> {
        let mut logs: Vec<DeliveryLog> = self.list_delivery_logs()?;
        debug!(
            material_id = %log.material_id,
            student_id = %log.student_id,
            status = %log.status,
            "Recording delivery log"
        );
        logs.insert(0, log);
        logs.truncate(DELIVERY_LOG_CAPACITY);
        self.save(DELIVERY_LOGS_KEY, &logs)
    }

    /// Lists delivery logs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored log cannot be read.
    pub fn list_delivery_logs(&mut self) -> Result<Vec<DeliveryLog>, PersistenceError> {
        self.load(DELIVERY_LOGS_KEY)
    }

    /// Lists one student's delivery logs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored log cannot be read.
    pub fn delivery_logs_for_student(
        &mut self,
        student_id: &str,
    ) -> Result<Vec<DeliveryLog>, PersistenceError> {
        Ok(self
            .list_delivery_logs()?
            .into_iter()
            .filter(|log| log.student_id == student_id)
            .collect())
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Reads the system settings, or the defaults when none are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document cannot be read.
    pub fn load_settings(&mut self) -> Result<SystemSettings, PersistenceError> {
        match self.store.get(SETTINGS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(SystemSettings::default()),
        }
    }

    /// Replaces the stored system settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn save_settings(&mut self, settings: &SystemSettings) -> Result<(), PersistenceError> {
        let raw: String = serde_json::to_string(settings)?;
        self.store.set(SETTINGS_KEY, &raw)?;
        debug!("Saved system settings");
        Ok(())
    }

    /// Writes `settings` only when no settings document exists yet.
    ///
    /// # Returns
    ///
    /// Whether the document was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn seed_settings(&mut self, settings: &SystemSettings) -> Result<bool, PersistenceError> {
        if self.store.get(SETTINGS_KEY)?.is_some() {
            return Ok(false);
        }
        self.save_settings(settings)?;
        Ok(true)
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Writes the demo accounts and sample materials into empty stores.
    ///
    /// Each collection is seeded only when it is empty, so running this on
    /// every start is safe.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing or storage fails.
    pub fn seed_demo_data(&mut self, now: OffsetDateTime) -> Result<SeedSummary, PersistenceError> {
        let mut summary: SeedSummary = SeedSummary::default();

        if self.list_accounts()?.is_empty() {
            let mut accounts: Vec<Account> = Vec::new();
            for demo in seed::demo_accounts(now) {
                let mut account: Account = demo.account;
                account.password_hash = Some(self.hash_password(demo.password)?);
                accounts.push(account);
            }
            summary.accounts_seeded = accounts.len();
            self.save(USERS_KEY, &accounts)?;
        }

        if self.list_materials()?.is_empty() {
            let materials: Vec<Material> = seed::demo_materials(now);
            summary.materials_seeded = materials.len();
            self.save(MATERIALS_KEY, &materials)?;
        }

        info!(
            accounts = summary.accounts_seeded,
            materials = summary.materials_seeded,
            "Demo data seeded"
        );
        Ok(summary)
    }
}
