// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Durable key-value backends.
//!
//! Every logical store (accounts, materials, audit events, delivery logs)
//! is a JSON document under one fixed key. Backends only move strings;
//! serialisation lives in the `Persistence` adapter.
//!
//! - `memory`: process-local map, used by tests and throwaway runs
//! - `sqlite`: Diesel-managed `kv_entries` table

pub mod memory;
pub mod sqlite;

use crate::error::PersistenceError;

/// A string key-value store.
///
/// Writes replace the whole value under a key. There are no transactions
/// across keys.
pub trait KeyValueStore: Send {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&mut self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}
