// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;

use crate::diesel_schema::kv_entries;

/// One row of the key-value table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kv_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KvEntryRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

/// Counts of records created by a demo seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Accounts written; zero when accounts already existed.
    pub accounts_seeded: usize,
    /// Materials written; zero when materials already existed.
    pub materials_seeded: usize,
}
