//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Append-only tables forbid
//! update and delete at the permission level.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD is_superuser ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD individual_permissions ON TABLE user TYPE array \
    DEFAULT [];
DEFINE FIELD individual_permissions.* ON TABLE user TYPE string;
DEFINE FIELD approval_level ON TABLE user TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD metadata ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Interest Groups
-- =======================================================================
DEFINE TABLE interest_group SCHEMAFULL;
DEFINE FIELD code ON TABLE interest_group TYPE string;
DEFINE FIELD name ON TABLE interest_group TYPE string \
    ASSERT string::len($value) >= 2 AND string::len($value) <= 100;
DEFINE FIELD description ON TABLE interest_group TYPE string;
DEFINE FIELD group_permissions ON TABLE interest_group TYPE array \
    DEFAULT [];
DEFINE FIELD group_permissions.* ON TABLE interest_group TYPE string;
DEFINE FIELD is_active ON TABLE interest_group TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE interest_group TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE interest_group TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_group_code ON TABLE interest_group COLUMNS code UNIQUE;
DEFINE INDEX idx_group_name ON TABLE interest_group COLUMNS name UNIQUE;

-- =======================================================================
-- Permission Catalog
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD code ON TABLE permission TYPE string;
DEFINE FIELD description ON TABLE permission TYPE string;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_code ON TABLE permission COLUMNS code UNIQUE;

-- =======================================================================
-- Roles (named permission bundles)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string;
DEFINE FIELD permissions ON TABLE role TYPE array DEFAULT [];
DEFINE FIELD permissions.* ON TABLE role TYPE string;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_name ON TABLE role COLUMNS name UNIQUE;

-- =======================================================================
-- Documents
-- =======================================================================
DEFINE TABLE document SCHEMAFULL;
DEFINE FIELD title ON TABLE document TYPE string;
DEFINE FIELD status ON TABLE document TYPE string \
    ASSERT $value IN ['DRAFT', 'REVIEWED', 'APPROVED', 'OBSOLETE'];
DEFINE FIELD creator_id ON TABLE document TYPE string;
DEFINE FIELD version ON TABLE document TYPE int DEFAULT 1;
DEFINE FIELD metadata ON TABLE document TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE document TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE document TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Status History (append-only)
-- =======================================================================
DEFINE TABLE status_history SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD document_id ON TABLE status_history TYPE string;
DEFINE FIELD old_status ON TABLE status_history TYPE string \
    ASSERT $value IN ['DRAFT', 'REVIEWED', 'APPROVED', 'OBSOLETE'];
DEFINE FIELD new_status ON TABLE status_history TYPE string \
    ASSERT $value IN ['DRAFT', 'REVIEWED', 'APPROVED', 'OBSOLETE'];
DEFINE FIELD changed_by ON TABLE status_history TYPE string;
DEFINE FIELD comment ON TABLE status_history TYPE string;
DEFINE FIELD timestamp ON TABLE status_history TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_history_document ON TABLE status_history \
    COLUMNS document_id;

-- =======================================================================
-- Audit Events (append-only)
-- =======================================================================
DEFINE TABLE audit_event SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD kind ON TABLE audit_event TYPE string \
    ASSERT $value IN ['access_check', 'role_assignment', 'role_revoked'];
DEFINE FIELD user_id ON TABLE audit_event TYPE string;
DEFINE FIELD subject ON TABLE audit_event TYPE string;
DEFINE FIELD outcome ON TABLE audit_event TYPE string \
    ASSERT $value IN ['Success', 'Failure', 'Denied'];
DEFINE FIELD actor_id ON TABLE audit_event TYPE string;
DEFINE FIELD metadata ON TABLE audit_event TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD timestamp ON TABLE audit_event TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_user ON TABLE audit_event COLUMNS user_id;
DEFINE INDEX idx_audit_time ON TABLE audit_event COLUMNS timestamp;

-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- User -> Interest Group membership, with per-group attributes.
DEFINE TABLE member_of TYPE RELATION SCHEMAFULL;
DEFINE FIELD role_in_group ON TABLE member_of TYPE string;
DEFINE FIELD approval_level_in_group ON TABLE member_of TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD is_department_head ON TABLE member_of TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE member_of TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_member_unique ON TABLE member_of COLUMNS in, out UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
