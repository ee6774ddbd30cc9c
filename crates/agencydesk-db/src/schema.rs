//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs and calendar dates are stored as
//! strings; closed enums are strings with ASSERT constraints. Free-form
//! descriptive fields live in FLEXIBLE `profile`/`details` objects.

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
// Schema v1: table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Agencies (tenants)
-- =======================================================================
DEFINE TABLE agency SCHEMAFULL;
DEFINE FIELD name ON TABLE agency TYPE string;
DEFINE FIELD agent_code ON TABLE agency TYPE option<string>;
DEFINE FIELD metadata ON TABLE agency TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE agency TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE agency TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE location SCHEMAFULL;
DEFINE FIELD agency_id ON TABLE location TYPE string;
DEFINE FIELD address ON TABLE location TYPE string;
DEFINE FIELD metadata ON TABLE location TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE location TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE location TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_location_agency ON TABLE location COLUMNS agency_id;

-- =======================================================================
-- Providers, grants and the coverage catalogue (global)
-- =======================================================================
DEFINE TABLE provider SCHEMAFULL;
DEFINE FIELD name ON TABLE provider TYPE string;
DEFINE FIELD contact_info ON TABLE provider TYPE string;
DEFINE FIELD metadata ON TABLE provider TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE provider TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE provider TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE provider_grant SCHEMAFULL;
DEFINE FIELD agency_id ON TABLE provider_grant TYPE string;
DEFINE FIELD provider_id ON TABLE provider_grant TYPE string;
DEFINE FIELD created_at ON TABLE provider_grant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_grant_pair ON TABLE provider_grant \
    COLUMNS agency_id, provider_id UNIQUE;

DEFINE TABLE coverage SCHEMAFULL;
DEFINE FIELD name ON TABLE coverage TYPE string;
DEFINE FIELD description ON TABLE coverage TYPE option<string>;
DEFINE FIELD metadata ON TABLE coverage TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE coverage TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Identities
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD first_name ON TABLE user TYPE string;
DEFINE FIELD last_name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['MasterAdmin', 'AgencyAdmin', 'LocationAdmin', \
    'Agent', 'Customer'];
DEFINE FIELD agency_id ON TABLE user TYPE option<string>;
DEFINE FIELD location_id ON TABLE user TYPE option<string>;
DEFINE FIELD profile ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD metadata ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_agency ON TABLE user COLUMNS agency_id;

-- =======================================================================
-- Customer satellite records
-- =======================================================================
DEFINE TABLE vehicle SCHEMAFULL;
DEFINE FIELD customer_id ON TABLE vehicle TYPE string;
DEFINE FIELD vin ON TABLE vehicle TYPE string;
DEFINE FIELD details ON TABLE vehicle TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD metadata ON TABLE vehicle TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE vehicle TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE vehicle TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_vehicle_customer ON TABLE vehicle COLUMNS customer_id;

DEFINE TABLE vehicle_driver SCHEMAFULL;
DEFINE FIELD vehicle_id ON TABLE vehicle_driver TYPE string;
DEFINE FIELD user_id ON TABLE vehicle_driver TYPE string;
DEFINE FIELD details ON TABLE vehicle_driver TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD metadata ON TABLE vehicle_driver TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE vehicle_driver TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_driver_pair ON TABLE vehicle_driver \
    COLUMNS vehicle_id, user_id UNIQUE;

DEFINE TABLE driving_history SCHEMAFULL;
DEFINE FIELD user_id ON TABLE driving_history TYPE string;
DEFINE FIELD details ON TABLE driving_history TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD metadata ON TABLE driving_history TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE driving_history TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_driving_history_user ON TABLE driving_history \
    COLUMNS user_id;

DEFINE TABLE insurance_history SCHEMAFULL;
DEFINE FIELD user_id ON TABLE insurance_history TYPE string;
DEFINE FIELD details ON TABLE insurance_history TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD metadata ON TABLE insurance_history TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE insurance_history TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_insurance_history_user ON TABLE insurance_history \
    COLUMNS user_id;

-- =======================================================================
-- Quotes, line items and policies
-- =======================================================================
DEFINE TABLE quote SCHEMAFULL;
DEFINE FIELD agent_id ON TABLE quote TYPE string;
DEFINE FIELD customer_id ON TABLE quote TYPE string;
DEFINE FIELD vehicle_id ON TABLE quote TYPE option<string>;
DEFINE FIELD status ON TABLE quote TYPE string \
    ASSERT $value IN ['Draft', 'Presented', 'Bound'];
DEFINE FIELD metadata ON TABLE quote TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD quote_date ON TABLE quote TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE quote TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_quote_agent ON TABLE quote COLUMNS agent_id;

DEFINE TABLE quote_line_item SCHEMAFULL;
DEFINE FIELD quote_id ON TABLE quote_line_item TYPE string;
DEFINE FIELD provider_id ON TABLE quote_line_item TYPE string;
DEFINE FIELD coverage_id ON TABLE quote_line_item TYPE string;
DEFINE FIELD price ON TABLE quote_line_item TYPE float \
    ASSERT $value >= 0;
DEFINE FIELD limit_amount ON TABLE quote_line_item TYPE option<string>;
DEFINE FIELD deductible_amount ON TABLE quote_line_item \
    TYPE option<string>;
DEFINE FIELD metadata ON TABLE quote_line_item TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE quote_line_item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_line_item_quote ON TABLE quote_line_item \
    COLUMNS quote_id;

DEFINE TABLE policy SCHEMAFULL;
DEFINE FIELD quote_id ON TABLE policy TYPE string;
DEFINE FIELD customer_id ON TABLE policy TYPE string;
DEFINE FIELD agent_id ON TABLE policy TYPE string;
DEFINE FIELD provider_id ON TABLE policy TYPE string;
DEFINE FIELD policy_number ON TABLE policy TYPE string;
DEFINE FIELD effective_date ON TABLE policy TYPE string;
DEFINE FIELD expiration_date ON TABLE policy TYPE string;
DEFINE FIELD status ON TABLE policy TYPE string \
    ASSERT $value IN ['Active', 'Expired', 'Cancelled'];
DEFINE FIELD metadata ON TABLE policy TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE policy TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_policy_quote ON TABLE policy COLUMNS quote_id UNIQUE;
DEFINE INDEX idx_policy_number ON TABLE policy \
    COLUMNS policy_number UNIQUE;

-- =======================================================================
-- Credentials
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session COLUMNS token_hash UNIQUE;

DEFINE TABLE password_reset SCHEMAFULL;
DEFINE FIELD user_id ON TABLE password_reset TYPE string;
DEFINE FIELD token_hash ON TABLE password_reset TYPE string;
DEFINE FIELD used ON TABLE password_reset TYPE bool DEFAULT false;
DEFINE FIELD expires_at ON TABLE password_reset TYPE datetime;
DEFINE FIELD created_at ON TABLE password_reset TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_password_reset_token ON TABLE password_reset \
    COLUMNS token_hash UNIQUE;
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
