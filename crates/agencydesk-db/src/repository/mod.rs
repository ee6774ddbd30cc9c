//! SurrealDB repository implementations.

mod agency;
mod delete;
mod history;
mod policy;
mod provider;
mod quote;
mod report;
mod session;
mod user;
mod vehicle;

pub use agency::{SurrealAgencyRepository, SurrealLocationRepository};
pub use delete::HardDelete;
pub use history::SurrealHistoryRepository;
pub use policy::SurrealPolicyRepository;
pub use provider::{SurrealCoverageRepository, SurrealProviderRepository};
pub use quote::SurrealQuoteRepository;
pub use report::SurrealReportRepository;
pub use session::{SurrealPasswordResetRepository, SurrealSessionRepository};
pub use user::SurrealUserRepository;
pub use vehicle::SurrealVehicleRepository;

use serde::Serialize;
use serde::de::DeserializeOwned;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_id(entity: &'static str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::decode(entity, format!("invalid UUID: {e}")))
}

fn parse_opt_id(entity: &'static str, raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.as_deref().map(|s| parse_id(entity, s)).transpose()
}

fn metadata_or_empty(metadata: Option<serde_json::Value>) -> serde_json::Value {
    metadata.unwrap_or(serde_json::Value::Object(Default::default()))
}

/// Serialize a details struct into the object stored in the row.
fn to_object<T: Serialize>(entity: &'static str, value: &T) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(value).map_err(|e| DbError::decode(entity, e))
}

/// Decode a stored details object back into its struct.
fn from_object<T: DeserializeOwned>(
    entity: &'static str,
    value: serde_json::Value,
) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::decode(entity, e))
}

/// One `SET` assignment per populated field of a partial details struct.
///
/// Returns `(assignment, parameter, value)` triples. Keys come from the
/// struct's own field names, never from request data.
fn patch_assignments<T: Serialize>(
    entity: &'static str,
    field: &str,
    patch: &T,
) -> Result<Vec<(String, String, serde_json::Value)>, DbError> {
    let serde_json::Value::Object(map) = to_object(entity, patch)? else {
        return Ok(Vec::new());
    };
    Ok(map
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(key, value)| {
            let param = format!("{field}_{key}");
            (format!("{field}.`{key}` = ${param}"), param, value)
        })
        .collect())
}

/// Count rows of `table` matching `filter`.
async fn count<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    filter: &str,
    params: Vec<(&'static str, serde_json::Value)>,
) -> Result<u64, DbError> {
    let query = format!("SELECT count() AS total FROM {table} WHERE {filter} GROUP ALL");
    let mut builder = db.query(&query);
    for param in params {
        builder = builder.bind(param);
    }
    let mut result = builder.await?;
    let rows: Vec<CountRow> = result.take(0)?;
    Ok(rows.first().map(|r| r.total).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agencydesk_core::models::vehicle::VehicleDetails;

    #[test]
    fn patch_assignments_skip_unset_fields() {
        let patch = VehicleDetails {
            make: Some("Volvo".into()),
            vehicle_type: Some("Sedan".into()),
            ..Default::default()
        };
        let sets = patch_assignments("vehicle", "details", &patch).unwrap();
        let clauses: Vec<_> = sets.iter().map(|(c, _, _)| c.as_str()).collect();
        assert_eq!(sets.len(), 2);
        assert!(clauses.contains(&"details.`make` = $details_make"));
        assert!(clauses.contains(&"details.`type` = $details_type"));
    }

    #[test]
    fn empty_patch_has_no_assignments() {
        let sets = patch_assignments("vehicle", "details", &VehicleDetails::default()).unwrap();
        assert!(sets.is_empty());
    }
}
