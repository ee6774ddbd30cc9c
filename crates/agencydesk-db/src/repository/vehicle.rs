//! SurrealDB implementation of [`VehicleRepository`].

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::vehicle::{
    AssignDriver, CreateVehicle, UpdateVehicle, Vehicle, VehicleDriver,
};
use agencydesk_core::repository::{PaginatedResult, Pagination, VehicleRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{count, from_object, metadata_or_empty, parse_id, patch_assignments, to_object};
use crate::error::DbError;
use crate::scope::{Ownership, clause};

#[derive(Debug, SurrealValue)]
struct VehicleRow {
    record_id: String,
    customer_id: String,
    vin: String,
    details: serde_json::Value,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VehicleRow {
    fn try_into_vehicle(self) -> Result<Vehicle, DbError> {
        Ok(Vehicle {
            id: parse_id("vehicle", &self.record_id)?,
            customer_id: parse_id("vehicle", &self.customer_id)?,
            vin: self.vin,
            details: from_object("vehicle", self.details)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct DriverRow {
    record_id: String,
    vehicle_id: String,
    user_id: String,
    details: serde_json::Value,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl DriverRow {
    fn try_into_driver(self) -> Result<VehicleDriver, DbError> {
        Ok(VehicleDriver {
            id: parse_id("vehicle driver", &self.record_id)?,
            vehicle_id: parse_id("vehicle driver", &self.vehicle_id)?,
            user_id: parse_id("vehicle driver", &self.user_id)?,
            details: from_object("vehicle driver", self.details)?,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Vehicle repository.
#[derive(Clone)]
pub struct SurrealVehicleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealVehicleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> VehicleRepository for SurrealVehicleRepository<C> {
    async fn create(&self, agency_id: Uuid, input: CreateVehicle) -> BrokerResult<Vehicle> {
        let id_str = Uuid::new_v4().to_string();
        let details = to_object("vehicle", &input.details)?;

        let result = self
            .db
            .query(
                "IF array::len((SELECT VALUE id FROM type::record('user', $customer_id) \
                     WHERE agency_id = $agency_id AND role = 'Customer')) = 0 { \
                     THROW '[not_found] customer' \
                 } ELSE { \
                     CREATE type::record('vehicle', $id) SET \
                     customer_id = $customer_id, vin = $vin, \
                     details = $details, metadata = $metadata \
                     RETURN meta::id(id) AS record_id, * \
                 }",
            )
            .bind(("id", id_str.clone()))
            .bind(("agency_id", agency_id.to_string()))
            .bind(("customer_id", input.customer_id.to_string()))
            .bind(("vin", input.vin))
            .bind(("details", details))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "customer", input.customer_id))?;

        let rows: Vec<VehicleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("vehicle", &id_str))?;

        let vehicle = row.try_into_vehicle()?;
        info!(vehicle_id = %vehicle.id, customer_id = %vehicle.customer_id, "vehicle created");
        Ok(vehicle)
    }

    async fn get(&self, scope: ScopeFilter, id: Uuid) -> BrokerResult<Vehicle> {
        let scope = clause(scope, Ownership::ViaUser("customer_id"));
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM type::record('vehicle', $id) \
             WHERE {}",
            scope.sql
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VehicleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("vehicle", id))?;

        Ok(row.try_into_vehicle()?)
    }

    async fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        input: UpdateVehicle,
    ) -> BrokerResult<Vehicle> {
        let scope = clause(scope, Ownership::ViaUser("customer_id"));
        let detail_sets = patch_assignments("vehicle", "details", &input.details)?;

        let mut sets: Vec<String> = Vec::new();
        if input.vin.is_some() {
            sets.push("vin = $vin".into());
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata".into());
        }
        sets.extend(detail_sets.iter().map(|(set, _, _)| set.clone()));
        sets.push("updated_at = time::now()".into());

        let query = format!(
            "UPDATE type::record('vehicle', $id) SET {} WHERE {} \
             RETURN meta::id(id) AS record_id, *",
            sets.join(", "),
            scope.sql
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent));
        if let Some(vin) = input.vin {
            builder = builder.bind(("vin", vin));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }
        for (_, param, value) in detail_sets {
            builder = builder.bind((param, value));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "vehicle", id))?;

        let rows: Vec<VehicleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("vehicle", id))?;

        Ok(row.try_into_vehicle()?)
    }

    async fn list(
        &self,
        scope: ScopeFilter,
        customer_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Vehicle>> {
        let scope = clause(scope, Ownership::ViaUser("customer_id"));
        let mut filter = scope.sql.clone();
        if customer_id.is_some() {
            filter.push_str(" AND customer_id = $customer_id");
        }
        let customer = customer_id.map(|id| id.to_string()).unwrap_or_default();

        let total = count(
            &self.db,
            "vehicle",
            &filter,
            vec![
                ("customer_id", customer.clone().into()),
                ("scope_agency", scope.agency.clone().into()),
                ("scope_agent", scope.agent.clone().into()),
            ],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM vehicle WHERE {filter} \
             ORDER BY created_at ASC LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("customer_id", customer))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VehicleRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_vehicle())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn assign_driver(
        &self,
        agency_id: Uuid,
        input: AssignDriver,
    ) -> BrokerResult<VehicleDriver> {
        let id_str = Uuid::new_v4().to_string();
        let details = to_object("vehicle driver", &input.details)?;

        // Both the vehicle's owner and the driver must currently belong
        // to the agency.
        let result = self
            .db
            .query(
                "IF array::len((SELECT VALUE id FROM type::record('vehicle', $vehicle_id) \
                     WHERE customer_id IN (SELECT VALUE meta::id(id) FROM user \
                     WHERE agency_id = $agency_id))) = 0 { \
                     THROW '[not_found] vehicle' \
                 } ELSE IF array::len((SELECT VALUE id FROM type::record('user', $user_id) \
                     WHERE agency_id = $agency_id)) = 0 { \
                     THROW '[not_found] driver' \
                 } ELSE { \
                     CREATE type::record('vehicle_driver', $id) SET \
                     vehicle_id = $vehicle_id, user_id = $user_id, \
                     details = $details, metadata = $metadata \
                     RETURN meta::id(id) AS record_id, * \
                 }",
            )
            .bind(("id", id_str.clone()))
            .bind(("agency_id", agency_id.to_string()))
            .bind(("vehicle_id", input.vehicle_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("details", details))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "vehicle driver", &id_str))?;

        let rows: Vec<DriverRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("vehicle driver", &id_str))?;

        Ok(row.try_into_driver()?)
    }

    async fn list_drivers(
        &self,
        scope: ScopeFilter,
        vehicle_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<VehicleDriver>> {
        let scope = clause(scope, Ownership::ViaUser("user_id"));
        let mut filter = scope.sql.clone();
        if vehicle_id.is_some() {
            filter.push_str(" AND vehicle_id = $vehicle_id");
        }
        let vehicle = vehicle_id.map(|id| id.to_string()).unwrap_or_default();

        let total = count(
            &self.db,
            "vehicle_driver",
            &filter,
            vec![
                ("vehicle_id", vehicle.clone().into()),
                ("scope_agency", scope.agency.clone().into()),
                ("scope_agent", scope.agent.clone().into()),
            ],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM vehicle_driver WHERE {filter} \
             ORDER BY created_at ASC LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("vehicle_id", vehicle))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DriverRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_driver())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
