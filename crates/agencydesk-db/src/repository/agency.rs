//! SurrealDB implementations of [`AgencyRepository`] and
//! [`LocationRepository`].

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::agency::{
    Agency, CreateAgency, CreateLocation, Location, UpdateAgency, UpdateLocation,
};
use agencydesk_core::repository::{
    AgencyRepository, LocationRepository, PaginatedResult, Pagination,
};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{count, metadata_or_empty, parse_id};
use crate::error::DbError;
use crate::scope::{Ownership, clause};

#[derive(Debug, SurrealValue)]
struct AgencyRow {
    record_id: String,
    name: String,
    agent_code: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AgencyRow {
    fn try_into_agency(self) -> Result<Agency, DbError> {
        Ok(Agency {
            id: parse_id("agency", &self.record_id)?,
            name: self.name,
            agent_code: self.agent_code,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct LocationRow {
    record_id: String,
    agency_id: String,
    address: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LocationRow {
    fn try_into_location(self) -> Result<Location, DbError> {
        Ok(Location {
            id: parse_id("location", &self.record_id)?,
            agency_id: parse_id("location", &self.agency_id)?,
            address: self.address,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Agency repository.
#[derive(Clone)]
pub struct SurrealAgencyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAgencyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AgencyRepository for SurrealAgencyRepository<C> {
    async fn create(&self, input: CreateAgency) -> BrokerResult<Agency> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('agency', $id) SET \
                 name = $name, agent_code = $agent_code, \
                 metadata = $metadata \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("agent_code", input.agent_code))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "agency", &id_str))?;

        let rows: Vec<AgencyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("agency", &id_str))?;

        Ok(row.try_into_agency()?)
    }

    async fn get_by_id(&self, id: Uuid) -> BrokerResult<Agency> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('agency', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AgencyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("agency", id))?;

        Ok(row.try_into_agency()?)
    }

    async fn update(&self, id: Uuid, input: UpdateAgency) -> BrokerResult<Agency> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.agent_code.is_some() {
            sets.push("agent_code = $agent_code");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('agency', $id) SET {} \
             RETURN meta::id(id) AS record_id, *",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(agent_code) = input.agent_code {
            builder = builder.bind(("agent_code", agent_code));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "agency", id))?;

        let rows: Vec<AgencyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("agency", id))?;

        Ok(row.try_into_agency()?)
    }

    async fn list(&self, pagination: Pagination) -> BrokerResult<PaginatedResult<Agency>> {
        let total = count(&self.db, "agency", "true", Vec::new()).await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM agency \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AgencyRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_agency())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

/// SurrealDB implementation of the Location repository.
#[derive(Clone)]
pub struct SurrealLocationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLocationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> LocationRepository for SurrealLocationRepository<C> {
    async fn create(&self, agency_id: Uuid, input: CreateLocation) -> BrokerResult<Location> {
        let id_str = Uuid::new_v4().to_string();

        // The agency must still exist when the location is written.
        let result = self
            .db
            .query(
                "IF record::exists(type::record('agency', $agency_id)) { \
                     CREATE type::record('location', $id) SET \
                     agency_id = $agency_id, address = $address, \
                     metadata = $metadata \
                     RETURN meta::id(id) AS record_id, * \
                 } ELSE { \
                     THROW '[not_found] agency' \
                 }",
            )
            .bind(("id", id_str.clone()))
            .bind(("agency_id", agency_id.to_string()))
            .bind(("address", input.address))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "agency", agency_id))?;

        let rows: Vec<LocationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("location", &id_str))?;

        Ok(row.try_into_location()?)
    }

    async fn get(&self, scope: ScopeFilter, id: Uuid) -> BrokerResult<Location> {
        let scope = clause(scope, Ownership::Direct("agency_id"));
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM type::record('location', $id) \
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

        let rows: Vec<LocationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("location", id))?;

        Ok(row.try_into_location()?)
    }

    async fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        input: UpdateLocation,
    ) -> BrokerResult<Location> {
        let scope = clause(scope, Ownership::Direct("agency_id"));

        let mut sets = Vec::new();
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('location', $id) SET {} WHERE {} \
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
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "location", id))?;

        let rows: Vec<LocationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("location", id))?;

        Ok(row.try_into_location()?)
    }

    async fn list(
        &self,
        scope: ScopeFilter,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Location>> {
        let scope = clause(scope, Ownership::Direct("agency_id"));
        let params = vec![
            ("scope_agency", scope.agency.clone().into()),
            ("scope_agent", scope.agent.clone().into()),
        ];
        let total = count(&self.db, "location", &scope.sql, params).await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM location WHERE {} \
             ORDER BY created_at ASC LIMIT $limit START $offset",
            scope.sql
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LocationRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_location())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
