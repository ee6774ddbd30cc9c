//! SurrealDB implementations of [`ProviderRepository`] and
//! [`CoverageRepository`].
//!
//! Grants are rows of `provider_grant` keyed by the `(agency, provider)`
//! pair, so granting is an idempotent upsert.

use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::provider::{
    Coverage, CreateCoverage, CreateProvider, Provider, ProviderGrant, UpdateProvider,
};
use agencydesk_core::repository::{
    CoverageRepository, PaginatedResult, Pagination, ProviderRepository,
};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{count, metadata_or_empty, parse_id};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProviderRow {
    record_id: String,
    name: String,
    contact_info: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProviderRow {
    fn try_into_provider(self) -> Result<Provider, DbError> {
        Ok(Provider {
            id: parse_id("provider", &self.record_id)?,
            name: self.name,
            contact_info: self.contact_info,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct GrantRow {
    agency_id: String,
    provider_id: String,
}

#[derive(Debug, SurrealValue)]
struct CoverageRow {
    record_id: String,
    name: String,
    description: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl CoverageRow {
    fn try_into_coverage(self) -> Result<Coverage, DbError> {
        Ok(Coverage {
            id: parse_id("coverage", &self.record_id)?,
            name: self.name,
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

pub(crate) fn grant_key(agency_id: Uuid, provider_id: Uuid) -> String {
    format!("{}_{}", agency_id.simple(), provider_id.simple())
}

/// SurrealDB implementation of the Provider repository.
#[derive(Clone)]
pub struct SurrealProviderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProviderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn page(
        &self,
        filter: &str,
        agency_id: String,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Provider>> {
        let total = count(
            &self.db,
            "provider",
            filter,
            vec![("agency_id", agency_id.clone().into())],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM provider WHERE {filter} \
             ORDER BY name ASC LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("agency_id", agency_id))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_provider())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

impl<C: Connection> ProviderRepository for SurrealProviderRepository<C> {
    async fn create(&self, input: CreateProvider) -> BrokerResult<Provider> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('provider', $id) SET \
                 name = $name, contact_info = $contact_info, \
                 metadata = $metadata \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("contact_info", input.contact_info))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "provider", &id_str))?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("provider", &id_str))?;

        Ok(row.try_into_provider()?)
    }

    async fn get_by_id(&self, id: Uuid) -> BrokerResult<Provider> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('provider', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("provider", id))?;

        Ok(row.try_into_provider()?)
    }

    async fn update(&self, id: Uuid, input: UpdateProvider) -> BrokerResult<Provider> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.contact_info.is_some() {
            sets.push("contact_info = $contact_info");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('provider', $id) SET {} \
             RETURN meta::id(id) AS record_id, *",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(contact_info) = input.contact_info {
            builder = builder.bind(("contact_info", contact_info));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "provider", id))?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("provider", id))?;

        Ok(row.try_into_provider()?)
    }

    async fn list(&self, pagination: Pagination) -> BrokerResult<PaginatedResult<Provider>> {
        self.page("true", String::new(), pagination).await
    }

    async fn grant(&self, agency_id: Uuid, provider_id: Uuid) -> BrokerResult<ProviderGrant> {
        let key = grant_key(agency_id, provider_id);

        let result = self
            .db
            .query(
                "IF !record::exists(type::record('agency', $agency_id)) { \
                     THROW '[not_found] agency' \
                 } ELSE IF !record::exists(type::record('provider', $provider_id)) { \
                     THROW '[not_found] provider' \
                 } ELSE { \
                     UPSERT type::record('provider_grant', $key) SET \
                     agency_id = $agency_id, provider_id = $provider_id \
                 }",
            )
            .bind(("key", key.clone()))
            .bind(("agency_id", agency_id.to_string()))
            .bind(("provider_id", provider_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "provider grant", &key))?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("provider grant", &key))?;

        info!(%agency_id, %provider_id, "provider granted");

        Ok(ProviderGrant {
            agency_id: parse_id("provider grant", &row.agency_id)?,
            provider_id: parse_id("provider grant", &row.provider_id)?,
        })
    }

    async fn revoke(&self, agency_id: Uuid, provider_id: Uuid) -> BrokerResult<()> {
        let key = grant_key(agency_id, provider_id);

        let mut result = self
            .db
            .query("DELETE type::record('provider_grant', $key) RETURN BEFORE")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("provider grant", key).into());
        }

        info!(%agency_id, %provider_id, "provider grant revoked");
        Ok(())
    }

    async fn is_granted(&self, agency_id: Uuid, provider_id: Uuid) -> BrokerResult<bool> {
        let total = count(
            &self.db,
            "provider_grant",
            "agency_id = $agency_id AND provider_id = $provider_id",
            vec![
                ("agency_id", agency_id.to_string().into()),
                ("provider_id", provider_id.to_string().into()),
            ],
        )
        .await?;
        Ok(total > 0)
    }

    async fn list_granted(
        &self,
        agency_id: Uuid,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Provider>> {
        self.page(
            "meta::id(id) IN (SELECT VALUE provider_id FROM provider_grant \
             WHERE agency_id = $agency_id)",
            agency_id.to_string(),
            pagination,
        )
        .await
    }
}

/// SurrealDB implementation of the Coverage repository.
#[derive(Clone)]
pub struct SurrealCoverageRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCoverageRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CoverageRepository for SurrealCoverageRepository<C> {
    async fn create(&self, input: CreateCoverage) -> BrokerResult<Coverage> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('coverage', $id) SET \
                 name = $name, description = $description, \
                 metadata = $metadata \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "coverage", &id_str))?;

        let rows: Vec<CoverageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("coverage", &id_str))?;

        Ok(row.try_into_coverage()?)
    }

    async fn get_by_id(&self, id: Uuid) -> BrokerResult<Coverage> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('coverage', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CoverageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("coverage", id))?;

        Ok(row.try_into_coverage()?)
    }

    async fn list(&self, pagination: Pagination) -> BrokerResult<PaginatedResult<Coverage>> {
        let total = count(&self.db, "coverage", "true", Vec::new()).await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM coverage \
                 ORDER BY name ASC LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CoverageRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_coverage())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
