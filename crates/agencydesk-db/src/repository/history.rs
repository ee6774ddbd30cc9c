//! SurrealDB implementation of [`HistoryRepository`].
//!
//! Driving and insurance history share one row shape: the identity they
//! describe plus a FLEXIBLE `details` object.

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::vehicle::{
    AddDrivingHistory, AddInsuranceHistory, DrivingHistory, InsuranceHistory,
};
use agencydesk_core::repository::{HistoryRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use serde::Serialize;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{count, from_object, metadata_or_empty, parse_id, to_object};
use crate::error::DbError;
use crate::scope::{Ownership, clause};

#[derive(Debug, SurrealValue)]
struct HistoryRow {
    record_id: String,
    user_id: String,
    details: serde_json::Value,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl HistoryRow {
    fn try_into_driving(self) -> Result<DrivingHistory, DbError> {
        Ok(DrivingHistory {
            id: parse_id("driving history", &self.record_id)?,
            user_id: parse_id("driving history", &self.user_id)?,
            incident: from_object("driving history", self.details)?,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }

    fn try_into_insurance(self) -> Result<InsuranceHistory, DbError> {
        Ok(InsuranceHistory {
            id: parse_id("insurance history", &self.record_id)?,
            user_id: parse_id("insurance history", &self.user_id)?,
            answers: from_object("insurance history", self.details)?,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the History repository.
#[derive(Clone)]
pub struct SurrealHistoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealHistoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Insert a history row for an identity that currently belongs to
    /// `agency_id`.
    async fn insert<T: Serialize>(
        &self,
        table: &'static str,
        agency_id: Uuid,
        user_id: Uuid,
        details: &T,
        metadata: Option<serde_json::Value>,
    ) -> Result<HistoryRow, DbError> {
        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "IF array::len((SELECT VALUE id FROM type::record('user', $user_id) \
                 WHERE agency_id = $agency_id)) = 0 {{ \
                 THROW '[not_found] user' \
             }} ELSE {{ \
                 CREATE type::record('{table}', $id) SET \
                 user_id = $user_id, details = $details, metadata = $metadata \
                 RETURN meta::id(id) AS record_id, * \
             }}"
        );

        let result = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("agency_id", agency_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("details", to_object(table, details)?))
            .bind(("metadata", metadata_or_empty(metadata)))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "user", user_id))?;

        let rows: Vec<HistoryRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(table, id_str))
    }

    async fn page(
        &self,
        table: &'static str,
        scope: ScopeFilter,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<(Vec<HistoryRow>, u64), DbError> {
        let scope = clause(scope, Ownership::ViaUser("user_id"));
        let mut filter = scope.sql.clone();
        if user_id.is_some() {
            filter.push_str(" AND user_id = $user_id");
        }
        let user = user_id.map(|id| id.to_string()).unwrap_or_default();

        let total = count(
            &self.db,
            table,
            &filter,
            vec![
                ("user_id", user.clone().into()),
                ("scope_agency", scope.agency.clone().into()),
                ("scope_agent", scope.agent.clone().into()),
            ],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM {table} WHERE {filter} \
             ORDER BY created_at ASC LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("user_id", user))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await?;

        let rows: Vec<HistoryRow> = result.take(0)?;
        Ok((rows, total))
    }
}

impl<C: Connection> HistoryRepository for SurrealHistoryRepository<C> {
    async fn add_driving(
        &self,
        agency_id: Uuid,
        input: AddDrivingHistory,
    ) -> BrokerResult<DrivingHistory> {
        let row = self
            .insert(
                "driving_history",
                agency_id,
                input.user_id,
                &input.incident,
                input.metadata,
            )
            .await?;
        Ok(row.try_into_driving()?)
    }

    async fn list_driving(
        &self,
        scope: ScopeFilter,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<DrivingHistory>> {
        let (rows, total) = self
            .page("driving_history", scope, user_id, pagination)
            .await?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_driving())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_insurance(
        &self,
        agency_id: Uuid,
        input: AddInsuranceHistory,
    ) -> BrokerResult<InsuranceHistory> {
        let row = self
            .insert(
                "insurance_history",
                agency_id,
                input.user_id,
                &input.answers,
                input.metadata,
            )
            .await?;
        Ok(row.try_into_insurance()?)
    }

    async fn list_insurance(
        &self,
        scope: ScopeFilter,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<InsuranceHistory>> {
        let (rows, total) = self
            .page("insurance_history", scope, user_id, pagination)
            .await?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_insurance())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
