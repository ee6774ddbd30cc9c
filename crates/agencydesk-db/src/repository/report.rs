//! SurrealDB implementation of [`ReportRepository`].
//!
//! Each report is a single grouped `SELECT`, so its sub-counts come from
//! one evaluation. An empty scope yields all zeros.

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::report::{PolicyReport, QuoteReport};
use agencydesk_core::repository::ReportRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::count;
use crate::error::DbError;
use crate::scope::{Ownership, clause};

#[derive(Debug, SurrealValue)]
struct QuoteCountsRow {
    total: u64,
    draft: u64,
    presented: u64,
    bound: u64,
}

#[derive(Debug, SurrealValue)]
struct PolicyCountsRow {
    total: u64,
    active: u64,
    expired: u64,
    cancelled: u64,
}

/// SurrealDB implementation of the Report repository.
#[derive(Clone)]
pub struct SurrealReportRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReportRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ReportRepository for SurrealReportRepository<C> {
    async fn quote_counts(&self, scope: ScopeFilter) -> BrokerResult<QuoteReport> {
        let scope = clause(scope, Ownership::Authored("agent_id"));
        let query = format!(
            "SELECT count() AS total, \
             count(status = 'Draft') AS draft, \
             count(status = 'Presented') AS presented, \
             count(status = 'Bound') AS bound \
             FROM quote WHERE {} GROUP ALL",
            scope.sql
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<QuoteCountsRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| QuoteReport {
                total_quotes: row.total,
                draft_quotes: row.draft,
                presented_quotes: row.presented,
                bound_quotes: row.bound,
            })
            .unwrap_or_default())
    }

    async fn policy_counts(&self, scope: ScopeFilter) -> BrokerResult<PolicyReport> {
        let scope = clause(scope, Ownership::Authored("agent_id"));
        let query = format!(
            "SELECT count() AS total, \
             count(status = 'Active') AS active, \
             count(status = 'Expired') AS expired, \
             count(status = 'Cancelled') AS cancelled \
             FROM policy WHERE {} GROUP ALL",
            scope.sql
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PolicyCountsRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| PolicyReport {
                total_policies: row.total,
                active_policies: row.active,
                expired_policies: row.expired,
                cancelled_policies: row.cancelled,
            })
            .unwrap_or_default())
    }

    async fn customer_count(&self, agency_id: Uuid) -> BrokerResult<u64> {
        Ok(count(
            &self.db,
            "user",
            "agency_id = $agency_id AND role = 'Customer'",
            vec![("agency_id", agency_id.to_string().into())],
        )
        .await?)
    }
}
