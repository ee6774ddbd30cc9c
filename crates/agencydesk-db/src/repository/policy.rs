//! SurrealDB implementation of [`PolicyRepository`].
//!
//! Binding is the one multi-record write in the system: the quote flips
//! to Bound and the policy row is inserted inside a single transaction.
//! The quote update is conditional on the authoring agent and a bindable
//! status, so a concurrent second bind finds nothing to update and the
//! transaction aborts before any policy is written. The unique index on
//! `policy.quote_id` backs this up at the storage level.

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::policy::{NewPolicy, Policy, PolicyStatus};
use agencydesk_core::repository::{PaginatedResult, Pagination, PolicyRepository};
use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{info, warn};
use uuid::Uuid;

use super::{count, parse_id};
use crate::error::DbError;
use crate::scope::{Ownership, clause};

const BIND_QUOTE: &str = "\
BEGIN TRANSACTION;
IF array::len((SELECT VALUE id FROM type::record('user', $agent_id) \
    WHERE agency_id = $agency_id AND role = 'Agent')) = 0 { \
    THROW '[not_found] quote' \
};
IF array::len((SELECT VALUE id FROM provider_grant \
    WHERE agency_id = $agency_id AND provider_id = $provider_id)) = 0 { \
    THROW '[denied] provider is not granted to the agency' \
};
LET $bound = (UPDATE type::record('quote', $quote_id) SET \
    status = 'Bound', updated_at = time::now() \
    WHERE agent_id = $agent_id AND status IN ['Draft', 'Presented'] \
    RETURN AFTER);
IF array::len($bound) = 0 { THROW '[conflict] quote is not bindable' };
CREATE type::record('policy', $id) SET \
    quote_id = $quote_id, customer_id = $bound[0].customer_id, \
    agent_id = $agent_id, provider_id = $provider_id, \
    policy_number = $policy_number, \
    effective_date = $effective_date, expiration_date = $expiration_date, \
    status = 'Active', metadata = $metadata;
COMMIT TRANSACTION;
";

#[derive(Debug, SurrealValue)]
struct PolicyRow {
    record_id: String,
    quote_id: String,
    customer_id: String,
    agent_id: String,
    provider_id: String,
    policy_number: String,
    effective_date: String,
    expiration_date: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, DbError> {
    raw.parse()
        .map_err(|e| DbError::decode("policy", format!("invalid date {raw}: {e}")))
}

impl PolicyRow {
    fn try_into_policy(self) -> Result<Policy, DbError> {
        let status: PolicyStatus = self
            .status
            .parse()
            .map_err(|e| DbError::decode("policy", e))?;
        Ok(Policy {
            id: parse_id("policy", &self.record_id)?,
            quote_id: parse_id("policy", &self.quote_id)?,
            customer_id: parse_id("policy", &self.customer_id)?,
            agent_id: parse_id("policy", &self.agent_id)?,
            provider_id: parse_id("policy", &self.provider_id)?,
            policy_number: self.policy_number,
            effective_date: parse_date(&self.effective_date)?,
            expiration_date: parse_date(&self.expiration_date)?,
            status,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct QuoteStateRow {
    agent_id: String,
    status: String,
}

/// SurrealDB implementation of the Policy repository.
#[derive(Clone)]
pub struct SurrealPolicyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPolicyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(
        &self,
        filter: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Option<Policy>, DbError> {
        let query = format!("SELECT meta::id(id) AS record_id, * FROM policy WHERE {filter}");
        let mut builder = self.db.query(&query);
        for param in params {
            builder = builder.bind(param);
        }
        let mut result = builder.await?;
        let rows: Vec<PolicyRow> = result.take(0)?;
        rows.into_iter().next().map(|row| row.try_into_policy()).transpose()
    }

    /// Explain a failed bind from the quote's state after the rollback.
    async fn classify_bind_failure(&self, policy: &NewPolicy, err: DbError) -> DbError {
        if matches!(err, DbError::Denied(_)) {
            return err;
        }

        let state = async {
            let mut result = self
                .db
                .query("SELECT agent_id, status FROM type::record('quote', $id)")
                .bind(("id", policy.quote_id.to_string()))
                .await?;
            let rows: Vec<QuoteStateRow> = result.take(0)?;
            Ok::<_, DbError>(rows.into_iter().next())
        }
        .await;

        let agent = policy.agent_id.to_string();
        match state {
            Ok(Some(row)) if row.agent_id == agent && row.status == "Bound" => {
                DbError::Conflict("quote is already bound".into())
            }
            Ok(Some(row)) if row.agent_id == agent => err,
            Ok(_) => DbError::not_found("quote", policy.quote_id),
            Err(read_err) => {
                warn!(
                    quote_id = %policy.quote_id,
                    error = %read_err,
                    "could not re-read quote after failed bind"
                );
                err
            }
        }
    }
}

impl<C: Connection> PolicyRepository for SurrealPolicyRepository<C> {
    async fn bind(&self, policy: NewPolicy) -> BrokerResult<Policy> {
        let id_str = policy.id.to_string();

        let mut result = self
            .db
            .query(BIND_QUOTE)
            .bind(("id", id_str.clone()))
            .bind(("quote_id", policy.quote_id.to_string()))
            .bind(("agent_id", policy.agent_id.to_string()))
            .bind(("agency_id", policy.agency_id.to_string()))
            .bind(("provider_id", policy.provider_id.to_string()))
            .bind(("policy_number", policy.policy_number.clone()))
            .bind(("effective_date", policy.effective_date.to_string()))
            .bind(("expiration_date", policy.expiration_date.to_string()))
            .bind(("metadata", policy.metadata.clone()))
            .await
            .map_err(DbError::from)?;

        let failure = DbError::from_transaction(result.take_errors(), "policy", policy.quote_id);
        if let Some(err) = failure {
            return Err(self.classify_bind_failure(&policy, err).await.into());
        }

        let bound = self
            .fetch("meta::id(id) = $id", vec![("id", id_str.clone())])
            .await?
            .ok_or_else(|| DbError::not_found("policy", &id_str))?;

        info!(
            policy_id = %bound.id,
            quote_id = %bound.quote_id,
            policy_number = %bound.policy_number,
            "quote bound"
        );
        Ok(bound)
    }

    async fn get(&self, scope: ScopeFilter, id: Uuid) -> BrokerResult<Policy> {
        let scope = clause(scope, Ownership::Authored("agent_id"));
        let policy = self
            .fetch(
                &format!("meta::id(id) = $id AND {}", scope.sql),
                vec![
                    ("id", id.to_string()),
                    ("scope_agency", scope.agency),
                    ("scope_agent", scope.agent),
                ],
            )
            .await?
            .ok_or_else(|| DbError::not_found("policy", id))?;
        Ok(policy)
    }

    async fn find_by_quote(&self, quote_id: Uuid) -> BrokerResult<Option<Policy>> {
        Ok(self
            .fetch("quote_id = $quote_id", vec![("quote_id", quote_id.to_string())])
            .await?)
    }

    async fn list(
        &self,
        scope: ScopeFilter,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Policy>> {
        let scope = clause(scope, Ownership::Authored("agent_id"));
        let total = count(
            &self.db,
            "policy",
            &scope.sql,
            vec![
                ("scope_agency", scope.agency.clone().into()),
                ("scope_agent", scope.agent.clone().into()),
            ],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM policy WHERE {} \
             ORDER BY created_at DESC LIMIT $limit START $offset",
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

        let rows: Vec<PolicyRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_policy())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
