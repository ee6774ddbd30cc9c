//! SurrealDB implementation of [`QuoteRepository`].
//!
//! Every write re-checks the relationships it depends on (agent and
//! customer membership, vehicle ownership, provider grant) inside the
//! same statement that performs it.

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::quote::{
    CreateLineItem, CreateQuote, Quote, QuoteLineItem, QuoteStatus, UpdateQuote,
};
use agencydesk_core::repository::{PaginatedResult, Pagination, QuoteRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{count, metadata_or_empty, parse_id, parse_opt_id};
use crate::error::DbError;
use crate::scope::{Ownership, clause};

#[derive(Debug, SurrealValue)]
struct QuoteRow {
    record_id: String,
    agent_id: String,
    customer_id: String,
    vehicle_id: Option<String>,
    status: String,
    metadata: serde_json::Value,
    quote_date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuoteRow {
    fn try_into_quote(self) -> Result<Quote, DbError> {
        let status: QuoteStatus = self
            .status
            .parse()
            .map_err(|e| DbError::decode("quote", e))?;
        Ok(Quote {
            id: parse_id("quote", &self.record_id)?,
            agent_id: parse_id("quote", &self.agent_id)?,
            customer_id: parse_id("quote", &self.customer_id)?,
            vehicle_id: parse_opt_id("quote", self.vehicle_id)?,
            status,
            metadata: self.metadata,
            quote_date: self.quote_date,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct LineItemRow {
    record_id: String,
    quote_id: String,
    provider_id: String,
    coverage_id: String,
    price: f64,
    limit_amount: Option<String>,
    deductible_amount: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl LineItemRow {
    fn try_into_line_item(self) -> Result<QuoteLineItem, DbError> {
        Ok(QuoteLineItem {
            id: parse_id("quote line item", &self.record_id)?,
            quote_id: parse_id("quote line item", &self.quote_id)?,
            provider_id: parse_id("quote line item", &self.provider_id)?,
            coverage_id: parse_id("quote line item", &self.coverage_id)?,
            price: self.price,
            limit_amount: self.limit_amount,
            deductible_amount: self.deductible_amount,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

fn status_names(statuses: &[QuoteStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// SurrealDB implementation of the Quote repository.
#[derive(Clone)]
pub struct SurrealQuoteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealQuoteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> QuoteRepository for SurrealQuoteRepository<C> {
    async fn create(
        &self,
        agent_id: Uuid,
        agency_id: Uuid,
        input: CreateQuote,
    ) -> BrokerResult<Quote> {
        let id_str = Uuid::new_v4().to_string();

        let vehicle_guard = if input.vehicle_id.is_some() {
            "ELSE IF array::len((SELECT VALUE id FROM type::record('vehicle', $vehicle_id) \
                 WHERE customer_id = $customer_id)) = 0 { \
                 THROW '[invalid] vehicle does not belong to the customer' \
             } "
        } else {
            ""
        };
        let query = format!(
            "IF array::len((SELECT VALUE id FROM type::record('user', $agent_id) \
                 WHERE agency_id = $agency_id AND role = 'Agent')) = 0 {{ \
                 THROW '[not_found] agent' \
             }} ELSE IF array::len((SELECT VALUE id FROM type::record('user', $customer_id) \
                 WHERE agency_id = $agency_id AND role = 'Customer')) = 0 {{ \
                 THROW '[not_found] customer' \
             }} {vehicle_guard}ELSE {{ \
                 CREATE type::record('quote', $id) SET \
                 agent_id = $agent_id, customer_id = $customer_id, \
                 vehicle_id = $vehicle_id, status = 'Draft', \
                 metadata = $metadata \
                 RETURN meta::id(id) AS record_id, * \
             }}"
        );

        let result = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("agent_id", agent_id.to_string()))
            .bind(("agency_id", agency_id.to_string()))
            .bind(("customer_id", input.customer_id.to_string()))
            .bind(("vehicle_id", input.vehicle_id.map(|id| id.to_string())))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "quote", &id_str))?;

        let rows: Vec<QuoteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("quote", &id_str))?;

        let quote = row.try_into_quote()?;
        info!(quote_id = %quote.id, %agent_id, customer_id = %quote.customer_id, "quote created");
        Ok(quote)
    }

    async fn get(&self, scope: ScopeFilter, id: Uuid) -> BrokerResult<Quote> {
        let scope = clause(scope, Ownership::Authored("agent_id"));
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM type::record('quote', $id) \
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

        let rows: Vec<QuoteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("quote", id))?;

        Ok(row.try_into_quote()?)
    }

    async fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        from: &[QuoteStatus],
        input: UpdateQuote,
    ) -> BrokerResult<Quote> {
        let scope = clause(scope, Ownership::Authored("agent_id"));

        let mut sets = Vec::new();
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('quote', $id) SET {} \
             WHERE {} AND status IN $allowed \
             RETURN meta::id(id) AS record_id, *",
            sets.join(", "),
            scope.sql
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("allowed", status_names(from)))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent));
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "quote", id))?;

        let rows: Vec<QuoteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("quote", id))?;

        Ok(row.try_into_quote()?)
    }

    async fn list(
        &self,
        scope: ScopeFilter,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Quote>> {
        let scope = clause(scope, Ownership::Authored("agent_id"));
        let total = count(
            &self.db,
            "quote",
            &scope.sql,
            vec![
                ("scope_agency", scope.agency.clone().into()),
                ("scope_agent", scope.agent.clone().into()),
            ],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM quote WHERE {} \
             ORDER BY quote_date DESC LIMIT $limit START $offset",
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

        let rows: Vec<QuoteRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_quote())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_line_item(
        &self,
        agent_id: Uuid,
        agency_id: Uuid,
        quote_id: Uuid,
        input: CreateLineItem,
    ) -> BrokerResult<QuoteLineItem> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "IF array::len((SELECT VALUE id FROM type::record('quote', $quote_id) \
                     WHERE agent_id = $agent_id AND agent_id IN \
                     (SELECT VALUE meta::id(id) FROM user WHERE agency_id = $agency_id))) = 0 { \
                     THROW '[not_found] quote' \
                 } ELSE IF array::len((SELECT VALUE id FROM type::record('quote', $quote_id) \
                     WHERE status IN ['Draft', 'Presented'])) = 0 { \
                     THROW '[conflict] quote is already bound' \
                 } ELSE IF array::len((SELECT VALUE id FROM provider_grant \
                     WHERE agency_id = $agency_id AND provider_id = $provider_id)) = 0 { \
                     THROW '[denied] provider is not granted to the agency' \
                 } ELSE IF !record::exists(type::record('coverage', $coverage_id)) { \
                     THROW '[invalid] unknown coverage' \
                 } ELSE { \
                     CREATE type::record('quote_line_item', $id) SET \
                     quote_id = $quote_id, provider_id = $provider_id, \
                     coverage_id = $coverage_id, price = $price, \
                     limit_amount = $limit_amount, \
                     deductible_amount = $deductible_amount, \
                     metadata = $metadata \
                     RETURN meta::id(id) AS record_id, * \
                 }",
            )
            .bind(("id", id_str.clone()))
            .bind(("agent_id", agent_id.to_string()))
            .bind(("agency_id", agency_id.to_string()))
            .bind(("quote_id", quote_id.to_string()))
            .bind(("provider_id", input.provider_id.to_string()))
            .bind(("coverage_id", input.coverage_id.to_string()))
            .bind(("price", input.price))
            .bind(("limit_amount", input.limit_amount))
            .bind(("deductible_amount", input.deductible_amount))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "quote", quote_id))?;

        let rows: Vec<LineItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("quote line item", &id_str))?;

        Ok(row.try_into_line_item()?)
    }

    async fn list_line_items(
        &self,
        scope: ScopeFilter,
        quote_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<QuoteLineItem>> {
        let scope = clause(scope, Ownership::ViaQuote("quote_id"));
        let mut filter = scope.sql.clone();
        if quote_id.is_some() {
            filter.push_str(" AND quote_id = $quote_id");
        }
        let quote = quote_id.map(|id| id.to_string()).unwrap_or_default();

        let total = count(
            &self.db,
            "quote_line_item",
            &filter,
            vec![
                ("quote_id", quote.clone().into()),
                ("scope_agency", scope.agency.clone().into()),
                ("scope_agent", scope.agent.clone().into()),
            ],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM quote_line_item WHERE {filter} \
             ORDER BY created_at ASC LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("quote_id", quote))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LineItemRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_line_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
