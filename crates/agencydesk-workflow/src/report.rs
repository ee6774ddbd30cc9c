//! Aggregate quote and policy counts.
//!
//! The scope comes from the caller alone: global for MasterAdmins, the
//! agency for agency administrators, and the agent's own records for
//! agents.

use std::sync::Arc;

use agencydesk_core::authz::{self, Caller, ResourceKind};
use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::report::{AgentReport, PolicyReport, QuoteReport};
use agencydesk_core::models::role::Role;
use agencydesk_core::repository::{ReportRepository, Store};

pub struct ReportingService<S> {
    store: Arc<S>,
}

impl<S> Clone for ReportingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> ReportingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn quotes(&self, caller: &Caller) -> BrokerResult<QuoteReport> {
        let scope = authz::scope_filter(caller, ResourceKind::Report)?;
        self.store.reports().quote_counts(scope).await
    }

    pub async fn policies(&self, caller: &Caller) -> BrokerResult<PolicyReport> {
        let scope = authz::scope_filter(caller, ResourceKind::Report)?;
        self.store.reports().policy_counts(scope).await
    }

    /// An agent's own quote and policy counts, plus the number of
    /// customers in its agency.
    pub async fn agent_summary(&self, caller: &Caller) -> BrokerResult<AgentReport> {
        if caller.role != Role::Agent {
            return Err(BrokerError::forbidden("only agents have an agent summary"));
        }
        let scope = authz::scope_filter(caller, ResourceKind::Report)?;
        let reports = self.store.reports();
        let quotes = reports.quote_counts(scope).await?;
        let policies = reports.policy_counts(scope).await?;
        let customer_count = reports.customer_count(caller.agency()?).await?;
        Ok(AgentReport {
            agent_id: caller.user_id,
            customer_count,
            quotes,
            policies,
        })
    }
}
