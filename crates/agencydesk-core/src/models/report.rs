//! Aggregate report shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteReport {
    pub total_quotes: u64,
    pub draft_quotes: u64,
    pub presented_quotes: u64,
    pub bound_quotes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub total_policies: u64,
    pub active_policies: u64,
    pub expired_policies: u64,
    pub cancelled_policies: u64,
}

/// Agent dashboard: own quotes and policies plus the tenant's customer count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent_id: Uuid,
    pub customer_count: u64,
    pub quotes: QuoteReport,
    pub policies: PolicyReport,
}
