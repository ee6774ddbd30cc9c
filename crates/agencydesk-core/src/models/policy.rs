//! Policy domain model. Policies only come into existence through bind.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BrokerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyStatus {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Expired" => Ok(Self::Expired),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(BrokerError::validation(format!(
                "unknown policy status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub customer_id: Uuid,
    pub agent_id: Uuid,
    pub provider_id: Uuid,
    pub policy_number: String,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub status: PolicyStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Bind request. The quote id comes from the path or payload; the
/// customer is always copied from the quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindQuote {
    pub quote_id: Uuid,
    pub provider_id: Uuid,
    pub policy_number: Option<String>,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub metadata: Option<serde_json::Value>,
}

/// Fully resolved bind, handed to the store for the atomic write. The
/// customer is copied from the quote inside that write.
#[derive(Debug, Clone)]
pub struct NewPolicy {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub agent_id: Uuid,
    /// Agency the agent acts for; the provider grant is checked against it.
    pub agency_id: Uuid,
    pub provider_id: Uuid,
    pub policy_number: String,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub metadata: serde_json::Value,
}

/// Generate a policy number from the bind time and the quote id.
///
/// Uniqueness comes from the quote id, since at most one policy exists
/// per quote.
pub fn generate_policy_number(now: DateTime<Utc>, quote_id: Uuid) -> String {
    format!("POL-{}-{}", now.timestamp(), quote_id.simple())
}
