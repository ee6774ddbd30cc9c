//! Quote domain model and its status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BrokerError;

/// Forward-only quote lifecycle: Draft -> Presented -> Bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteStatus {
    Draft,
    Presented,
    Bound,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Presented => "Presented",
            Self::Bound => "Bound",
        }
    }

    /// Whether a quote in this state can still be bound.
    pub fn is_bindable(self) -> bool {
        matches!(self, Self::Draft | Self::Presented)
    }

    /// Transitions reachable through the generic update path.
    ///
    /// Bound is only reachable through the bind workflow, so it is never
    /// a valid target here. Staying in the same state is allowed.
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Draft)
                | (Self::Draft, Self::Presented)
                | (Self::Presented, Self::Presented)
        )
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "Presented" => Ok(Self::Presented),
            "Bound" => Ok(Self::Bound),
            other => Err(BrokerError::validation(format!(
                "unknown quote status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub status: QuoteStatus,
    pub metadata: serde_json::Value,
    pub quote_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authoring agent is always the caller; it is not part of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuote {
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateQuote {
    pub status: Option<QuoteStatus>,
    pub metadata: Option<serde_json::Value>,
}

/// A priced coverage from one provider attached to a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub provider_id: Uuid,
    pub coverage_id: Uuid,
    pub price: f64,
    pub limit_amount: Option<String>,
    pub deductible_amount: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLineItem {
    pub provider_id: Uuid,
    pub coverage_id: Uuid,
    pub price: f64,
    pub limit_amount: Option<String>,
    pub deductible_amount: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
