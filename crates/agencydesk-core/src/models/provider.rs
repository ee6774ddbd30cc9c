//! Insurance provider, grant and coverage models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An underwriter. Providers are global; an agency sees one only
/// through a [`ProviderGrant`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub contact_info: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProvider {
    pub name: String,
    pub contact_info: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProvider {
    pub name: Option<String>,
    pub contact_info: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Agency-to-provider access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderGrant {
    pub agency_id: Uuid,
    pub provider_id: Uuid,
}

/// A kind of cover that can be priced on a quote line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coverage {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCoverage {
    pub name: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
