//! Agency domain model.
//!
//! Agencies are the tenants of the system. Every identity other than a
//! MasterAdmin belongs to exactly one agency, and almost every record
//! is visible only inside the agency that owns it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agency {
    pub id: Uuid,
    pub name: String,
    /// Code issued to the agency by carriers, if any.
    pub agent_code: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgency {
    pub name: String,
    pub agent_code: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAgency {
    pub name: Option<String>,
    pub agent_code: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A physical office of an agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub address: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The owning agency is taken from the caller, never from the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocation {
    pub address: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateLocation {
    pub address: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
