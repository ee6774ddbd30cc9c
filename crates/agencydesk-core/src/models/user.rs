//! Identity (user) domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use crate::error::{BrokerError, BrokerResult};

/// Shortest password accepted unless configured otherwise.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Reject passwords shorter than `min_length` characters.
pub fn ensure_password_policy(password: &str, min_length: usize) -> BrokerResult<()> {
    if password.chars().count() < min_length {
        return Err(BrokerError::validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2id PHC string. Never serialized to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    /// `None` only for MasterAdmin.
    pub agency_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Descriptive fields kept on every identity. In an update payload a
/// `Some` value overwrites the stored one and `None` leaves it alone.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_physical_impairment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_financial_filing: Option<bool>,
}

/// Identity fields supplied by whoever creates the identity. Role and
/// agency are decided by the creating workflow, not by the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Option<String>,
    pub location_id: Option<Uuid>,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub metadata: Option<serde_json::Value>,
}

impl NewIdentity {
    pub fn into_create(self, role: Role, agency_id: Option<Uuid>, password: String) -> CreateUser {
        CreateUser {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password,
            role,
            agency_id,
            location_id: self.location_id,
            profile: self.profile,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: Role,
    pub agency_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub profile: UserProfile,
    pub metadata: Option<serde_json::Value>,
}

/// Role and agency are immutable after creation and therefore absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub location_id: Option<Uuid>,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub metadata: Option<serde_json::Value>,
}
