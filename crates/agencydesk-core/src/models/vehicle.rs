//! Vehicle and the customer satellite records hanging off it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vin: String,
    #[serde(flatten)]
    pub details: VehicleDetails,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VehicleDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_mileage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_odometer_reading: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer_reading_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased_in_last_90_days: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_of_ownership: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_racing_equipment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_existing_damage: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_new: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicle {
    pub customer_id: Uuid,
    pub vin: String,
    #[serde(flatten)]
    pub details: VehicleDetails,
    pub metadata: Option<serde_json::Value>,
}

/// The owning customer cannot be changed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateVehicle {
    pub vin: Option<String>,
    #[serde(flatten)]
    pub details: VehicleDetails,
    pub metadata: Option<serde_json::Value>,
}

/// Assignment of an identity as a driver of a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleDriver {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub details: DriverDetails,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DriverDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_to_insured: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licensing_exception: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_financial_responsibility_filing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_uncompensated_impairment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignDriver {
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub details: DriverDetails,
    pub metadata: Option<serde_json::Value>,
}

/// A recorded incident (violation, accident, claim) for an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivingHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub incident: DrivingIncident,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DrivingIncident {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conviction_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDrivingHistory {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub incident: DrivingIncident,
    pub metadata: Option<serde_json::Value>,
}

/// Prior-insurance questionnaire answers for an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub answers: InsuranceAnswers,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InsuranceAnswers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_bodily_injury_limits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_with_current_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuous_insurance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_registered_to_other: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_without_license: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_suspended_revoked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declined_cancelled_non_renewed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub military_deployment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_residence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddInsuranceHistory {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub answers: InsuranceAnswers,
    pub metadata: Option<serde_json::Value>,
}
