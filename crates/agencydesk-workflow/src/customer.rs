//! Customer satellite records: vehicles, driver assignments, driving
//! history and insurance history.
//!
//! Every write names a customer (directly or through a vehicle); the
//! store re-checks that the customer belongs to the caller's agency in
//! the same statement that inserts, so a cross-agency reference is
//! `NotFound` whether or not the customer exists.

use std::sync::Arc;

use agencydesk_core::authz::{self, Caller, Operation, ResourceKind};
use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::vehicle::{
    AddDrivingHistory, AddInsuranceHistory, AssignDriver, CreateVehicle, DrivingHistory,
    InsuranceHistory, UpdateVehicle, Vehicle, VehicleDetails, VehicleDriver,
};
use agencydesk_core::repository::{
    HistoryRepository, PaginatedResult, Pagination, Store, VehicleRepository,
};
use tracing::info;
use uuid::Uuid;

pub struct CustomerRecordService<S> {
    store: Arc<S>,
}

impl<S> Clone for CustomerRecordService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// 17 characters from the VIN alphabet (no I, O or Q).
fn validate_vin(vin: &str) -> BrokerResult<()> {
    let allowed = |c: char| {
        c.is_ascii_alphanumeric() && !matches!(c.to_ascii_uppercase(), 'I' | 'O' | 'Q')
    };
    if vin.len() == 17 && vin.chars().all(allowed) {
        Ok(())
    } else {
        Err(BrokerError::validation("vin must be 17 characters without I, O or Q"))
    }
}

fn validate_details(details: &VehicleDetails) -> BrokerResult<()> {
    if details.year.is_some_and(|year| !(1886..=2100).contains(&year)) {
        return Err(BrokerError::validation("year is out of range"));
    }
    if details.annual_mileage.is_some_and(|m| m < 0)
        || details.current_odometer_reading.is_some_and(|m| m < 0)
    {
        return Err(BrokerError::validation("mileage must not be negative"));
    }
    if details.cost_new.is_some_and(|c| !c.is_finite() || c < 0.0) {
        return Err(BrokerError::validation("cost_new must not be negative"));
    }
    Ok(())
}

impl<S: Store> CustomerRecordService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // -- vehicles ----------------------------------------------------------

    pub async fn create_vehicle(
        &self,
        caller: &Caller,
        mut input: CreateVehicle,
    ) -> BrokerResult<Vehicle> {
        authz::require(caller, ResourceKind::Vehicle, Operation::Write)?;
        input.vin = input.vin.trim().to_ascii_uppercase();
        validate_vin(&input.vin)?;
        validate_details(&input.details)?;

        let agency_id = caller.agency()?;
        let vehicle = self.store.vehicles().create(agency_id, input).await?;
        info!(
            caller = %caller.user_id,
            vehicle_id = %vehicle.id,
            customer_id = %vehicle.customer_id,
            "vehicle registered"
        );
        Ok(vehicle)
    }

    pub async fn get_vehicle(&self, caller: &Caller, id: Uuid) -> BrokerResult<Vehicle> {
        let scope = authz::scope_filter(caller, ResourceKind::Vehicle)?;
        self.store.vehicles().get(scope, id).await
    }

    pub async fn list_vehicles(
        &self,
        caller: &Caller,
        customer_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Vehicle>> {
        let scope = authz::scope_filter(caller, ResourceKind::Vehicle)?;
        self.store
            .vehicles()
            .list(scope, customer_id, pagination)
            .await
    }

    pub async fn update_vehicle(
        &self,
        caller: &Caller,
        id: Uuid,
        mut input: UpdateVehicle,
    ) -> BrokerResult<Vehicle> {
        authz::require(caller, ResourceKind::Vehicle, Operation::Write)?;
        if let Some(vin) = input.vin.as_mut() {
            *vin = vin.trim().to_ascii_uppercase();
            validate_vin(vin)?;
        }
        validate_details(&input.details)?;

        let scope = authz::scope_filter(caller, ResourceKind::Vehicle)?;
        let vehicle = self.store.vehicles().update(scope, id, input).await?;
        info!(caller = %caller.user_id, vehicle_id = %id, "vehicle updated");
        Ok(vehicle)
    }

    // -- drivers -----------------------------------------------------------

    pub async fn assign_driver(
        &self,
        caller: &Caller,
        input: AssignDriver,
    ) -> BrokerResult<VehicleDriver> {
        authz::require(caller, ResourceKind::VehicleDriver, Operation::Write)?;
        let agency_id = caller.agency()?;
        let driver = self.store.vehicles().assign_driver(agency_id, input).await?;
        info!(
            caller = %caller.user_id,
            vehicle_id = %driver.vehicle_id,
            driver_id = %driver.user_id,
            "driver assigned"
        );
        Ok(driver)
    }

    pub async fn list_drivers(
        &self,
        caller: &Caller,
        vehicle_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<VehicleDriver>> {
        let scope = authz::scope_filter(caller, ResourceKind::VehicleDriver)?;
        self.store
            .vehicles()
            .list_drivers(scope, vehicle_id, pagination)
            .await
    }

    // -- history -----------------------------------------------------------

    pub async fn add_driving_history(
        &self,
        caller: &Caller,
        input: AddDrivingHistory,
    ) -> BrokerResult<DrivingHistory> {
        authz::require(caller, ResourceKind::DrivingHistory, Operation::Write)?;
        if let (Some(incident), Some(conviction)) =
            (input.incident.incident_date, input.incident.conviction_date)
        {
            if conviction < incident {
                return Err(BrokerError::validation(
                    "conviction_date precedes incident_date",
                ));
            }
        }
        let agency_id = caller.agency()?;
        let entry = self.store.histories().add_driving(agency_id, input).await?;
        info!(caller = %caller.user_id, user_id = %entry.user_id, "driving history recorded");
        Ok(entry)
    }

    pub async fn list_driving_history(
        &self,
        caller: &Caller,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<DrivingHistory>> {
        let scope = authz::scope_filter(caller, ResourceKind::DrivingHistory)?;
        self.store
            .histories()
            .list_driving(scope, user_id, pagination)
            .await
    }

    pub async fn add_insurance_history(
        &self,
        caller: &Caller,
        input: AddInsuranceHistory,
    ) -> BrokerResult<InsuranceHistory> {
        authz::require(caller, ResourceKind::InsuranceHistory, Operation::Write)?;
        let agency_id = caller.agency()?;
        let entry = self.store.histories().add_insurance(agency_id, input).await?;
        info!(caller = %caller.user_id, user_id = %entry.user_id, "insurance history recorded");
        Ok(entry)
    }

    pub async fn list_insurance_history(
        &self,
        caller: &Caller,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<InsuranceHistory>> {
        let scope = authz::scope_filter(caller, ResourceKind::InsuranceHistory)?;
        self.store
            .histories()
            .list_insurance(scope, user_id, pagination)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vin_alphabet_is_enforced() {
        assert!(validate_vin("1HGCM82633A004352").is_ok());
        assert!(validate_vin("1HGCM82633A00435").is_err());
        assert!(validate_vin("1HGCM82633A00435O").is_err());
        assert!(validate_vin("1HGCM82633A0043-2").is_err());
    }

    #[test]
    fn vehicle_details_reject_impossible_values() {
        let mut details = VehicleDetails {
            year: Some(2020),
            ..Default::default()
        };
        assert!(validate_details(&details).is_ok());
        details.year = Some(1700);
        assert!(validate_details(&details).is_err());
        details.year = None;
        details.annual_mileage = Some(-5);
        assert!(validate_details(&details).is_err());
    }
}
