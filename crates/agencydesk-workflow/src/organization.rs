//! Agencies and their locations.

use std::sync::Arc;

use agencydesk_core::authz::{self, Caller, Operation, ResourceKind, Target};
use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::agency::{
    Agency, CreateAgency, CreateLocation, Location, UpdateAgency, UpdateLocation,
};
use agencydesk_core::models::role::Role;
use agencydesk_core::repository::{
    AgencyRepository, DeleteTarget, LocationRepository, PaginatedResult, Pagination,
    RecordDeleter, Store,
};
use tracing::info;
use uuid::Uuid;

pub struct OrganizationService<S> {
    store: Arc<S>,
}

impl<S> Clone for OrganizationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn agency_target(id: Uuid) -> Target {
    Target::new(ResourceKind::Agency, id).in_agency(Some(id))
}

fn require_text(field: &str, value: &str) -> BrokerResult<()> {
    if value.trim().is_empty() {
        return Err(BrokerError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

impl<S: Store> OrganizationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // -- agencies ----------------------------------------------------------

    pub async fn create_agency(
        &self,
        caller: &Caller,
        input: CreateAgency,
    ) -> BrokerResult<Agency> {
        authz::require(caller, ResourceKind::Agency, Operation::Write)?;
        require_text("name", &input.name)?;
        let agency = self.store.agencies().create(input).await?;
        info!(caller = %caller.user_id, agency_id = %agency.id, "agency created");
        Ok(agency)
    }

    pub async fn get_agency(&self, caller: &Caller, id: Uuid) -> BrokerResult<Agency> {
        authz::authorize(caller, Operation::Read, &agency_target(id))?;
        self.store.agencies().get_by_id(id).await
    }

    /// Every agency for a MasterAdmin; the caller's own otherwise.
    pub async fn list_agencies(
        &self,
        caller: &Caller,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Agency>> {
        authz::require(caller, ResourceKind::Agency, Operation::Read)?;
        if caller.role == Role::MasterAdmin {
            return self.store.agencies().list(pagination).await;
        }
        let own = self.store.agencies().get_by_id(caller.agency()?).await?;
        Ok(PaginatedResult {
            items: vec![own],
            total: 1,
            offset: 0,
            limit: pagination.limit,
        })
    }

    pub async fn update_agency(
        &self,
        caller: &Caller,
        id: Uuid,
        input: UpdateAgency,
    ) -> BrokerResult<Agency> {
        authz::authorize(caller, Operation::Write, &agency_target(id))?;
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }
        let agency = self.store.agencies().update(id, input).await?;
        info!(caller = %caller.user_id, agency_id = %id, "agency updated");
        Ok(agency)
    }

    /// Delete an agency that no longer has identities. Its grants and
    /// locations go with it.
    pub async fn delete_agency(&self, caller: &Caller, id: Uuid) -> BrokerResult<()> {
        authz::authorize(caller, Operation::Write, &agency_target(id))?;
        let scope = authz::scope_filter(caller, ResourceKind::Agency)?;
        self.store
            .deleter()
            .delete(scope, DeleteTarget::Agency(id))
            .await?;
        info!(caller = %caller.user_id, agency_id = %id, "agency deleted");
        Ok(())
    }

    // -- locations ---------------------------------------------------------

    pub async fn create_location(
        &self,
        caller: &Caller,
        input: CreateLocation,
    ) -> BrokerResult<Location> {
        authz::require(caller, ResourceKind::Location, Operation::Write)?;
        require_text("address", &input.address)?;
        let agency_id = caller.agency()?;
        let location = self.store.locations().create(agency_id, input).await?;
        info!(
            caller = %caller.user_id,
            agency_id = %agency_id,
            location_id = %location.id,
            "location created"
        );
        Ok(location)
    }

    pub async fn get_location(&self, caller: &Caller, id: Uuid) -> BrokerResult<Location> {
        let scope = authz::scope_filter(caller, ResourceKind::Location)?;
        self.store.locations().get(scope, id).await
    }

    pub async fn list_locations(
        &self,
        caller: &Caller,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Location>> {
        let scope = authz::scope_filter(caller, ResourceKind::Location)?;
        self.store.locations().list(scope, pagination).await
    }

    pub async fn update_location(
        &self,
        caller: &Caller,
        id: Uuid,
        input: UpdateLocation,
    ) -> BrokerResult<Location> {
        authz::require(caller, ResourceKind::Location, Operation::Write)?;
        if let Some(address) = &input.address {
            require_text("address", address)?;
        }
        let scope = authz::scope_filter(caller, ResourceKind::Location)?;
        let location = self.store.locations().update(scope, id, input).await?;
        info!(caller = %caller.user_id, location_id = %id, "location updated");
        Ok(location)
    }

    pub async fn delete_location(&self, caller: &Caller, id: Uuid) -> BrokerResult<()> {
        authz::require(caller, ResourceKind::Location, Operation::Write)?;
        let scope = authz::scope_filter(caller, ResourceKind::Location)?;
        self.store
            .deleter()
            .delete(scope, DeleteTarget::Location(id))
            .await?;
        info!(caller = %caller.user_id, location_id = %id, "location deleted");
        Ok(())
    }
}
