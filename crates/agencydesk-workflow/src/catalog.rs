//! Provider catalogue, per-agency provider grants and coverages.
//!
//! Providers and coverages are global records maintained by
//! MasterAdmins. A provider becomes visible to an agency only through
//! a grant; reading an ungranted provider is `Forbidden`, not hidden.

use std::sync::Arc;

use agencydesk_core::authz::{self, Caller, Operation, ResourceKind, Target};
use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::provider::{
    Coverage, CreateCoverage, CreateProvider, Provider, ProviderGrant, UpdateProvider,
};
use agencydesk_core::models::role::Role;
use agencydesk_core::repository::{
    AgencyRepository, CoverageRepository, DeleteTarget, PaginatedResult, Pagination,
    ProviderRepository, RecordDeleter, Store,
};
use tracing::info;
use uuid::Uuid;

pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_provider(
        &self,
        caller: &Caller,
        input: CreateProvider,
    ) -> BrokerResult<Provider> {
        authz::require(caller, ResourceKind::Provider, Operation::Write)?;
        if input.name.trim().is_empty() {
            return Err(BrokerError::validation("name must not be empty"));
        }
        let provider = self.store.providers().create(input).await?;
        info!(caller = %caller.user_id, provider_id = %provider.id, "provider created");
        Ok(provider)
    }

    /// A provider, if the caller's agency has been granted it.
    pub async fn get_provider(&self, caller: &Caller, id: Uuid) -> BrokerResult<Provider> {
        let target = Target::new(ResourceKind::Provider, id);
        let target = match (caller.role, caller.agency_id) {
            (Role::MasterAdmin, _) | (_, None) => target,
            (_, Some(agency_id)) => {
                let granted = self.store.providers().is_granted(agency_id, id).await?;
                target.in_agency(granted.then_some(agency_id))
            }
        };
        authz::authorize(caller, Operation::Read, &target)?;
        self.store.providers().get_by_id(id).await
    }

    /// All providers for a MasterAdmin; the granted set for anyone else.
    pub async fn list_providers(
        &self,
        caller: &Caller,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Provider>> {
        authz::require(caller, ResourceKind::Provider, Operation::Read)?;
        if caller.role == Role::MasterAdmin {
            return self.store.providers().list(pagination).await;
        }
        self.store
            .providers()
            .list_granted(caller.agency()?, pagination)
            .await
    }

    pub async fn update_provider(
        &self,
        caller: &Caller,
        id: Uuid,
        input: UpdateProvider,
    ) -> BrokerResult<Provider> {
        authz::require(caller, ResourceKind::Provider, Operation::Write)?;
        let provider = self.store.providers().update(id, input).await?;
        info!(caller = %caller.user_id, provider_id = %id, "provider updated");
        Ok(provider)
    }

    /// Delete a provider together with every grant referencing it.
    pub async fn delete_provider(&self, caller: &Caller, id: Uuid) -> BrokerResult<()> {
        authz::require(caller, ResourceKind::Provider, Operation::Write)?;
        let scope = authz::scope_filter(caller, ResourceKind::Provider)?;
        self.store
            .deleter()
            .delete(scope, DeleteTarget::Provider(id))
            .await?;
        info!(caller = %caller.user_id, provider_id = %id, "provider deleted");
        Ok(())
    }

    // -- grants ------------------------------------------------------------

    pub async fn grant(
        &self,
        caller: &Caller,
        agency_id: Uuid,
        provider_id: Uuid,
    ) -> BrokerResult<ProviderGrant> {
        authz::require(caller, ResourceKind::ProviderGrant, Operation::Write)?;
        let grant = self.store.providers().grant(agency_id, provider_id).await?;
        info!(
            caller = %caller.user_id,
            agency_id = %agency_id,
            provider_id = %provider_id,
            "provider granted"
        );
        Ok(grant)
    }

    pub async fn revoke(
        &self,
        caller: &Caller,
        agency_id: Uuid,
        provider_id: Uuid,
    ) -> BrokerResult<()> {
        authz::require(caller, ResourceKind::ProviderGrant, Operation::Write)?;
        self.store.providers().revoke(agency_id, provider_id).await?;
        info!(
            caller = %caller.user_id,
            agency_id = %agency_id,
            provider_id = %provider_id,
            "provider grant revoked"
        );
        Ok(())
    }

    /// Providers granted to `agency_id`, as seen by the caller.
    pub async fn granted_to(
        &self,
        caller: &Caller,
        agency_id: Uuid,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Provider>> {
        let target = Target::new(ResourceKind::ProviderGrant, agency_id).in_agency(Some(agency_id));
        authz::authorize(caller, Operation::Read, &target)?;
        // Hide the difference between an empty grant set and no agency.
        self.store.agencies().get_by_id(agency_id).await?;
        self.store.providers().list_granted(agency_id, pagination).await
    }

    // -- coverages ---------------------------------------------------------

    pub async fn create_coverage(
        &self,
        caller: &Caller,
        input: CreateCoverage,
    ) -> BrokerResult<Coverage> {
        authz::require(caller, ResourceKind::Coverage, Operation::Write)?;
        if input.name.trim().is_empty() {
            return Err(BrokerError::validation("name must not be empty"));
        }
        let coverage = self.store.coverages().create(input).await?;
        info!(caller = %caller.user_id, coverage_id = %coverage.id, "coverage created");
        Ok(coverage)
    }

    pub async fn get_coverage(&self, caller: &Caller, id: Uuid) -> BrokerResult<Coverage> {
        authz::require(caller, ResourceKind::Coverage, Operation::Read)?;
        self.store.coverages().get_by_id(id).await
    }

    pub async fn list_coverages(
        &self,
        caller: &Caller,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Coverage>> {
        authz::require(caller, ResourceKind::Coverage, Operation::Read)?;
        self.store.coverages().list(pagination).await
    }
}
