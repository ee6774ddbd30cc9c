//! Identity directory: creating, reading, updating and deleting
//! identities and profiles under the role rules.

use std::sync::Arc;

use agencydesk_core::authz::{self, Caller, Operation, ResourceKind, ScopeFilter, Target};
use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::{
    DEFAULT_MIN_PASSWORD_LENGTH, NewIdentity, UpdateUser, User, ensure_password_policy,
};
use agencydesk_core::repository::{
    DeleteTarget, LocationRepository, PaginatedResult, Pagination, RecordDeleter, Store,
    UserRepository,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::info;
use uuid::Uuid;

pub struct IdentityService<S> {
    store: Arc<S>,
    min_password_length: usize,
}

impl<S> Clone for IdentityService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            min_password_length: self.min_password_length,
        }
    }
}

/// A random password for identities created without one
/// (32 bytes, base64url without padding).
fn generate_password() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn one_role(role: Role) -> &'static [Role] {
    match role {
        Role::MasterAdmin => &[Role::MasterAdmin],
        Role::AgencyAdmin => &[Role::AgencyAdmin],
        Role::LocationAdmin => &[Role::LocationAdmin],
        Role::Agent => &[Role::Agent],
        Role::Customer => &[Role::Customer],
    }
}

fn validate_email(email: &str) -> BrokerResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(BrokerError::validation("email address is malformed")),
    }
}

fn validate_name(field: &str, value: &str) -> BrokerResult<()> {
    if value.trim().is_empty() {
        return Err(BrokerError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

impl<S: Store> IdentityService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }

    /// Shortest password accepted when one is supplied at creation.
    pub fn with_min_password_length(mut self, min_password_length: usize) -> Self {
        self.min_password_length = min_password_length;
        self
    }

    /// Create an identity with `role`.
    ///
    /// MasterAdmins choose the agency; everyone else creates inside
    /// their own. Only Customers may be created without a password.
    pub async fn create(
        &self,
        caller: &Caller,
        role: Role,
        agency_id: Option<Uuid>,
        input: NewIdentity,
    ) -> BrokerResult<User> {
        authz::require(caller, ResourceKind::Identity, Operation::Write)?;
        authz::ensure_writable_role(caller, role)?;

        let agency_id = match (caller.role, role.requires_agency()) {
            (Role::MasterAdmin, true) => Some(
                agency_id.ok_or_else(|| BrokerError::validation("agency_id is required"))?,
            ),
            (Role::MasterAdmin, false) => None,
            (_, _) => {
                let own = caller.agency()?;
                if let Some(requested) = agency_id.filter(|requested| *requested != own) {
                    return Err(BrokerError::not_found("agency", requested));
                }
                Some(own)
            }
        };

        validate_name("first_name", &input.first_name)?;
        validate_name("last_name", &input.last_name)?;
        validate_email(&input.email)?;

        let password = match (input.password.clone(), role) {
            (Some(password), _) => {
                ensure_password_policy(&password, self.min_password_length)?;
                password
            }
            (None, Role::Customer) => generate_password(),
            (None, _) => return Err(BrokerError::validation("password is required")),
        };

        if let (Some(location_id), Some(agency_id)) = (input.location_id, agency_id) {
            self.store
                .locations()
                .get(ScopeFilter::Agency { agency_id }, location_id)
                .await?;
        }

        let user = self
            .store
            .users()
            .create(input.into_create(role, agency_id, password))
            .await?;
        info!(
            caller = %caller.user_id,
            user_id = %user.id,
            role = %role,
            "identity registered"
        );
        Ok(user)
    }

    /// The caller's own profile.
    pub async fn me(&self, caller: &Caller) -> BrokerResult<User> {
        self.store.users().get_by_id(caller.user_id).await
    }

    /// One identity, if the caller may see it.
    pub async fn get(&self, caller: &Caller, id: Uuid) -> BrokerResult<User> {
        if id == caller.user_id {
            return self.me(caller).await;
        }
        let scope = authz::scope_filter(caller, ResourceKind::Identity)?;
        let user = self.store.users().get(scope, id).await?;
        authz::authorize(
            caller,
            Operation::Read,
            &Target::identity(user.id, user.role, user.agency_id),
        )?;
        Ok(user)
    }

    /// Identities visible to the caller, optionally of a single role.
    pub async fn list(
        &self,
        caller: &Caller,
        role: Option<Role>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<User>> {
        let scope = authz::scope_filter(caller, ResourceKind::Identity)?;
        let roles = match role {
            Some(role) => {
                authz::ensure_visible_role(caller, role)?;
                one_role(role)
            }
            None => authz::visible_roles(caller.role),
        };
        self.store.users().list(scope, roles, pagination).await
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        input: UpdateUser,
    ) -> BrokerResult<User> {
        authz::require(caller, ResourceKind::Identity, Operation::Write)?;
        let scope = authz::scope_filter(caller, ResourceKind::Identity)?;
        let existing = self.store.users().get(scope, id).await?;
        authz::authorize(
            caller,
            Operation::Write,
            &Target::identity(existing.id, existing.role, existing.agency_id),
        )?;

        if let Some(first_name) = &input.first_name {
            validate_name("first_name", first_name)?;
        }
        if let Some(last_name) = &input.last_name {
            validate_name("last_name", last_name)?;
        }
        if let Some(email) = &input.email {
            validate_email(email)?;
        }
        if let (Some(location_id), Some(agency_id)) = (input.location_id, existing.agency_id) {
            self.store
                .locations()
                .get(ScopeFilter::Agency { agency_id }, location_id)
                .await?;
        }

        // The role restriction is repeated in the write itself.
        let user = self
            .store
            .users()
            .update(scope, id, authz::writable_roles(caller.role), input)
            .await?;
        info!(caller = %caller.user_id, user_id = %id, "identity updated");
        Ok(user)
    }

    /// Permanently remove an identity and its satellite records.
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> BrokerResult<()> {
        authz::require(caller, ResourceKind::Identity, Operation::Write)?;
        if id == caller.user_id {
            return Err(BrokerError::validation("an identity cannot delete itself"));
        }
        let scope = authz::scope_filter(caller, ResourceKind::Identity)?;
        let existing = self.store.users().get(scope, id).await?;
        authz::authorize(
            caller,
            Operation::Write,
            &Target::identity(existing.id, existing.role, existing.agency_id),
        )?;

        self.store
            .deleter()
            .delete(
                scope,
                DeleteTarget::Identity {
                    id,
                    roles: authz::writable_roles(caller.role),
                },
            )
            .await?;
        info!(
            caller = %caller.user_id,
            user_id = %id,
            role = %existing.role,
            "identity deleted"
        );
        Ok(())
    }
}
