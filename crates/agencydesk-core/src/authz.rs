//! Authorization engine.
//!
//! Two questions are answered here, both purely from the caller and
//! the target's attributes, never from request parameters:
//!
//! - [`authorize`]: may this caller perform this operation on this
//!   specific record?
//! - [`scope_filter`]: which rows of a resource kind may this caller
//!   see at all? Repositories turn the returned [`ScopeFilter`] into a
//!   query predicate.
//!
//! A missing capability is `Forbidden`. A record outside the caller's
//! agency (or, for agents, not authored by the caller) is `NotFound`,
//! identical to the record not existing.

use uuid::Uuid;

use crate::error::{BrokerError, BrokerResult};
use crate::models::role::Role;

/// The authenticated principal on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    pub agency_id: Option<Uuid>,
}

impl Caller {
    /// The caller's agency, required for every tenant-scoped operation.
    pub fn agency(&self) -> BrokerResult<Uuid> {
        self.agency_id
            .ok_or_else(|| BrokerError::forbidden("caller does not belong to an agency"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Agency,
    Provider,
    ProviderGrant,
    Coverage,
    Identity,
    Location,
    Vehicle,
    VehicleDriver,
    DrivingHistory,
    InsuranceHistory,
    Quote,
    QuoteLineItem,
    Policy,
    Report,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agency => "agency",
            Self::Provider => "provider",
            Self::ProviderGrant => "provider grant",
            Self::Coverage => "coverage",
            Self::Identity => "user",
            Self::Location => "location",
            Self::Vehicle => "vehicle",
            Self::VehicleDriver => "vehicle driver",
            Self::DrivingHistory => "driving history",
            Self::InsuranceHistory => "insurance history",
            Self::Quote => "quote",
            Self::QuoteLineItem => "quote line item",
            Self::Policy => "policy",
            Self::Report => "report",
        }
    }

    /// Kinds an agent sees only when it authored them.
    fn is_agent_owned(self) -> bool {
        matches!(self, Self::Quote | Self::QuoteLineItem | Self::Report)
    }

    /// Kinds not owned by any tenant.
    fn is_global(self) -> bool {
        matches!(self, Self::Coverage)
    }
}

/// Attributes of the record an operation targets, as currently stored.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub kind: ResourceKind,
    pub id: Uuid,
    /// Owning agency. For providers, the agency holding a grant for it
    /// (or `None` when the caller's agency holds none).
    pub agency_id: Option<Uuid>,
    /// Role of the target identity, for [`ResourceKind::Identity`].
    pub role: Option<Role>,
    /// Authoring agent for quotes, line items and policies.
    pub owner_id: Option<Uuid>,
}

impl Target {
    pub fn new(kind: ResourceKind, id: Uuid) -> Self {
        Self {
            kind,
            id,
            agency_id: None,
            role: None,
            owner_id: None,
        }
    }

    pub fn in_agency(mut self, agency_id: Option<Uuid>) -> Self {
        self.agency_id = agency_id;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn owned_by(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn identity(id: Uuid, role: Role, agency_id: Option<Uuid>) -> Self {
        Self::new(ResourceKind::Identity, id)
            .in_agency(agency_id)
            .with_role(role)
    }
}

/// Row-level narrowing for list and aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Every row.
    Global,
    /// Rows belonging to one agency.
    Agency { agency_id: Uuid },
    /// Rows authored by one agent inside its agency.
    Agent { agent_id: Uuid, agency_id: Uuid },
}

impl ScopeFilter {
    pub fn agency_id(&self) -> Option<Uuid> {
        match self {
            Self::Global => None,
            Self::Agency { agency_id } | Self::Agent { agency_id, .. } => Some(*agency_id),
        }
    }

    pub fn agent_id(&self) -> Option<Uuid> {
        match self {
            Self::Agent { agent_id, .. } => Some(*agent_id),
            _ => None,
        }
    }
}

/// Whether `role` holds the capability to perform `op` on `kind` at all.
pub fn can(role: Role, kind: ResourceKind, op: Operation) -> bool {
    use Operation::*;
    use ResourceKind::*;

    match role {
        Role::MasterAdmin => match op {
            Read => true,
            Write => matches!(kind, Agency | Provider | ProviderGrant | Coverage | Identity),
        },
        Role::AgencyAdmin | Role::LocationAdmin => match op {
            Read => matches!(
                kind,
                Agency
                    | Provider
                    | ProviderGrant
                    | Coverage
                    | Identity
                    | Location
                    | Quote
                    | QuoteLineItem
                    | Policy
                    | Report
            ),
            Write => matches!(kind, Location | Identity),
        },
        Role::Agent => match op {
            Read => matches!(
                kind,
                Provider
                    | Coverage
                    | Identity
                    | Vehicle
                    | VehicleDriver
                    | DrivingHistory
                    | InsuranceHistory
                    | Quote
                    | QuoteLineItem
                    | Policy
                    | Report
            ),
            Write => matches!(
                kind,
                Identity
                    | Vehicle
                    | VehicleDriver
                    | DrivingHistory
                    | InsuranceHistory
                    | Quote
                    | QuoteLineItem
                    | Policy
            ),
        },
        Role::Customer => false,
    }
}

/// Identity roles a caller of `role` may see.
pub fn visible_roles(role: Role) -> &'static [Role] {
    match role {
        Role::MasterAdmin => &Role::ALL,
        Role::AgencyAdmin | Role::LocationAdmin => &[
            Role::Agent,
            Role::AgencyAdmin,
            Role::LocationAdmin,
            Role::Customer,
        ],
        Role::Agent => &[Role::Customer, Role::Agent],
        Role::Customer => &[],
    }
}

/// Identity roles a caller of `role` may create, modify or delete.
pub fn writable_roles(role: Role) -> &'static [Role] {
    match role {
        Role::MasterAdmin => &Role::ALL,
        Role::AgencyAdmin | Role::LocationAdmin => &[Role::LocationAdmin, Role::Agent],
        Role::Agent => &[Role::Customer],
        Role::Customer => &[],
    }
}

/// Reject a list-by-role request for a role outside the caller's view.
pub fn ensure_visible_role(caller: &Caller, role: Role) -> BrokerResult<()> {
    if visible_roles(caller.role).contains(&role) {
        Ok(())
    } else {
        Err(BrokerError::forbidden(format!(
            "{} may not view {} identities",
            caller.role, role
        )))
    }
}

/// Reject a write of an identity with a role outside the caller's reach.
pub fn ensure_writable_role(caller: &Caller, role: Role) -> BrokerResult<()> {
    if writable_roles(caller.role).contains(&role) {
        Ok(())
    } else {
        Err(BrokerError::forbidden(format!(
            "{} may not manage {} identities",
            caller.role, role
        )))
    }
}

/// Capability check alone, for operations whose target row does not
/// exist yet or is located by the store under the caller's scope.
pub fn require(caller: &Caller, kind: ResourceKind, op: Operation) -> BrokerResult<()> {
    if can(caller.role, kind, op) {
        return Ok(());
    }
    tracing::debug!(
        caller = %caller.user_id,
        role = %caller.role,
        kind = kind.as_str(),
        ?op,
        "capability denied"
    );
    Err(BrokerError::forbidden(format!(
        "{} may not {} {}",
        caller.role,
        match op {
            Operation::Read => "read",
            Operation::Write => "modify",
        },
        kind.as_str()
    )))
}

/// Decide whether `caller` may perform `op` on `target`.
pub fn authorize(caller: &Caller, op: Operation, target: &Target) -> BrokerResult<()> {
    // Self-view is always allowed.
    if op == Operation::Read
        && target.kind == ResourceKind::Identity
        && target.id == caller.user_id
    {
        return Ok(());
    }

    require(caller, target.kind, op)?;

    if caller.role == Role::MasterAdmin || target.kind.is_global() {
        return check_identity_role(caller, op, target);
    }

    let agency_id = caller.agency()?;
    if target.agency_id != Some(agency_id) {
        tracing::debug!(
            caller = %caller.user_id,
            kind = target.kind.as_str(),
            target = %target.id,
            "cross-tenant access denied"
        );
        // An ungranted provider is a capability problem, not a hidden row.
        if target.kind == ResourceKind::Provider {
            return Err(BrokerError::forbidden(
                "provider is not granted to the caller's agency",
            ));
        }
        return Err(BrokerError::not_found(target.kind.as_str(), target.id));
    }

    if caller.role == Role::Agent
        && target.kind.is_agent_owned()
        && target.owner_id != Some(caller.user_id)
    {
        return Err(BrokerError::not_found(target.kind.as_str(), target.id));
    }

    check_identity_role(caller, op, target)
}

fn check_identity_role(caller: &Caller, op: Operation, target: &Target) -> BrokerResult<()> {
    if target.kind != ResourceKind::Identity {
        return Ok(());
    }
    let Some(role) = target.role else {
        return Ok(());
    };
    match op {
        Operation::Read => ensure_visible_role(caller, role),
        Operation::Write => ensure_writable_role(caller, role),
    }
}

/// Row scope for listing or aggregating `kind` on behalf of `caller`.
pub fn scope_filter(caller: &Caller, kind: ResourceKind) -> BrokerResult<ScopeFilter> {
    if !can(caller.role, kind, Operation::Read) {
        return Err(BrokerError::forbidden(format!(
            "{} may not list {}",
            caller.role,
            kind.as_str()
        )));
    }
    if caller.role == Role::MasterAdmin || kind.is_global() {
        return Ok(ScopeFilter::Global);
    }
    let agency_id = caller.agency()?;
    if caller.role == Role::Agent && kind.is_agent_owned() {
        return Ok(ScopeFilter::Agent {
            agent_id: caller.user_id,
            agency_id,
        });
    }
    Ok(ScopeFilter::Agency { agency_id })
}
