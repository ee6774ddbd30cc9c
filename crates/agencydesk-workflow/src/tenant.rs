//! Tenant resolution: from an authenticated subject to a [`Caller`].

use std::sync::Arc;

use agencydesk_core::authz::Caller;
use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::role::Role;
use agencydesk_core::repository::{Store, UserRepository};
use uuid::Uuid;

pub struct TenantResolver<S> {
    store: Arc<S>,
}

impl<S: Store> TenantResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The agency owning `identity_id`, if any. Read fresh on every
    /// call; there is no cache to invalidate.
    pub async fn resolve(&self, identity_id: Uuid) -> BrokerResult<Option<Uuid>> {
        Ok(self.store.users().get_by_id(identity_id).await?.agency_id)
    }

    /// Build the caller for a verified `(subject, role)` pair.
    ///
    /// A subject that no longer exists, or whose stored role differs
    /// from the one in its token, is unauthenticated.
    pub async fn caller(&self, user_id: Uuid, role: Role) -> BrokerResult<Caller> {
        let user = match self.store.users().get_by_id(user_id).await {
            Ok(user) => user,
            Err(BrokerError::NotFound { .. }) => {
                return Err(BrokerError::Unauthenticated {
                    reason: "identity no longer exists".into(),
                });
            }
            Err(e) => return Err(e),
        };
        if user.role != role {
            return Err(BrokerError::Unauthenticated {
                reason: "token role does not match identity".into(),
            });
        }
        if role.requires_agency() && user.agency_id.is_none() {
            return Err(BrokerError::Internal(format!(
                "{role} identity {user_id} has no agency"
            )));
        }
        Ok(Caller {
            user_id,
            role,
            agency_id: user.agency_id,
        })
    }
}

impl<S> Clone for TenantResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
