//! First-start provisioning.

use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::{CreateUser, UserProfile};
use agencydesk_core::repository::{Store, UserRepository};
use tracing::info;

use crate::config::AdminSeed;

/// Create the initial MasterAdmin unless one already exists.
///
/// Returns whether an identity was created.
pub async fn seed_master_admin<S: Store>(store: &S, seed: &AdminSeed) -> BrokerResult<bool> {
    if store.users().count_by_role(Role::MasterAdmin).await? > 0 {
        return Ok(false);
    }

    let admin = store
        .users()
        .create(CreateUser {
            first_name: seed.first_name.clone(),
            last_name: seed.last_name.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            role: Role::MasterAdmin,
            agency_id: None,
            location_id: None,
            profile: UserProfile::default(),
            metadata: None,
        })
        .await?;

    info!(user_id = %admin.id, email = %admin.email, "master admin seeded");
    Ok(true)
}
