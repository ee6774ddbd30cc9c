//! Hard-delete implementation of [`RecordDeleter`].
//!
//! Each delete is one guarded statement: the target must be inside the
//! scope, must not be referenced by records that would dangle, and its
//! dependent rows are removed together with it.

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::role::Role;
use agencydesk_core::repository::{DeleteTarget, RecordDeleter};
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::scope::{Ownership, clause};

const DELETE_AGENCY: &str = "\
IF !record::exists(type::record('agency', $id)) { \
    THROW '[not_found] agency' \
} ELSE IF array::len((SELECT VALUE id FROM user WHERE agency_id = $id)) > 0 { \
    THROW '[conflict] agency still has identities' \
} ELSE { \
    DELETE provider_grant WHERE agency_id = $id; \
    DELETE location WHERE agency_id = $id; \
    DELETE type::record('agency', $id); \
}";

const DELETE_PROVIDER: &str = "\
IF !record::exists(type::record('provider', $id)) { \
    THROW '[not_found] provider' \
} ELSE { \
    DELETE provider_grant WHERE provider_id = $id; \
    DELETE type::record('provider', $id); \
}";

/// Removes records permanently.
#[derive(Clone)]
pub struct HardDelete<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> HardDelete<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn run(
        &self,
        query: &str,
        id: String,
        scope_agency: String,
        roles: Vec<String>,
        entity: &str,
    ) -> Result<(), DbError> {
        let result = self
            .db
            .query(query)
            .bind(("id", id.clone()))
            .bind(("scope_agency", scope_agency))
            .bind(("scope_agent", String::new()))
            .bind(("roles", roles))
            .await?;

        result
            .check()
            .map_err(|e| DbError::from_statement(e, entity, &id))?;
        Ok(())
    }
}

fn delete_location(scope_sql: &str) -> String {
    format!(
        "IF array::len((SELECT VALUE id FROM type::record('location', $id) \
             WHERE {scope_sql})) = 0 {{ \
             THROW '[not_found] location' \
         }} ELSE {{ \
             UPDATE user SET location_id = NONE WHERE location_id = $id; \
             DELETE type::record('location', $id); \
         }}"
    )
}

fn delete_identity(scope_sql: &str) -> String {
    format!(
        "IF array::len((SELECT VALUE id FROM type::record('user', $id) \
             WHERE {scope_sql} AND role IN $roles)) = 0 {{ \
             THROW '[not_found] user' \
         }} ELSE IF array::len((SELECT VALUE id FROM quote \
             WHERE agent_id = $id OR customer_id = $id)) > 0 {{ \
             THROW '[conflict] identity is referenced by quotes' \
         }} ELSE {{ \
             DELETE vehicle_driver WHERE user_id = $id OR vehicle_id IN \
                 (SELECT VALUE meta::id(id) FROM vehicle WHERE customer_id = $id); \
             DELETE vehicle WHERE customer_id = $id; \
             DELETE driving_history WHERE user_id = $id; \
             DELETE insurance_history WHERE user_id = $id; \
             DELETE session WHERE user_id = $id; \
             DELETE password_reset WHERE user_id = $id; \
             DELETE type::record('user', $id); \
         }}"
    )
}

impl<C: Connection> RecordDeleter for HardDelete<C> {
    async fn delete(&self, scope: ScopeFilter, target: DeleteTarget) -> BrokerResult<()> {
        match target {
            DeleteTarget::Agency(id) => {
                self.run(DELETE_AGENCY, id.to_string(), String::new(), Vec::new(), "agency")
                    .await?;
                info!(agency_id = %id, "agency deleted");
            }
            DeleteTarget::Provider(id) => {
                self.run(DELETE_PROVIDER, id.to_string(), String::new(), Vec::new(), "provider")
                    .await?;
                info!(provider_id = %id, "provider deleted");
            }
            DeleteTarget::Location(id) => {
                let scope = clause(scope, Ownership::Direct("agency_id"));
                self.run(
                    &delete_location(&scope.sql),
                    id.to_string(),
                    scope.agency,
                    Vec::new(),
                    "location",
                )
                .await?;
                info!(location_id = %id, "location deleted");
            }
            DeleteTarget::Identity { id, roles } => {
                let scope = clause(scope, Ownership::Direct("agency_id"));
                let roles: Vec<String> = roles.iter().map(|r: &Role| r.as_str().into()).collect();
                self.run(
                    &delete_identity(&scope.sql),
                    id.to_string(),
                    scope.agency,
                    roles,
                    "user",
                )
                .await?;
                info!(user_id = %id, "identity deleted");
            }
        }
        Ok(())
    }
}
