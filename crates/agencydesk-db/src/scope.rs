//! Translation of a [`ScopeFilter`] into a SurrealQL predicate.
//!
//! Membership is never copied onto child rows. A vehicle, quote or
//! history row points at an identity, and the predicate asks the `user`
//! table for that identity's agency when the statement runs. Moving an
//! identity between agencies therefore takes effect immediately for
//! every read and write.

use agencydesk_core::authz::ScopeFilter;

/// How a table's rows relate to an agency.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Ownership {
    /// The row carries the agency id in this field.
    Direct(&'static str),
    /// The row points at an identity through this field.
    ViaUser(&'static str),
    /// Like `ViaUser`, and agents only see rows they authored.
    Authored(&'static str),
    /// The row points at a quote through this field.
    ViaQuote(&'static str),
}

/// A rendered predicate plus its bind values. Both parameters are always
/// bound so call sites stay uniform.
#[derive(Debug, Clone)]
pub(crate) struct ScopeClause {
    pub sql: String,
    pub agency: String,
    pub agent: String,
}

const MEMBERS: &str = "(SELECT VALUE meta::id(id) FROM user WHERE agency_id = $scope_agency)";

pub(crate) fn clause(scope: ScopeFilter, ownership: Ownership) -> ScopeClause {
    let agency = scope.agency_id().map(|id| id.to_string()).unwrap_or_default();
    let agent = scope.agent_id().map(|id| id.to_string()).unwrap_or_default();

    let sql = match (scope, ownership) {
        (ScopeFilter::Global, _) => "true".to_string(),
        (_, Ownership::Direct(field)) => format!("{field} = $scope_agency"),
        (_, Ownership::ViaUser(field)) => format!("{field} IN {MEMBERS}"),
        (ScopeFilter::Agency { .. }, Ownership::Authored(field)) => {
            format!("{field} IN {MEMBERS}")
        }
        (ScopeFilter::Agent { .. }, Ownership::Authored(field)) => {
            format!("{field} = $scope_agent AND {field} IN {MEMBERS}")
        }
        (ScopeFilter::Agency { .. }, Ownership::ViaQuote(field)) => format!(
            "{field} IN (SELECT VALUE meta::id(id) FROM quote WHERE agent_id IN {MEMBERS})"
        ),
        (ScopeFilter::Agent { .. }, Ownership::ViaQuote(field)) => format!(
            "{field} IN (SELECT VALUE meta::id(id) FROM quote \
             WHERE agent_id = $scope_agent AND agent_id IN {MEMBERS})"
        ),
    };

    ScopeClause { sql, agency, agent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn global_scope_matches_everything() {
        let c = clause(ScopeFilter::Global, Ownership::Direct("agency_id"));
        assert_eq!(c.sql, "true");
        assert!(c.agency.is_empty());
    }

    #[test]
    fn agency_scope_on_direct_table() {
        let agency_id = Uuid::new_v4();
        let c = clause(
            ScopeFilter::Agency { agency_id },
            Ownership::Direct("agency_id"),
        );
        assert_eq!(c.sql, "agency_id = $scope_agency");
        assert_eq!(c.agency, agency_id.to_string());
    }

    #[test]
    fn child_rows_resolve_membership_through_user() {
        let c = clause(
            ScopeFilter::Agency {
                agency_id: Uuid::new_v4(),
            },
            Ownership::ViaUser("customer_id"),
        );
        assert!(c.sql.starts_with("customer_id IN (SELECT VALUE meta::id(id) FROM user"));
    }

    #[test]
    fn agent_scope_restricts_authored_rows() {
        let agent_id = Uuid::new_v4();
        let c = clause(
            ScopeFilter::Agent {
                agent_id,
                agency_id: Uuid::new_v4(),
            },
            Ownership::Authored("agent_id"),
        );
        assert!(c.sql.starts_with("agent_id = $scope_agent AND"));
        assert_eq!(c.agent, agent_id.to_string());
    }
}
