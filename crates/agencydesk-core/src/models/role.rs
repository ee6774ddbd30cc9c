//! Role model.
//!
//! Roles form a closed set. Every match over [`Role`] in the
//! authorization engine is exhaustive, so adding a variant forces a
//! decision at every rule site instead of falling through to a default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    MasterAdmin,
    AgencyAdmin,
    LocationAdmin,
    Agent,
    Customer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::MasterAdmin,
        Role::AgencyAdmin,
        Role::LocationAdmin,
        Role::Agent,
        Role::Customer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::MasterAdmin => "MasterAdmin",
            Role::AgencyAdmin => "AgencyAdmin",
            Role::LocationAdmin => "LocationAdmin",
            Role::Agent => "Agent",
            Role::Customer => "Customer",
        }
    }

    /// AgencyAdmin and LocationAdmin share one capability set.
    pub fn is_agency_admin(self) -> bool {
        matches!(self, Role::AgencyAdmin | Role::LocationAdmin)
    }

    /// Whether identities of this role must belong to an agency.
    pub fn requires_agency(self) -> bool {
        !matches!(self, Role::MasterAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| BrokerError::validation(format!("unknown role: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_role_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("reset".parse::<Role>().is_err());
        assert!("agent".parse::<Role>().is_err());
    }

    #[test]
    fn only_master_admin_is_agency_free() {
        assert!(!Role::MasterAdmin.requires_agency());
        assert!(Role::Customer.requires_agency());
        assert!(Role::LocationAdmin.is_agency_admin());
        assert!(!Role::Agent.is_agency_admin());
    }
}
