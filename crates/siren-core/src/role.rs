// Role model and field-visibility policy
//
// Roles gate which dashboard a user lands on and which alert fields they
// see. The store itself has no row or field ACLs; projection happens at
// response-shaping time in the API. A client that bypasses the UI can read
// any record - a documented limitation of this design, not a security
// boundary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Viewer role, determines dashboard and visible alert fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Doctor,
    ItTeam,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Doctor => "doctor",
            Role::ItTeam => "it_team",
            Role::Admin => "admin",
        }
    }

    /// Only the IT team and admins see network fields (wifi_name)
    pub fn sees_network_fields(&self) -> bool {
        matches!(self, Role::ItTeam | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" | "user" => Ok(Role::Employee),
            "doctor" => Ok(Role::Doctor),
            "it_team" => Ok(Role::ItTeam),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_fields_gated_by_role() {
        assert!(!Role::Employee.sees_network_fields());
        assert!(!Role::Doctor.sees_network_fields());
        assert!(Role::ItTeam.sees_network_fields());
        assert!(Role::Admin.sees_network_fields());
    }

    #[test]
    fn legacy_user_role_parses_as_employee() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::Employee);
    }
}
