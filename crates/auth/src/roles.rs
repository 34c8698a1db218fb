use serde::{Deserialize, Serialize};

use fieldops_core::{OrganizationId, RoleId};

/// Role type within an organization. Drives the default permission fallback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Owner,
    Technician,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Owner => "owner",
            RoleType::Technician => "technician",
        }
    }

    /// Hard-coded permission set used whenever a role's stored list is
    /// missing, malformed or empty.
    pub fn default_permissions(&self) -> &'static [&'static str] {
        match self {
            RoleType::Owner => &[
                "organizations.*",
                "users.*",
                "technicians.*",
                "routes.*",
                "roles.*",
            ],
            RoleType::Technician => &[
                "routes.read",
                "routes.update_status",
                "technicians.read_own",
                "technicians.update_own",
            ],
        }
    }
}

impl core::fmt::Display for RoleType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RoleType {
    type Err = fieldops_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(RoleType::Owner),
            "technician" => Ok(RoleType::Technician),
            other => Err(fieldops_core::DomainError::validation(format!(
                "unknown role type '{other}'"
            ))),
        }
    }
}

/// A role as persisted by the user store. Read-only to the auth core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub organization_id: OrganizationId,
    /// Display name, embedded in token claims.
    pub name: String,
    pub role_type: RoleType,
    /// Serialized JSON array of permission strings, exactly as stored.
    /// `None` when the column is NULL.
    pub permissions: Option<String>,
    pub active: bool,
}

impl Role {
    /// Build a role whose stored permission list is the given strings.
    pub fn with_permissions(
        organization_id: OrganizationId,
        name: impl Into<String>,
        role_type: RoleType,
        permissions: &[&str],
    ) -> Self {
        Self {
            id: RoleId::new(),
            organization_id,
            name: name.into(),
            role_type,
            permissions: serde_json::to_string(permissions).ok(),
            active: true,
        }
    }

    /// Build a role with no stored permission list (defaults apply).
    pub fn of_type(organization_id: OrganizationId, name: impl Into<String>, role_type: RoleType) -> Self {
        Self {
            id: RoleId::new(),
            organization_id,
            name: name.into(),
            role_type,
            permissions: None,
            active: true,
        }
    }
}
