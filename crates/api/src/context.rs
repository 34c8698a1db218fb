use fieldops_auth::{Claims, Principal};
use fieldops_core::OrganizationId;

/// Authenticated caller, inserted by the gate once every check has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    principal: Principal,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            principal: Principal::from(claims),
        }
    }

    pub fn principal(&self) -> Principal {
        self.principal.clone()
    }
}

/// Where a request's organization came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantSource {
    Token,
    Subdomain,
    QueryParam,
}

/// Organization the request acts within. Immutable once inserted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrganizationContext {
    organization_id: OrganizationId,
    source: TenantSource,
}

impl OrganizationContext {
    pub fn new(organization_id: OrganizationId, source: TenantSource) -> Self {
        Self {
            organization_id,
            source,
        }
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn source(&self) -> TenantSource {
        self.source
    }
}
