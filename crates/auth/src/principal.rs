use serde::Serialize;

use fieldops_core::{OrganizationId, UserId};

use crate::Claims;

/// Identity of an authenticated caller, taken from a verified access token.
///
/// This is an authorization boundary object: it states *which organization*
/// the caller is acting within. It is only ever built from validated claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    /// Role name at token issue time.
    pub role: String,
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id,
            organization_id: claims.organization_id,
            email: claims.email.clone(),
            role: claims.role.clone(),
        }
    }
}
