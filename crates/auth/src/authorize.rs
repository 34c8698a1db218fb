//! Authorization engine: permission matching over a role's rule set.
//!
//! - No IO
//! - No panics
//! - Rules are parsed once per role load, then matched many times

use serde::Serialize;

use fieldops_core::{OrganizationId, UserId};

use crate::permissions::{Permission, PermissionRule};
use crate::roles::{Role, RoleType};

/// Where a role's effective rules came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// The role's stored permission list.
    Stored,
    /// Stored list was NULL.
    DefaultMissing,
    /// Stored list did not parse as a JSON string array.
    DefaultMalformed,
    /// Stored list parsed but was empty.
    DefaultEmpty,
}

impl RuleSource {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, RuleSource::Stored)
    }
}

/// The parsed, ready-to-match permission rules of a single role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePermissions {
    role_type: RoleType,
    rules: Vec<PermissionRule>,
    source: RuleSource,
}

impl RolePermissions {
    /// Parse a role's stored permission list, substituting the role type's
    /// defaults when the list is missing, malformed or empty.
    pub fn from_role(role: &Role) -> Self {
        let parsed: Result<Vec<String>, RuleSource> = match role.permissions.as_deref() {
            None => Err(RuleSource::DefaultMissing),
            Some(raw) => match serde_json::from_str::<Vec<String>>(raw) {
                Ok(list) if list.is_empty() => Err(RuleSource::DefaultEmpty),
                Ok(list) => Ok(list),
                Err(_) => Err(RuleSource::DefaultMalformed),
            },
        };

        match parsed {
            Ok(list) => Self {
                role_type: role.role_type,
                rules: list.iter().map(|p| PermissionRule::parse(p)).collect(),
                source: RuleSource::Stored,
            },
            Err(RuleSource::DefaultMalformed) => {
                tracing::warn!(
                    role_id = %role.id,
                    organization_id = %role.organization_id,
                    role_type = %role.role_type,
                    "stored permission list is malformed; using role-type defaults"
                );
                Self::defaults_for(role.role_type, RuleSource::DefaultMalformed)
            }
            Err(source) => Self::defaults_for(role.role_type, source),
        }
    }

    fn defaults_for(role_type: RoleType, source: RuleSource) -> Self {
        Self {
            role_type,
            rules: role_type
                .default_permissions()
                .iter()
                .map(|p| PermissionRule::parse(p))
                .collect(),
            source,
        }
    }

    pub fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }

    pub fn source(&self) -> RuleSource {
        self.source
    }

    pub fn role_type(&self) -> RoleType {
        self.role_type
    }

    /// True when any rule grants `requested`.
    pub fn allows(&self, requested: &str) -> bool {
        self.matching_rule(requested).is_some()
    }

    /// The first rule that grants `requested`, if any.
    pub fn matching_rule(&self, requested: &str) -> Option<&PermissionRule> {
        self.rules.iter().find(|rule| rule.matches(requested))
    }
}

/// Permission requirement attached to an endpoint.
///
/// Each individual permission is matched the same way; the variants only
/// differ in how results are combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredPermission {
    One(Permission),
    AnyOf(Vec<Permission>),
    AllOf(Vec<Permission>),
}

impl RequiredPermission {
    pub fn one(permission: impl Into<Permission>) -> Self {
        RequiredPermission::One(permission.into())
    }

    pub fn any_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        RequiredPermission::AnyOf(permissions.into_iter().map(Into::into).collect())
    }

    pub fn all_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        RequiredPermission::AllOf(permissions.into_iter().map(Into::into).collect())
    }

    /// Evaluate with `check` as the per-permission predicate.
    ///
    /// An empty `AnyOf` grants nothing; an empty `AllOf` is vacuously satisfied.
    pub fn evaluate(&self, mut check: impl FnMut(&Permission) -> bool) -> bool {
        match self {
            RequiredPermission::One(p) => check(p),
            RequiredPermission::AnyOf(ps) => ps.iter().any(|p| check(p)),
            RequiredPermission::AllOf(ps) => ps.iter().all(|p| check(p)),
        }
    }

    pub fn permissions(&self) -> &[Permission] {
        match self {
            RequiredPermission::One(p) => core::slice::from_ref(p),
            RequiredPermission::AnyOf(ps) | RequiredPermission::AllOf(ps) => ps,
        }
    }
}

impl core::fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let join = |ps: &[Permission]| {
            ps.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
        };
        match self {
            RequiredPermission::One(p) => write!(f, "{p}"),
            RequiredPermission::AnyOf(ps) => write!(f, "any of [{}]", join(ps)),
            RequiredPermission::AllOf(ps) => write!(f, "all of [{}]", join(ps)),
        }
    }
}

/// Capability interface for permission decisions.
///
/// The authentication gate depends only on this trait, so a cached or
/// database-backed checker can replace [`RoleBasedChecker`].
pub trait PermissionChecker: Send + Sync {
    fn has_permission(
        &self,
        role: &Role,
        user_id: UserId,
        organization_id: OrganizationId,
        permission: &Permission,
    ) -> bool;

    fn satisfies(
        &self,
        role: &Role,
        user_id: UserId,
        organization_id: OrganizationId,
        required: &RequiredPermission,
    ) -> bool {
        required.evaluate(|p| self.has_permission(role, user_id, organization_id, p))
    }
}

impl<C> PermissionChecker for std::sync::Arc<C>
where
    C: PermissionChecker + ?Sized,
{
    fn has_permission(
        &self,
        role: &Role,
        user_id: UserId,
        organization_id: OrganizationId,
        permission: &Permission,
    ) -> bool {
        (**self).has_permission(role, user_id, organization_id, permission)
    }

    fn satisfies(
        &self,
        role: &Role,
        user_id: UserId,
        organization_id: OrganizationId,
        required: &RequiredPermission,
    ) -> bool {
        (**self).satisfies(role, user_id, organization_id, required)
    }
}

/// Default checker: matches against the role's parsed rules.
///
/// - A role from another organization never grants anything.
/// - Owners are granted every permission within their own organization.
/// - Inactive roles grant nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleBasedChecker;

impl PermissionChecker for RoleBasedChecker {
    fn has_permission(
        &self,
        role: &Role,
        user_id: UserId,
        organization_id: OrganizationId,
        permission: &Permission,
    ) -> bool {
        if role.organization_id != organization_id || !role.active {
            tracing::debug!(
                %user_id,
                %organization_id,
                role_organization_id = %role.organization_id,
                role_active = role.active,
                "role cannot grant permissions in this organization"
            );
            return false;
        }
        if role.role_type == RoleType::Owner {
            return true;
        }
        RolePermissions::from_role(role).allows(permission.as_str())
    }

    fn satisfies(
        &self,
        role: &Role,
        user_id: UserId,
        organization_id: OrganizationId,
        required: &RequiredPermission,
    ) -> bool {
        if role.organization_id != organization_id || !role.active {
            return false;
        }
        if role.role_type == RoleType::Owner {
            return true;
        }
        // Parse once for the whole requirement.
        let rules = RolePermissions::from_role(role);
        required.evaluate(|p| rules.allows(p.as_str()))
    }
}

/// Explanation of a single permission decision (debug/diagnostic use).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionExplanation {
    pub requested: String,
    pub granted: bool,
    pub matched_rule: Option<String>,
    /// Granted by the owner override rather than a rule.
    pub owner_override: bool,
    pub source: RuleSource,
    pub effective_rules: Vec<String>,
}

/// Explain how [`RoleBasedChecker`] decides `requested` for a role in its own
/// organization.
pub fn explain_permission(role: &Role, requested: &str) -> PermissionExplanation {
    let perms = RolePermissions::from_role(role);
    let matched = perms.matching_rule(requested).map(|r| r.to_string());
    let owner_override = role.active && role.role_type == RoleType::Owner && matched.is_none();
    PermissionExplanation {
        requested: requested.to_string(),
        granted: role.active && (matched.is_some() || owner_override),
        matched_rule: matched,
        owner_override,
        source: perms.source(),
        effective_rules: perms.rules().iter().map(|r| r.to_string()).collect(),
    }
}
