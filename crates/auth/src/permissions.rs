use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier of the shape `<resource>.<action>` (e.g. "routes.read").
///
/// Stored permission lists may also hold `<resource>.*` and the global `*`;
/// see [`PermissionRule`] for how those match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

/// A stored permission, parsed once when the role is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PermissionRule {
    /// Matches exactly this permission string.
    Exact(String),
    /// `<prefix>.*`: matches any permission starting with `<prefix>.`.
    PrefixWildcard(String),
    /// `*`: matches everything.
    Global,
}

impl PermissionRule {
    pub fn parse(raw: &str) -> Self {
        if raw == "*" {
            return PermissionRule::Global;
        }
        match raw.strip_suffix(".*") {
            Some(prefix) => PermissionRule::PrefixWildcard(prefix.to_string()),
            None => PermissionRule::Exact(raw.to_string()),
        }
    }

    pub fn matches(&self, requested: &str) -> bool {
        match self {
            PermissionRule::Exact(p) => p == requested,
            PermissionRule::PrefixWildcard(prefix) => requested
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
            PermissionRule::Global => true,
        }
    }
}

impl core::fmt::Display for PermissionRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PermissionRule::Exact(p) => f.write_str(p),
            PermissionRule::PrefixWildcard(prefix) => write!(f, "{prefix}.*"),
            PermissionRule::Global => f.write_str("*"),
        }
    }
}

/// Well-known permissions checked by the HTTP layer.
pub mod catalog {
    use super::Permission;

    pub const ROLES_READ: Permission = Permission::from_static("roles.read");
    pub const ROUTES_READ: Permission = Permission::from_static("routes.read");
    pub const ROUTES_UPDATE_STATUS: Permission = Permission::from_static("routes.update_status");
    pub const TECHNICIANS_READ_OWN: Permission = Permission::from_static("technicians.read_own");
    pub const TECHNICIANS_UPDATE_OWN: Permission = Permission::from_static("technicians.update_own");
    pub const USERS_CREATE: Permission = Permission::from_static("users.create");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_variants() {
        assert_eq!(PermissionRule::parse("*"), PermissionRule::Global);
        assert_eq!(
            PermissionRule::parse("routes.*"),
            PermissionRule::PrefixWildcard("routes".to_string())
        );
        assert_eq!(
            PermissionRule::parse("routes.read"),
            PermissionRule::Exact("routes.read".to_string())
        );
    }

    #[test]
    fn exact_match_only() {
        let rule = PermissionRule::parse("routes.read");
        assert!(rule.matches("routes.read"));
        assert!(!rule.matches("routes.reader"));
        assert!(!rule.matches("routes"));
    }

    #[test]
    fn prefix_wildcard_requires_dot_boundary() {
        let rule = PermissionRule::parse("routes.*");
        assert!(rule.matches("routes.read"));
        assert!(rule.matches("routes.update_status"));
        assert!(!rule.matches("routes"));
        assert!(!rule.matches("routesx.read"));
        assert!(!rule.matches("technicians.read"));
    }

    #[test]
    fn global_matches_anything() {
        assert!(PermissionRule::Global.matches("anything.anything"));
        assert!(PermissionRule::Global.matches(""));
    }

    #[test]
    fn display_round_trips_source() {
        for raw in ["*", "routes.*", "routes.read"] {
            assert_eq!(PermissionRule::parse(raw).to_string(), raw);
        }
    }
}
