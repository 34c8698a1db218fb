use std::collections::HashMap;
use std::sync::RwLock;

use fieldops_auth::{OrganizationResolver, StoreError};
use fieldops_core::OrganizationId;

/// Subdomain → organization map for tests and local dev.
///
/// Keys are stored lowercased; lookups are case-insensitive.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationResolver {
    subdomains: RwLock<HashMap<String, OrganizationId>>,
}

impl InMemoryOrganizationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, OrganizationId)>,
        S: AsRef<str>,
    {
        let subdomains = pairs
            .into_iter()
            .map(|(s, org)| (s.as_ref().trim().to_lowercase(), org))
            .collect();
        Self {
            subdomains: RwLock::new(subdomains),
        }
    }

    pub fn insert(&self, subdomain: &str, organization_id: OrganizationId) {
        if let Ok(mut map) = self.subdomains.write() {
            map.insert(subdomain.trim().to_lowercase(), organization_id);
        }
    }

    pub fn len(&self) -> usize {
        self.subdomains.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl OrganizationResolver for InMemoryOrganizationResolver {
    async fn resolve_subdomain(&self, subdomain: &str) -> Result<Option<OrganizationId>, StoreError> {
        let map = self
            .subdomains
            .read()
            .map_err(|_| StoreError::Unavailable("organization map lock poisoned".to_string()))?;
        Ok(map.get(&subdomain.to_lowercase()).copied())
    }
}
