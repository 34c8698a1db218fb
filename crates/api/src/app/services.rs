use std::sync::Arc;

use fieldops_auth::{
    AuthService, OrganizationResolver, PermissionChecker, RoleBasedChecker, SessionStore,
    TokenConfig, TokenService,
};
use fieldops_infra::{
    InMemoryOrganizationResolver, InMemorySessionStore, PgOrganizationResolver, PgSessionStore,
};

use crate::config::AppConfig;

pub type DynSessionStore = Arc<dyn SessionStore>;

/// Everything handlers and the gate need, shared behind `Arc`s.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService<DynSessionStore>>,
    pub resolver: Arc<dyn OrganizationResolver>,
    pub checker: Arc<dyn PermissionChecker>,
}

impl AppServices {
    /// Wire services over the given adapters with the role-based checker.
    pub fn new(
        store: DynSessionStore,
        resolver: Arc<dyn OrganizationResolver>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(store, tokens)),
            resolver,
            checker: Arc::new(RoleBasedChecker),
        }
    }

    /// Swap the permission checker (e.g. for a cached implementation).
    pub fn with_checker(mut self, checker: Arc<dyn PermissionChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn tokens(&self) -> &TokenService {
        self.auth.tokens()
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let tokens = Arc::new(TokenService::new(TokenConfig::new(config.jwt_secret.clone())?));

    match &config.database_url {
        Some(url) => {
            let pool = fieldops_infra::connect(url).await?;
            fieldops_infra::apply_schema(&pool).await?;
            tracing::info!("using postgres session store");
            Ok(AppServices::new(
                Arc::new(PgSessionStore::new(pool.clone())),
                Arc::new(PgOrganizationResolver::new(pool)),
                tokens,
            ))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory session store");
            let resolver = InMemoryOrganizationResolver::from_pairs(
                config.tenant_subdomains.iter().map(|(s, org)| (s.as_str(), *org)),
            );
            Ok(AppServices::new(
                Arc::new(InMemorySessionStore::new()),
                Arc::new(resolver),
                tokens,
            ))
        }
    }
}
