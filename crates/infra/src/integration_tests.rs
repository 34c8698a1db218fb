//! Integration tests for the full session lifecycle.
//!
//! Tests: login → token issue → store write → refresh → logout → authorize
//!
//! Verifies:
//! - Refresh is bound to the single stored token
//! - Disabled accounts are rejected ahead of credential outcomes
//! - Concurrent logins resolve as last write wins
//! - Permission checks honor stored rules and their fallbacks

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use fieldops_auth::permissions::catalog;
    use fieldops_auth::{
        AuthError, AuthService, FixedClock, Principal, RequiredPermission, Role, RoleBasedChecker,
        RoleType, RuleSource, SessionStore, StoreError, TokenConfig, TokenError, TokenKind,
        TokenService, User, UserWithRole,
    };
    use fieldops_core::{OrganizationId, UserId};

    use crate::session_store::InMemorySessionStore;

    const PASSWORD: &str = "correct horse battery staple";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn tokens_at(at: DateTime<Utc>) -> Arc<TokenService> {
        Arc::new(TokenService::with_clock(
            TokenConfig::new("integration-secret").unwrap(),
            Arc::new(FixedClock(at)),
        ))
    }

    struct Fixture {
        store: Arc<InMemorySessionStore>,
        service: AuthService<Arc<InMemorySessionStore>>,
        org: OrganizationId,
        owner: User,
        tech: User,
    }

    fn setup() -> Fixture {
        let store = Arc::new(InMemorySessionStore::new());
        let org = OrganizationId::new();

        let owner_role = Role::of_type(org, "Owner", RoleType::Owner);
        let tech_role = Role::of_type(org, "Field Technician", RoleType::Technician);
        store.insert_role(owner_role.clone()).unwrap();
        store.insert_role(tech_role.clone()).unwrap();

        let owner = store.register_user(org, "owner@acme.test", PASSWORD, owner_role.id).unwrap();
        let tech = store.register_user(org, "tech@acme.test", PASSWORD, tech_role.id).unwrap();

        let service = AuthService::new(store.clone(), tokens_at(now()));
        Fixture { store, service, org, owner, tech }
    }

    fn principal_of(user: &User) -> Principal {
        Principal {
            user_id: user.id,
            organization_id: user.organization_id,
            email: user.email.clone(),
            role: String::new(),
        }
    }

    #[tokio::test]
    async fn login_issues_pair_and_persists_refresh_token() {
        let fx = setup();

        let resp = fx.service.login("Tech@Acme.test", PASSWORD).await.unwrap();

        assert_eq!(resp.token_type, "Bearer");
        assert_eq!(resp.expires_in, 900);
        assert_eq!(resp.user.id, fx.tech.id);
        assert_eq!(resp.user.role, "Field Technician");
        assert_eq!(resp.user.last_login_at, Some(now()));

        let stored = fx.store.user(fx.tech.id).unwrap().unwrap();
        assert_eq!(stored.refresh_token, resp.refresh_token);
        assert_eq!(stored.last_login_at, Some(now()));

        let access = fx.service.tokens().validate_access_token(&resp.access_token).unwrap();
        assert_eq!(access.user_id, fx.tech.id);
        assert_eq!(access.organization_id, fx.org);
        assert_eq!(access.role, "Field Technician");
        assert_eq!(access.exp - access.iat, 900);

        let refresh = fx.service.tokens().validate_refresh_token(&resp.refresh_token).unwrap();
        assert_eq!(refresh.token_type, TokenKind::Refresh);
        assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn refresh_returns_new_access_token_and_echoes_refresh_token() {
        let fx = setup();
        let login = fx.service.login("tech@acme.test", PASSWORD).await.unwrap();

        let refreshed = fx.service.refresh(&login.refresh_token).await.unwrap();

        assert_eq!(refreshed.refresh_token, login.refresh_token);
        assert_ne!(refreshed.access_token, login.access_token);
        assert_eq!(refreshed.expires_in, 900);
        let claims = fx.service.tokens().validate_access_token(&refreshed.access_token).unwrap();
        assert_eq!(claims.user_id, fx.tech.id);

        // Refresh only reads the stored token.
        let stored = fx.store.user(fx.tech.id).unwrap().unwrap();
        assert_eq!(stored.refresh_token, login.refresh_token);
    }

    #[tokio::test]
    async fn refresh_after_logout_is_rejected() {
        let fx = setup();
        let login = fx.service.login("tech@acme.test", PASSWORD).await.unwrap();

        fx.service.logout(&principal_of(&fx.tech)).await.unwrap();

        let err = fx.service.refresh(&login.refresh_token).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidRefreshToken);
        assert_eq!(err.code(), "INVALID_REFRESH_TOKEN");
        assert!(!fx.store.user(fx.tech.id).unwrap().unwrap().has_session());
    }

    #[tokio::test]
    async fn logout_without_session_still_succeeds() {
        let fx = setup();
        fx.service.logout(&principal_of(&fx.owner)).await.unwrap();
    }

    #[tokio::test]
    async fn disabled_account_wins_over_password_outcome() {
        let fx = setup();
        fx.store.set_user_active(fx.tech.id, false).unwrap();

        let wrong = fx.service.login("tech@acme.test", "wrong").await.unwrap_err();
        let right = fx.service.login("tech@acme.test", PASSWORD).await.unwrap_err();

        assert_eq!(wrong, AuthError::AccountDisabled);
        assert_eq!(right, AuthError::AccountDisabled);
        assert!(!fx.store.user(fx.tech.id).unwrap().unwrap().has_session());
    }

    #[tokio::test]
    async fn disabled_account_cannot_refresh_existing_session() {
        let fx = setup();
        let login = fx.service.login("tech@acme.test", PASSWORD).await.unwrap();
        fx.store.set_user_active(fx.tech.id, false).unwrap();

        let err = fx.service.refresh(&login.refresh_token).await.unwrap_err();
        assert_eq!(err.code(), "ACCOUNT_DISABLED");
    }

    #[tokio::test]
    async fn disabled_account_wins_over_blank_password() {
        let fx = setup();
        fx.store.set_user_active(fx.tech.id, false).unwrap();

        let err = fx.service.login("tech@acme.test", "").await.unwrap_err();
        assert_eq!(err, AuthError::AccountDisabled);

        let err = fx.service.login("ghost@acme.test", "").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn disabled_account_wins_over_organization_mismatch_on_refresh() {
        let fx = setup();
        let other_org = fx
            .service
            .tokens()
            .generate_refresh_token(fx.tech.id, OrganizationId::new(), &fx.tech.email, "x")
            .unwrap();
        fx.store.update_refresh_token(fx.tech.id, &other_org).await.unwrap();
        fx.store.set_user_active(fx.tech.id, false).unwrap();

        let err = fx.service.refresh(&other_org).await.unwrap_err();
        assert_eq!(err, AuthError::AccountDisabled);
    }

    #[tokio::test]
    async fn padded_refresh_token_is_not_the_stored_one() {
        let fx = setup();
        let login = fx.service.login("tech@acme.test", PASSWORD).await.unwrap();

        for padded in [format!(" {}", login.refresh_token), format!("{}\n", login.refresh_token)] {
            let err = fx.service.refresh(&padded).await.unwrap_err();
            assert!(
                matches!(err, AuthError::Token(_) | AuthError::InvalidRefreshToken),
                "{padded:?} -> {err:?}"
            );
        }

        let err = fx.service.refresh("   ").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        fx.service.refresh(&login.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let fx = setup();

        let unknown = fx.service.login("ghost@acme.test", PASSWORD).await.unwrap_err();
        let wrong = fx.service.login("tech@acme.test", "nope").await.unwrap_err();

        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.public_message(), wrong.public_message());
        assert_eq!(unknown.status_code(), 401);
    }

    #[tokio::test]
    async fn login_rejects_blank_input() {
        let fx = setup();
        let err = fx.service.login("tech@acme.test", "").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        let err = fx.service.login("not-an-email", PASSWORD).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn second_login_retires_first_refresh_token() {
        let fx = setup();
        let first = fx.service.login("tech@acme.test", PASSWORD).await.unwrap();
        let second = fx.service.login("tech@acme.test", PASSWORD).await.unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(
            fx.service.refresh(&first.refresh_token).await.unwrap_err(),
            AuthError::InvalidRefreshToken
        );
        fx.service.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_logins_leave_exactly_one_refreshable_session() {
        let fx = setup();

        let (a, b) = tokio::join!(
            fx.service.login("tech@acme.test", PASSWORD),
            fx.service.login("tech@acme.test", PASSWORD),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let stored = fx.store.user(fx.tech.id).unwrap().unwrap().refresh_token;
        assert!(stored == a.refresh_token || stored == b.refresh_token);

        let ok_a = fx.service.refresh(&a.refresh_token).await.is_ok();
        let ok_b = fx.service.refresh(&b.refresh_token).await.is_ok();
        assert!(ok_a ^ ok_b, "exactly one session stays refreshable");
    }

    #[tokio::test]
    async fn token_kinds_are_not_interchangeable() {
        let fx = setup();
        let login = fx.service.login("tech@acme.test", PASSWORD).await.unwrap();

        let err = fx.service.refresh(&login.access_token).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::Token(TokenError::WrongType {
                expected: TokenKind::Refresh,
                found: TokenKind::Access,
            })
        );
        assert_eq!(err.code(), "INVALID_TOKEN_TYPE");

        let err = fx
            .service
            .tokens()
            .validate_access_token(&login.refresh_token)
            .unwrap_err();
        assert!(matches!(err, TokenError::WrongType { expected: TokenKind::Access, .. }));
    }

    #[tokio::test]
    async fn expired_refresh_token_is_invalid_token() {
        let fx = setup();
        let stale = tokens_at(now() - Duration::days(8))
            .generate_refresh_token(fx.tech.id, fx.org, &fx.tech.email, "Field Technician")
            .unwrap();
        fx.store.update_refresh_token(fx.tech.id, &stale).await.unwrap();

        let err = fx.service.refresh(&stale).await.unwrap_err();
        assert_eq!(err, AuthError::Token(TokenError::Expired));
        assert_eq!(err.code(), "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn refresh_token_from_foreign_secret_is_invalid_token() {
        let fx = setup();
        let forged = TokenService::with_clock(
            TokenConfig::new("someone-else").unwrap(),
            Arc::new(FixedClock(now())),
        )
        .generate_refresh_token(fx.tech.id, fx.org, &fx.tech.email, "Owner")
        .unwrap();

        let err = fx.service.refresh(&forged).await.unwrap_err();
        assert_eq!(err, AuthError::Token(TokenError::SignatureInvalid));
    }

    #[tokio::test]
    async fn refresh_with_mismatched_organization_is_rejected() {
        let fx = setup();
        let other_org = fx
            .service
            .tokens()
            .generate_refresh_token(fx.tech.id, OrganizationId::new(), &fx.tech.email, "x")
            .unwrap();
        fx.store.update_refresh_token(fx.tech.id, &other_org).await.unwrap();

        let err = fx.service.refresh(&other_org).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidRefreshToken);
    }

    #[tokio::test]
    async fn refresh_for_deleted_user_is_rejected() {
        let fx = setup();
        let orphan = fx
            .service
            .tokens()
            .generate_refresh_token(UserId::new(), fx.org, "gone@acme.test", "x")
            .unwrap();

        let err = fx.service.refresh(&orphan).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidRefreshToken);
    }

    #[tokio::test]
    async fn user_without_role_row_is_a_configuration_error() {
        let fx = setup();
        let user = fx
            .store
            .register_user(fx.org, "orphan@acme.test", PASSWORD, fieldops_core::RoleId::new())
            .unwrap();

        let err = fx.service.login(&user.email, PASSWORD).await.unwrap_err();
        assert_eq!(err.code(), "ROLE_CONFIGURATION_ERROR");
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn authorize_follows_role_rules() {
        let fx = setup();
        let tech = principal_of(&fx.tech);
        let owner = principal_of(&fx.owner);

        fx.service
            .authorize(&tech, &RequiredPermission::one(catalog::ROUTES_READ), &RoleBasedChecker)
            .await
            .unwrap();

        let err = fx
            .service
            .authorize(&tech, &RequiredPermission::one(catalog::USERS_CREATE), &RoleBasedChecker)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PERMISSIONS");
        assert_eq!(err.status_code(), 403);

        fx.service
            .authorize(&owner, &RequiredPermission::one("anything.anything"), &RoleBasedChecker)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn authorize_falls_back_to_defaults_on_malformed_permissions() {
        let fx = setup();
        let mut role = Role::of_type(fx.org, "Broken", RoleType::Technician);
        role.permissions = Some("{not json".to_string());
        fx.store.insert_role(role.clone()).unwrap();
        let user = fx.store.register_user(fx.org, "broken@acme.test", PASSWORD, role.id).unwrap();
        let principal = principal_of(&user);

        fx.service
            .authorize(&principal, &RequiredPermission::one(catalog::ROUTES_READ), &RoleBasedChecker)
            .await
            .unwrap();

        let me = fx.service.me(&principal).await.unwrap();
        assert_eq!(me.permission_source, RuleSource::DefaultMalformed);
        assert!(me.permissions.contains(&"routes.read".to_string()));
    }

    #[tokio::test]
    async fn authorize_any_of_and_all_of() {
        let fx = setup();
        let tech = principal_of(&fx.tech);

        let any = RequiredPermission::any_of([catalog::USERS_CREATE, catalog::ROUTES_READ]);
        fx.service.authorize(&tech, &any, &RoleBasedChecker).await.unwrap();

        let all = RequiredPermission::all_of([catalog::USERS_CREATE, catalog::ROUTES_READ]);
        assert!(fx.service.authorize(&tech, &all, &RoleBasedChecker).await.is_err());
    }

    #[tokio::test]
    async fn authorize_rejects_principal_from_other_organization() {
        let fx = setup();
        let mut principal = principal_of(&fx.owner);
        principal.organization_id = OrganizationId::new();

        let err = fx
            .service
            .authorize(&principal, &RequiredPermission::one(catalog::ROLES_READ), &RoleBasedChecker)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::AuthenticationRequired);
    }

    #[tokio::test]
    async fn me_reports_stored_rules() {
        let fx = setup();
        let role = Role::with_permissions(fx.org, "Dispatcher", RoleType::Technician, &["routes.*"]);
        fx.store.insert_role(role.clone()).unwrap();
        let user = fx.store.register_user(fx.org, "dispatch@acme.test", PASSWORD, role.id).unwrap();

        let me = fx.service.me(&principal_of(&user)).await.unwrap();
        assert_eq!(me.permission_source, RuleSource::Stored);
        assert_eq!(me.permissions, vec!["routes.*".to_string()]);
        assert_eq!(me.user.role, "Dispatcher");
    }

    /// Delegates to the in-memory store but fails the chosen operations.
    struct FailingStore {
        inner: InMemorySessionStore,
        fail_clear: bool,
        fail_lookup: bool,
    }

    #[async_trait::async_trait]
    impl SessionStore for FailingStore {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithRole>, StoreError> {
            if self.fail_lookup {
                return Err(StoreError::Timeout);
            }
            self.inner.find_user_by_email(email).await
        }

        async fn find_user_with_role(&self, user_id: UserId) -> Result<Option<UserWithRole>, StoreError> {
            self.inner.find_user_with_role(user_id).await
        }

        async fn update_refresh_token(&self, user_id: UserId, token: &str) -> Result<(), StoreError> {
            self.inner.update_refresh_token(user_id, token).await
        }

        async fn clear_refresh_token(&self, user_id: UserId) -> Result<(), StoreError> {
            if self.fail_clear {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inner.clear_refresh_token(user_id).await
        }

        async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
            self.inner.update_last_login(user_id, at).await
        }
    }

    #[tokio::test]
    async fn logout_store_failure_is_logout_error() {
        let store = FailingStore {
            inner: InMemorySessionStore::new(),
            fail_clear: true,
            fail_lookup: false,
        };
        let service = AuthService::new(store, tokens_at(now()));
        let principal = Principal {
            user_id: UserId::new(),
            organization_id: OrganizationId::new(),
            email: "a@b.test".to_string(),
            role: "Owner".to_string(),
        };

        let err = service.logout(&principal).await.unwrap_err();
        assert_eq!(err.code(), "LOGOUT_ERROR");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "failed to log out");
    }

    #[tokio::test]
    async fn store_timeout_during_login_is_internal() {
        let store = FailingStore {
            inner: InMemorySessionStore::new(),
            fail_clear: false,
            fail_lookup: true,
        };
        let service = AuthService::new(store, tokens_at(now()));

        let err = service.login("a@b.test", PASSWORD).await.unwrap_err();
        assert_eq!(err, AuthError::Store(StoreError::Timeout));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
