//! Services wired over one storage backend.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{GroupMenuError, GroupMenuResult};
use crate::models::Account;
use crate::overrides::{ConfigFactory, GroupMenuConfigOverrides};
use crate::permissions::{GroupPermissionChecker, RolePermissionChecker};
use crate::plugin::{GroupMenuAccess, PluginRegistry};
use crate::storage::{ConfigStore, GroupStorage, MenuStorage, PgStore, SnapshotStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Arc<dyn ConfigStore>,
    groups: Arc<dyn GroupStorage>,
    menus: Arc<dyn MenuStorage>,

    /// Set for snapshot backends, which carry their own accounts.
    snapshot: Option<Arc<SnapshotStore>>,

    checker: Arc<dyn GroupPermissionChecker>,
    registry: PluginRegistry,
    access: GroupMenuAccess,
    overrides: Arc<GroupMenuConfigOverrides>,
    config_factory: ConfigFactory,
}

impl AppState {
    /// Wire services over a loaded snapshot.
    pub fn from_snapshot(store: SnapshotStore) -> GroupMenuResult<Self> {
        let store = Arc::new(store);
        Self::build(store.clone(), store.clone(), store.clone(), Some(store))
    }

    /// Wire services over a database pool.
    pub fn from_pool(pool: PgPool) -> GroupMenuResult<Self> {
        let store = Arc::new(PgStore::new(pool));
        Self::build(store.clone(), store.clone(), store, None)
    }

    fn build(
        config: Arc<dyn ConfigStore>,
        groups: Arc<dyn GroupStorage>,
        menus: Arc<dyn MenuStorage>,
        snapshot: Option<Arc<SnapshotStore>>,
    ) -> GroupMenuResult<Self> {
        let registry = PluginRegistry::with_defaults()?;
        let checker: Arc<dyn GroupPermissionChecker> =
            Arc::new(RolePermissionChecker::new(groups.clone()));

        let access = GroupMenuAccess::new(
            groups.clone(),
            checker.clone(),
            registry.permission_table(),
        )?;
        let overrides = Arc::new(GroupMenuConfigOverrides::new(
            config.clone(),
            groups.clone(),
            menus.clone(),
            checker.clone(),
            registry.permission_table(),
        )?);
        let config_factory = ConfigFactory::new(config.clone()).with_override(overrides.clone());

        info!(plugins = registry.plugins().count(), "services initialized");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                groups,
                menus,
                snapshot,
                checker,
                registry,
                access,
                overrides,
                config_factory,
            }),
        })
    }

    pub fn config_store(&self) -> &Arc<dyn ConfigStore> {
        &self.inner.config
    }

    pub fn groups(&self) -> &Arc<dyn GroupStorage> {
        &self.inner.groups
    }

    pub fn menus(&self) -> &Arc<dyn MenuStorage> {
        &self.inner.menus
    }

    pub fn snapshot(&self) -> Option<&Arc<SnapshotStore>> {
        self.inner.snapshot.as_ref()
    }

    pub fn checker(&self) -> &Arc<dyn GroupPermissionChecker> {
        &self.inner.checker
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.inner.registry
    }

    pub fn access(&self) -> &GroupMenuAccess {
        &self.inner.access
    }

    pub fn overrides(&self) -> &Arc<GroupMenuConfigOverrides> {
        &self.inner.overrides
    }

    pub fn config_factory(&self) -> &ConfigFactory {
        &self.inner.config_factory
    }

    /// Resolve the acting account.
    ///
    /// `None` is the anonymous account. Snapshot backends look the key up by
    /// UUID or name; otherwise the key must be a UUID and the account carries
    /// only the site permissions given here.
    pub fn account(
        &self,
        user: Option<&str>,
        permissions: &[String],
        admin: bool,
    ) -> GroupMenuResult<Account> {
        let Some(user) = user else {
            return Ok(Account::anonymous());
        };

        let found = self
            .inner
            .snapshot
            .as_ref()
            .and_then(|s| s.find_account(user).cloned());

        let mut account = match found {
            Some(account) => account,
            None => {
                let id: Uuid = user
                    .parse()
                    .map_err(|_| GroupMenuError::AccountNotFound(user.to_string()))?;
                Account::authenticated(id, user, Vec::new())
            }
        };

        for permission in permissions {
            if !account.permissions.contains(permission) {
                account.permissions.push(permission.clone());
            }
        }
        account.is_admin |= admin;

        Ok(account)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("snapshot", &self.inner.snapshot.is_some())
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}
