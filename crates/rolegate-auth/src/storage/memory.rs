//! In-memory role provider.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::model::Role;
use crate::storage::provider::RoleProvider;

/// Mutable in-process role store.
///
/// Roles are kept in insertion order. Every `find_role_by_code` call is
/// counted, which lets callers observe whether a lookup reached the provider
/// or was served from a cache.
pub struct InMemoryRoleProvider<R: Role> {
    name: String,
    roles: RwLock<IndexMap<String, R>>,
    lookups: AtomicUsize,
}

impl<R: Role> InMemoryRoleProvider<R> {
    /// Creates an empty provider.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: RwLock::new(IndexMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Creates a provider pre-populated with `roles`.
    ///
    /// A later role replaces an earlier one with the same code.
    #[must_use]
    pub fn with_roles(name: impl Into<String>, roles: impl IntoIterator<Item = R>) -> Self {
        let roles = roles
            .into_iter()
            .map(|role| (role.code().to_string(), role))
            .collect();
        Self {
            name: name.into(),
            roles: RwLock::new(roles),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Inserts or replaces a role, returning the previous definition.
    ///
    /// The role repository is not notified; invalidate its cache afterwards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the role has no code.
    pub async fn save_role(&self, role: R) -> AuthResult<Option<R>> {
        if role.code().trim().is_empty() {
            return Err(AuthError::invalid_input("role code must not be empty"));
        }
        let mut roles = self.roles.write().await;
        Ok(roles.insert(role.code().to_string(), role))
    }

    /// Number of `find_role_by_code` calls served so far.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of stored roles.
    pub async fn len(&self) -> usize {
        self.roles.read().await.len()
    }

    /// Returns `true` if no roles are stored.
    pub async fn is_empty(&self) -> bool {
        self.roles.read().await.is_empty()
    }
}

#[async_trait]
impl<R: Role> RoleProvider<R> for InMemoryRoleProvider<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_role_by_code(&self, code: &str) -> AuthResult<Option<R>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.roles.read().await.get(code).cloned())
    }

    async fn get_all_roles(&self) -> AuthResult<Vec<R>> {
        Ok(self.roles.read().await.values().cloned().collect())
    }

    async fn delete_role(&self, role: &R) -> AuthResult<bool> {
        if role.code().trim().is_empty() {
            return Err(AuthError::invalid_input("role code must not be empty"));
        }
        let removed = self.roles.write().await.shift_remove(role.code()).is_some();
        if removed {
            tracing::info!(provider = %self.name, role = role.code(), "Role deleted");
        }
        Ok(removed)
    }
}
