//! Role repository: hierarchy resolution over ordered providers.
//!
//! [`RoleRepository::find_role_by_code`] queries the providers in order, takes
//! the first match as the base role and folds in the policies of every
//! reachable child role. Traversal is depth-first over an explicit stack with
//! one `visited` set per resolution, seeded with the requested code:
//!
//! - a role is expanded at most once per resolution, so cyclic graphs
//!   terminate
//! - a child that was already visited contributes nothing further
//! - a child that no provider knows contributes nothing and is not retried
//!   within the same resolution
//!
//! Results are cached per code until [`RoleRepository::invalidate_cache`] is
//! called. Deleting a role does not invalidate the cache.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::AuthResult;
use crate::config::AuthorizationConfig;
use crate::error::AuthError;
use crate::model::{ResourceRole, Role, RowLevelRole};
use crate::policy::cache::{RoleCache, RoleCacheStats};
use crate::storage::DynRoleProvider;

/// Repository of resource roles.
pub type ResourceRoleRepository = RoleRepository<ResourceRole>;

/// Repository of row-level roles.
pub type RowLevelRoleRepository = RoleRepository<RowLevelRole>;

/// Resolves roles and their hierarchies across ordered providers.
pub struct RoleRepository<R: Role> {
    providers: Vec<DynRoleProvider<R>>,
    cache: RoleCache<R>,
}

impl<R: Role> RoleRepository<R> {
    /// Creates a repository querying `providers` in the given order.
    #[must_use]
    pub fn new(providers: Vec<DynRoleProvider<R>>) -> Self {
        Self::from_parts(providers, RoleCache::new())
    }

    /// Creates a repository ordered and cached according to `config`.
    ///
    /// Providers named in `providers.order` come first, in that order; the
    /// rest keep their registration order.
    #[must_use]
    pub fn with_config(providers: Vec<DynRoleProvider<R>>, config: &AuthorizationConfig) -> Self {
        let providers = order_providers(providers, &config.providers.order);
        let cache = if config.cache.enabled {
            RoleCache::new()
        } else {
            RoleCache::disabled()
        };
        Self::from_parts(providers, cache)
    }

    fn from_parts(providers: Vec<DynRoleProvider<R>>, cache: RoleCache<R>) -> Self {
        let repository = Self { providers, cache };
        tracing::info!(
            providers = ?repository.provider_names(),
            cache_enabled = repository.cache.is_enabled(),
            "Role repository initialized"
        );
        repository
    }

    /// Names of the providers in lookup order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Finds a role by code with all child role policies merged in.
    ///
    /// Returns `None` if no provider has the role. Missing roles are never
    /// cached, so a role that appears later is found on the next lookup.
    ///
    /// # Errors
    ///
    /// Any provider error aborts the lookup.
    pub async fn find_role_by_code(&self, code: &str) -> AuthResult<Option<Arc<R>>> {
        let generation = self.cache.generation();
        if let Some(role) = self.cache.lookup(&generation, code) {
            tracing::debug!(role = code, "Role cache hit");
            return Ok(Some(role));
        }

        tracing::debug!(role = code, generation = generation.id(), "Role cache miss");
        let Some(role) = self.resolve(code).await? else {
            tracing::debug!(role = code, "Role not found in any provider");
            return Ok(None);
        };

        let role = Arc::new(role);
        self.cache.store(&generation, code, Arc::clone(&role));
        Ok(Some(role))
    }

    /// Returns the first provider match for `code`, unmerged.
    async fn find_in_providers(&self, code: &str) -> AuthResult<Option<R>> {
        for provider in &self.providers {
            if let Some(role) = provider.find_role_by_code(code).await? {
                tracing::trace!(role = code, provider = provider.name(), "Role found");
                return Ok(Some(role));
            }
        }
        Ok(None)
    }

    async fn resolve(&self, code: &str) -> AuthResult<Option<R>> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(code.to_string());

        let Some(mut role) = self.find_in_providers(code).await? else {
            return Ok(None);
        };

        let mut policies: IndexSet<R::Policy> = role.own_policies().iter().cloned().collect();
        let mut pending: Vec<String> = role.child_role_codes().iter().rev().cloned().collect();

        while let Some(child_code) = pending.pop() {
            if !visited.insert(child_code.clone()) {
                continue;
            }
            match self.find_in_providers(&child_code).await? {
                Some(child) => {
                    policies.extend(child.own_policies().iter().cloned());
                    pending.extend(child.child_role_codes().iter().rev().cloned());
                }
                None => {
                    tracing::warn!(role = code, child = %child_code, "Child role not found");
                }
            }
        }

        tracing::debug!(
            role = code,
            roles_visited = visited.len(),
            policies = policies.len(),
            "Role hierarchy resolved"
        );
        role.set_all_policies(policies);
        Ok(Some(role))
    }

    /// Lists the roles of every provider, concatenated in provider order.
    ///
    /// Roles are returned as stored; hierarchies are not merged.
    ///
    /// # Errors
    ///
    /// Returns the first provider error.
    pub async fn get_all_roles(&self) -> AuthResult<Vec<R>> {
        let mut roles = Vec::new();
        for provider in &self.providers {
            roles.extend(provider.get_all_roles().await?);
        }
        Ok(roles)
    }

    /// Deletes a role from the first provider that has it.
    ///
    /// The cache is left untouched; call [`Self::invalidate_cache`] after
    /// structural changes.
    ///
    /// # Errors
    ///
    /// - `RoleNotFound` if no provider has the role
    /// - `UnsupportedOperation` if the owning provider is read-only
    /// - any provider error
    pub async fn delete_role(&self, code: &str) -> AuthResult<bool> {
        for provider in &self.providers {
            if let Some(role) = provider.find_role_by_code(code).await? {
                return provider.delete_role(&role).await;
            }
        }
        Err(AuthError::role_not_found(code))
    }

    /// Drops every cached role.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Get cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> RoleCacheStats {
        self.cache.stats()
    }
}

fn order_providers<R: Role>(
    mut providers: Vec<DynRoleProvider<R>>,
    order: &[String],
) -> Vec<DynRoleProvider<R>> {
    let mut ordered = Vec::with_capacity(providers.len());
    for name in order {
        match providers.iter().position(|p| p.name() == name) {
            Some(idx) => ordered.push(providers.remove(idx)),
            None => tracing::warn!(provider = %name, "Configured role provider is not registered"),
        }
    }
    ordered.extend(providers);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourcePolicy, RoleSource};
    use crate::storage::{InMemoryRoleProvider, RoleProvider};
    use async_trait::async_trait;

    // -------------------------------------------------------------------------
    // Failing Provider
    // -------------------------------------------------------------------------

    struct BrokenProvider;

    #[async_trait]
    impl RoleProvider<ResourceRole> for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn find_role_by_code(&self, _code: &str) -> AuthResult<Option<ResourceRole>> {
            Err(AuthError::provider("broken", "connection refused"))
        }

        async fn get_all_roles(&self) -> AuthResult<Vec<ResourceRole>> {
            Err(AuthError::provider("broken", "connection refused"))
        }

        async fn delete_role(&self, _role: &ResourceRole) -> AuthResult<bool> {
            Ok(false)
        }
    }

    // -------------------------------------------------------------------------
    // Helper Functions
    // -------------------------------------------------------------------------

    fn role(code: &str, screens: &[&str], children: &[&str]) -> ResourceRole {
        let mut role = ResourceRole::new(code);
        for screen in screens {
            role = role.with_policy(ResourcePolicy::screen(*screen));
        }
        for child in children {
            role = role.with_child(*child);
        }
        role
    }

    fn screens(role: &ResourceRole) -> Vec<String> {
        role.all_policies()
            .unwrap()
            .iter()
            .map(|p| p.resource.clone())
            .collect()
    }

    fn repository(roles: Vec<ResourceRole>) -> (Arc<InMemoryRoleProvider<ResourceRole>>, ResourceRoleRepository) {
        let provider = Arc::new(InMemoryRoleProvider::with_roles("database", roles));
        let repo = RoleRepository::new(vec![provider.clone() as DynRoleProvider<ResourceRole>]);
        (provider, repo)
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_leaf_role_all_equals_own() {
        let (_, repo) = repository(vec![role("a", &["s1", "s2"], &[])]);
        let resolved = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["s1", "s2"]);
        assert_eq!(resolved.own_policies().len(), 2);
    }

    #[tokio::test]
    async fn test_children_are_merged_depth_first() {
        let (_, repo) = repository(vec![
            role("root", &["r"], &["a", "b"]),
            role("a", &["a1"], &["c"]),
            role("b", &["b1"], &[]),
            role("c", &["c1"], &[]),
        ]);
        let resolved = repo.find_role_by_code("root").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["r", "a1", "c1", "b1"]);
    }

    #[tokio::test]
    async fn test_shared_child_contributes_once() {
        let (provider, repo) = repository(vec![
            role("root", &["r"], &["a", "b"]),
            role("a", &["a1"], &["shared"]),
            role("b", &["b1"], &["shared"]),
            role("shared", &["s"], &[]),
        ]);
        let resolved = repo.find_role_by_code("root").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["r", "a1", "s", "b1"]);
        // root, a, shared, b
        assert_eq!(provider.lookup_count(), 4);
    }

    #[tokio::test]
    async fn test_self_cycle_terminates() {
        let (_, repo) = repository(vec![role("self", &["x"], &["self"])]);
        let resolved = repo.find_role_by_code("self").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["x"]);
    }

    #[tokio::test]
    async fn test_transitive_cycle_terminates() {
        let (provider, repo) = repository(vec![
            role("a", &["a1"], &["b"]),
            role("b", &["b1"], &["c"]),
            role("c", &["c1"], &["a"]),
        ]);
        let resolved = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["a1", "b1", "c1"]);
        assert_eq!(provider.lookup_count(), 3);

        let resolved = repo.find_role_by_code("b").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["b1", "c1", "a1"]);
    }

    #[tokio::test]
    async fn test_missing_child_is_skipped() {
        let (_, repo) = repository(vec![role("a", &["a1"], &["ghost", "b"]), role("b", &["b1"], &[])]);
        let resolved = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["a1", "b1"]);
    }

    #[tokio::test]
    async fn test_missing_role_is_not_cached() {
        let (provider, repo) = repository(vec![]);
        assert!(repo.find_role_by_code("late").await.unwrap().is_none());
        assert!(repo.find_role_by_code("late").await.unwrap().is_none());
        assert_eq!(provider.lookup_count(), 2);

        provider.save_role(role("late", &["l"], &[])).await.unwrap();
        assert!(repo.find_role_by_code("late").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cache_hit_and_invalidation() {
        let (provider, repo) = repository(vec![role("a", &["a1"], &[])]);

        let first = repo.find_role_by_code("a").await.unwrap().unwrap();
        let second = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.lookup_count(), 1);

        provider.save_role(role("a", &["a2"], &[])).await.unwrap();
        let stale = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(screens(&stale), vec!["a1"]);

        repo.invalidate_cache();
        let fresh = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(screens(&fresh), vec!["a2"]);
        assert_eq!(provider.lookup_count(), 2);

        let stats = repo.cache_stats();
        assert_eq!(stats.generation, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let first = Arc::new(InMemoryRoleProvider::with_roles(
            "annotated",
            vec![role("a", &["from-first"], &[]).with_source(RoleSource::Annotated)],
        ));
        let second = Arc::new(InMemoryRoleProvider::with_roles(
            "database",
            vec![role("a", &["from-second"], &[]).with_source(RoleSource::Database)],
        ));
        let repo = RoleRepository::new(vec![
            first.clone() as DynRoleProvider<ResourceRole>,
            second.clone() as DynRoleProvider<ResourceRole>,
        ]);

        let resolved = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(resolved.base.source, RoleSource::Annotated);
        assert_eq!(screens(&resolved), vec!["from-first"]);
        assert_eq!(second.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_provider_order() {
        let annotated = Arc::new(InMemoryRoleProvider::with_roles(
            "annotated",
            vec![role("a", &["annotated"], &[])],
        ));
        let database = Arc::new(InMemoryRoleProvider::with_roles(
            "database",
            vec![role("a", &["database"], &[])],
        ));

        let mut config = AuthorizationConfig::default();
        config.providers.order = vec!["database".to_string(), "missing".to_string()];
        let repo = RoleRepository::with_config(
            vec![
                annotated as DynRoleProvider<ResourceRole>,
                database as DynRoleProvider<ResourceRole>,
            ],
            &config,
        );

        assert_eq!(repo.provider_names(), vec!["database", "annotated"]);
        let resolved = repo.find_role_by_code("a").await.unwrap().unwrap();
        assert_eq!(screens(&resolved), vec!["database"]);
    }

    #[tokio::test]
    async fn test_disabled_cache_requeries() {
        let provider = Arc::new(InMemoryRoleProvider::with_roles(
            "database",
            vec![role("a", &["a1"], &[])],
        ));
        let mut config = AuthorizationConfig::default();
        config.cache.enabled = false;
        let repo = RoleRepository::with_config(
            vec![provider.clone() as DynRoleProvider<ResourceRole>],
            &config,
        );

        repo.find_role_by_code("a").await.unwrap();
        repo.find_role_by_code("a").await.unwrap();
        assert_eq!(provider.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let repo = RoleRepository::new(vec![Arc::new(BrokenProvider) as DynRoleProvider<ResourceRole>]);
        let err = repo.find_role_by_code("a").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider { .. }));
        assert!(repo.get_all_roles().await.is_err());
    }

    #[tokio::test]
    async fn test_get_all_roles_is_unmerged() {
        let (_, repo) = repository(vec![role("a", &["a1"], &["b"]), role("b", &["b1"], &[])]);
        let roles = repo.get_all_roles().await.unwrap();
        assert_eq!(roles.len(), 2);
        assert!(roles.iter().all(|r| r.all_policies().is_none()));
    }

    #[tokio::test]
    async fn test_delete_role() {
        let (provider, repo) = repository(vec![role("a", &["a1"], &[])]);

        repo.find_role_by_code("a").await.unwrap();
        assert!(repo.delete_role("a").await.unwrap());
        assert!(provider.is_empty().await);

        // Still cached until invalidated.
        assert!(repo.find_role_by_code("a").await.unwrap().is_some());
        repo.invalidate_cache();
        assert!(repo.find_role_by_code("a").await.unwrap().is_none());

        let err = repo.delete_role("a").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
