//! Role provider trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::model::Role;

/// A source of raw (unmerged) roles.
///
/// # Example
///
/// ```ignore
/// use rolegate_auth::storage::RoleProvider;
///
/// async fn example(provider: &dyn RoleProvider<ResourceRole>) -> AuthResult<()> {
///     if let Some(role) = provider.find_role_by_code("order-manager").await? {
///         println!("Found role: {}", role.base.name);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RoleProvider<R: Role>: Send + Sync {
    /// Name of the provider, used for ordering and logging.
    fn name(&self) -> &str;

    /// Find a role by its code.
    ///
    /// Returns `None` if this provider does not know the role.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source fails.
    async fn find_role_by_code(&self, code: &str) -> AuthResult<Option<R>>;

    /// List all roles of this provider, unmerged.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source fails.
    async fn get_all_roles(&self) -> AuthResult<Vec<R>>;

    /// Delete a role.
    ///
    /// Returns `true` if the role was removed and `false` if the provider did
    /// not have it.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the source is read-only and
    /// `InvalidInput` for a role without a code.
    async fn delete_role(&self, role: &R) -> AuthResult<bool>;
}

/// Shared role provider handle.
pub type DynRoleProvider<R> = Arc<dyn RoleProvider<R>>;
