//! Loading a principal's authorities from role assignments.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::AuthResult;
use crate::access::authentication::{Authentication, ClientDetails, GrantedAuthority};
use crate::access::authority::RoleGrantedAuthority;
use crate::policy::{ResourceRoleRepository, RowLevelRoleRepository};

// =============================================================================
// Role Assignments
// =============================================================================

/// Kind of role referenced by an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleAssignmentType {
    Resource,
    RowLevel,
}

/// A role granted to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub username: String,
    pub role_code: String,
    pub role_type: RoleAssignmentType,
}

impl RoleAssignment {
    #[must_use]
    pub fn resource(username: impl Into<String>, role_code: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role_code: role_code.into(),
            role_type: RoleAssignmentType::Resource,
        }
    }

    #[must_use]
    pub fn row_level(username: impl Into<String>, role_code: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role_code: role_code.into(),
            role_type: RoleAssignmentType::RowLevel,
        }
    }
}

/// Source of role assignments.
#[async_trait]
pub trait RoleAssignmentProvider: Send + Sync {
    /// Assignments of `username`, in grant order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    async fn assignments_for_user(&self, username: &str) -> AuthResult<Vec<RoleAssignment>>;
}

/// In-process assignment store.
#[derive(Debug, Default)]
pub struct InMemoryRoleAssignmentProvider {
    assignments: RwLock<Vec<RoleAssignment>>,
}

impl InMemoryRoleAssignmentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_assignments(assignments: impl IntoIterator<Item = RoleAssignment>) -> Self {
        Self {
            assignments: RwLock::new(assignments.into_iter().collect()),
        }
    }

    /// Adds an assignment. Returns `false` if it already existed.
    pub async fn assign(&self, assignment: RoleAssignment) -> bool {
        let mut assignments = self.assignments.write().await;
        if assignments.contains(&assignment) {
            return false;
        }
        assignments.push(assignment);
        true
    }

    /// Removes an assignment. Returns `false` if it did not exist.
    pub async fn revoke(&self, assignment: &RoleAssignment) -> bool {
        let mut assignments = self.assignments.write().await;
        let before = assignments.len();
        assignments.retain(|a| a != assignment);
        assignments.len() != before
    }
}

#[async_trait]
impl RoleAssignmentProvider for InMemoryRoleAssignmentProvider {
    async fn assignments_for_user(&self, username: &str) -> AuthResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().await;
        Ok(assignments
            .iter()
            .filter(|a| a.username == username)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Authority Loader
// =============================================================================

/// Builds granted authorities from assignments and resolved roles.
pub struct AuthorityLoader {
    resource_roles: Arc<ResourceRoleRepository>,
    row_level_roles: Arc<RowLevelRoleRepository>,
    assignments: Arc<dyn RoleAssignmentProvider>,
}

impl AuthorityLoader {
    #[must_use]
    pub fn new(
        resource_roles: Arc<ResourceRoleRepository>,
        row_level_roles: Arc<RowLevelRoleRepository>,
        assignments: Arc<dyn RoleAssignmentProvider>,
    ) -> Self {
        Self {
            resource_roles,
            row_level_roles,
            assignments,
        }
    }

    /// Resolves every role assigned to `username` into an authority.
    ///
    /// Assignments whose role no provider knows are skipped. Repeated
    /// assignments yield one authority.
    ///
    /// # Errors
    ///
    /// Returns an error if the assignment provider or a role provider fails.
    pub async fn load_authorities(&self, username: &str) -> AuthResult<Vec<GrantedAuthority>> {
        let assignments = self.assignments.assignments_for_user(username).await?;
        let mut seen = HashSet::new();
        let mut authorities = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            if !seen.insert((assignment.role_type, assignment.role_code.clone())) {
                continue;
            }

            let authority = match assignment.role_type {
                RoleAssignmentType::Resource => self
                    .resource_roles
                    .find_role_by_code(&assignment.role_code)
                    .await?
                    .map(|role| RoleGrantedAuthority::from_resource_role(&role)),
                RoleAssignmentType::RowLevel => self
                    .row_level_roles
                    .find_role_by_code(&assignment.role_code)
                    .await?
                    .map(|role| RoleGrantedAuthority::from_row_level_role(&role)),
            };

            match authority {
                Some(authority) => authorities.push(GrantedAuthority::from(authority)),
                None => warn!(
                    username = username,
                    role_code = %assignment.role_code,
                    role_type = ?assignment.role_type,
                    "Assigned role not found, skipping"
                ),
            }
        }

        debug!(
            username = username,
            authorities = authorities.len(),
            "Loaded authorities"
        );
        Ok(authorities)
    }

    /// Builds an [`Authentication`] for `username`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_authorities`].
    pub async fn authenticate(
        &self,
        username: &str,
        details: Option<ClientDetails>,
    ) -> AuthResult<Authentication> {
        let authorities = self.load_authorities(username).await?;
        let mut authentication = Authentication::new(username).with_authorities(authorities);
        authentication.details = details;
        Ok(authentication)
    }
}
