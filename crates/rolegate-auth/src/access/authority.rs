//! Granted authorities carrying resolved role policies.
//!
//! A [`RoleGrantedAuthority`] is built from resolved roles when a user is
//! authenticated. Its policy indices are computed lazily on first query and
//! then shared by every reader.

use std::sync::OnceLock;

use indexmap::IndexSet;

use crate::model::{ResourcePolicy, ResourceRole, Role, RowLevelPolicy, RowLevelRole};
use crate::policy::index::{ResourcePolicyIndex, RowLevelPolicyIndex};

/// Authority name prefix for resource roles.
pub const RESOURCE_ROLE_PREFIX: &str = "ROLE_";

/// Authority name prefix for row-level roles.
pub const ROW_LEVEL_ROLE_PREFIX: &str = "ROW_LEVEL_ROLE_";

/// An authority derived from one or more resolved roles.
#[derive(Debug)]
pub struct RoleGrantedAuthority {
    authority: String,
    scopes: IndexSet<String>,
    resource_policies: Vec<ResourcePolicy>,
    row_level_policies: Vec<RowLevelPolicy>,
    resource_index: OnceLock<ResourcePolicyIndex>,
    row_level_index: OnceLock<RowLevelPolicyIndex>,
}

impl RoleGrantedAuthority {
    /// Creates an authority with no policies.
    #[must_use]
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            scopes: IndexSet::new(),
            resource_policies: Vec::new(),
            row_level_policies: Vec::new(),
            resource_index: OnceLock::new(),
            row_level_index: OnceLock::new(),
        }
    }

    /// Creates an authority from a resolved resource role.
    #[must_use]
    pub fn from_resource_role(role: &ResourceRole) -> Self {
        let mut authority = Self::new(format!("{RESOURCE_ROLE_PREFIX}{}", role.code()));
        authority.scopes = role.scopes.clone();
        authority.resource_policies = role.effective_policies();
        authority
    }

    /// Creates an authority from a resolved row-level role.
    #[must_use]
    pub fn from_row_level_role(role: &RowLevelRole) -> Self {
        let mut authority = Self::new(format!("{ROW_LEVEL_ROLE_PREFIX}{}", role.code()));
        authority.row_level_policies = role.effective_policies();
        authority
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.insert(scope.into());
        self
    }

    #[must_use]
    pub fn with_resource_policies(
        mut self,
        policies: impl IntoIterator<Item = ResourcePolicy>,
    ) -> Self {
        self.resource_policies.extend(policies);
        self
    }

    #[must_use]
    pub fn with_row_level_policies(
        mut self,
        policies: impl IntoIterator<Item = RowLevelPolicy>,
    ) -> Self {
        self.row_level_policies.extend(policies);
        self
    }

    /// Authority name, e.g. `ROLE_order-manager`.
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    #[must_use]
    pub fn scopes(&self) -> &IndexSet<String> {
        &self.scopes
    }

    #[must_use]
    pub fn resource_policies(&self) -> &[ResourcePolicy] {
        &self.resource_policies
    }

    #[must_use]
    pub fn row_level_policies(&self) -> &[RowLevelPolicy] {
        &self.row_level_policies
    }

    /// Returns `true` if the authority carries any policy data.
    #[must_use]
    pub fn has_policies(&self) -> bool {
        !self.resource_policies.is_empty() || !self.row_level_policies.is_empty()
    }

    /// Returns `true` if the authority is in effect for `scope`.
    ///
    /// Same rule as [`ResourceRole::applies_to_scope`].
    #[must_use]
    pub fn applies_to_scope(&self, scope: Option<&str>) -> bool {
        match scope {
            None => true,
            Some(scope) => self.scopes.is_empty() || self.scopes.contains(scope),
        }
    }

    /// Resource policy index, built on first use.
    pub fn resource_index(&self) -> &ResourcePolicyIndex {
        self.resource_index
            .get_or_init(|| ResourcePolicyIndex::build(&self.resource_policies))
    }

    /// Row-level policy index, built on first use.
    pub fn row_level_index(&self) -> &RowLevelPolicyIndex {
        self.row_level_index
            .get_or_init(|| RowLevelPolicyIndex::build(&self.row_level_policies))
    }
}
