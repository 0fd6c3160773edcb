//! Role types.
//!
//! A role is a named bundle of policies. Besides its own policies a role may
//! list child roles; the repository folds the children's policies into the
//! role's effective ("all") policies when it is resolved.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::resource_policy::ResourcePolicy;
use crate::model::row_level_policy::RowLevelPolicy;

// =============================================================================
// Role Source
// =============================================================================

/// Origin of a role definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleSource {
    /// Declared in code through the policy declaration table.
    #[default]
    Annotated,
    /// Persisted by the host application.
    Database,
    /// Registered programmatically at runtime.
    Explicit,
}

// =============================================================================
// Base Role
// =============================================================================

/// Attributes shared by all role kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseRole {
    /// Unique role code.
    pub code: String,

    /// Display name.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub source: RoleSource,

    /// Codes of roles whose policies this role inherits, in declaration order.
    #[serde(default)]
    pub child_role_codes: IndexSet<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: BTreeMap<String, String>,
}

impl BaseRole {
    /// Creates a role with the given code; the name defaults to the code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            description: None,
            source: RoleSource::default(),
            child_role_codes: IndexSet::new(),
            custom_properties: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Role Trait
// =============================================================================

/// Common behaviour of resource and row-level roles.
///
/// The hierarchy merge engine only needs the base attributes, the role's own
/// policies and a way to publish the merged policy set.
pub trait Role: Clone + fmt::Debug + Send + Sync + 'static {
    /// Policy type held by the role.
    type Policy: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Base role attributes.
    fn base(&self) -> &BaseRole;

    /// Policies declared directly on this role.
    fn own_policies(&self) -> &[Self::Policy];

    /// Merged policies, present once the role has been resolved.
    fn all_policies(&self) -> Option<&IndexSet<Self::Policy>>;

    /// Replaces the merged policies.
    fn set_all_policies(&mut self, policies: IndexSet<Self::Policy>);

    /// Role code.
    fn code(&self) -> &str {
        &self.base().code
    }

    /// Codes of the declared child roles.
    fn child_role_codes(&self) -> &IndexSet<String> {
        &self.base().child_role_codes
    }

    /// Effective policies: merged policies if resolved, own policies otherwise.
    fn effective_policies(&self) -> Vec<Self::Policy> {
        match self.all_policies() {
            Some(all) => all.iter().cloned().collect(),
            None => self.own_policies().to_vec(),
        }
    }
}

// =============================================================================
// Resource Role
// =============================================================================

/// Role granting access to views, menus, entities and custom operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRole {
    #[serde(flatten)]
    pub base: BaseRole,

    /// Authentication scopes in which the role is in effect.
    ///
    /// An empty set means the role applies in every scope.
    #[serde(default)]
    pub scopes: IndexSet<String>,

    #[serde(default)]
    pub resource_policies: Vec<ResourcePolicy>,

    #[serde(skip)]
    pub all_resource_policies: Option<IndexSet<ResourcePolicy>>,
}

impl ResourceRole {
    /// Creates an empty resource role.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            base: BaseRole::new(code),
            scopes: IndexSet::new(),
            resource_policies: Vec::new(),
            all_resource_policies: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.base.name = name.into();
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: RoleSource) -> Self {
        self.base.source = source;
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.insert(scope.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, code: impl Into<String>) -> Self {
        self.base.child_role_codes.insert(code.into());
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ResourcePolicy) -> Self {
        self.resource_policies.push(policy);
        self
    }

    #[must_use]
    pub fn with_policies(mut self, policies: impl IntoIterator<Item = ResourcePolicy>) -> Self {
        self.resource_policies.extend(policies);
        self
    }

    /// Returns `true` if the role is in effect for the given scope.
    ///
    /// A missing scope matches every role, and a role without scopes matches
    /// every scope.
    #[must_use]
    pub fn applies_to_scope(&self, scope: Option<&str>) -> bool {
        match scope {
            None => true,
            Some(scope) => self.scopes.is_empty() || self.scopes.contains(scope),
        }
    }
}

impl Role for ResourceRole {
    type Policy = ResourcePolicy;

    fn base(&self) -> &BaseRole {
        &self.base
    }

    fn own_policies(&self) -> &[ResourcePolicy] {
        &self.resource_policies
    }

    fn all_policies(&self) -> Option<&IndexSet<ResourcePolicy>> {
        self.all_resource_policies.as_ref()
    }

    fn set_all_policies(&mut self, policies: IndexSet<ResourcePolicy>) {
        self.all_resource_policies = Some(policies);
    }
}

// =============================================================================
// Row Level Role
// =============================================================================

/// Role restricting which rows of entities are visible or modifiable.
#[derive(Debug, Clone)]
pub struct RowLevelRole {
    pub base: BaseRole,
    pub row_level_policies: Vec<RowLevelPolicy>,
    pub all_row_level_policies: Option<IndexSet<RowLevelPolicy>>,
}

impl RowLevelRole {
    /// Creates an empty row-level role.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            base: BaseRole::new(code),
            row_level_policies: Vec::new(),
            all_row_level_policies: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.base.name = name.into();
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: RoleSource) -> Self {
        self.base.source = source;
        self
    }

    #[must_use]
    pub fn with_child(mut self, code: impl Into<String>) -> Self {
        self.base.child_role_codes.insert(code.into());
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RowLevelPolicy) -> Self {
        self.row_level_policies.push(policy);
        self
    }

    #[must_use]
    pub fn with_policies(mut self, policies: impl IntoIterator<Item = RowLevelPolicy>) -> Self {
        self.row_level_policies.extend(policies);
        self
    }
}

impl Role for RowLevelRole {
    type Policy = RowLevelPolicy;

    fn base(&self) -> &BaseRole {
        &self.base
    }

    fn own_policies(&self) -> &[RowLevelPolicy] {
        &self.row_level_policies
    }

    fn all_policies(&self) -> Option<&IndexSet<RowLevelPolicy>> {
        self.all_row_level_policies.as_ref()
    }

    fn set_all_policies(&mut self, policies: IndexSet<RowLevelPolicy>) {
        self.all_row_level_policies = Some(policies);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_role_builder() {
        let role = ResourceRole::new("order-manager")
            .with_name("Order manager")
            .with_scope("UI")
            .with_child("order-viewer")
            .with_policy(ResourcePolicy::screen("orderList"));

        assert_eq!(role.code(), "order-manager");
        assert_eq!(role.base.name, "Order manager");
        assert!(role.child_role_codes().contains("order-viewer"));
        assert_eq!(role.own_policies().len(), 1);
        assert!(role.all_policies().is_none());
    }

    #[test]
    fn test_effective_policies_fall_back_to_own() {
        let mut role = ResourceRole::new("r").with_policy(ResourcePolicy::screen("a"));
        assert_eq!(role.effective_policies(), vec![ResourcePolicy::screen("a")]);

        let mut merged = IndexSet::new();
        merged.insert(ResourcePolicy::screen("a"));
        merged.insert(ResourcePolicy::screen("b"));
        role.set_all_policies(merged);
        assert_eq!(role.effective_policies().len(), 2);
    }

    #[test]
    fn test_scope_matching() {
        let unrestricted = ResourceRole::new("any");
        assert!(unrestricted.applies_to_scope(None));
        assert!(unrestricted.applies_to_scope(Some("user")));

        let admin = ResourceRole::new("admin").with_scope("admin");
        assert!(admin.applies_to_scope(None));
        assert!(admin.applies_to_scope(Some("admin")));
        assert!(!admin.applies_to_scope(Some("user")));
    }

    #[test]
    fn test_resource_role_deserialize() {
        let role: ResourceRole = serde_json::from_value(serde_json::json!({
            "code": "reader",
            "name": "Reader",
            "childRoleCodes": ["base"],
            "scopes": ["API"],
            "resourcePolicies": [{"type": "SCREEN", "resource": "main"}]
        }))
        .unwrap();

        assert_eq!(role.code(), "reader");
        assert_eq!(role.base.source, RoleSource::Annotated);
        assert!(role.child_role_codes().contains("base"));
        assert_eq!(role.resource_policies, vec![ResourcePolicy::screen("main")]);
    }
}
