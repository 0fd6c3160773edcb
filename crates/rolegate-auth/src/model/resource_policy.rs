//! Resource policies.
//!
//! A resource policy is an immutable `(type, resource, action, effect)`
//! statement. Equality and hashing cover every field, including custom
//! properties, so that policy sets deduplicate identical declarations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource name matching every resource of a policy type.
pub const WILDCARD: &str = "*";

/// Custom property holding a random tag that keeps a policy distinct from
/// otherwise identical policies.
pub const UNIQUE_KEY_PROPERTY: &str = "uniqueKey";

/// Standard action names.
pub mod actions {
    /// Default action for views, menus, specific operations and GraphQL.
    pub const ACCESS: &str = "access";
    pub const CREATE: &str = "create";
    pub const READ: &str = "read";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const VIEW: &str = "view";
    pub const MODIFY: &str = "modify";
}

// =============================================================================
// Policy Type / Effect
// =============================================================================

/// Kind of resource a policy talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourcePolicyType {
    /// A view (screen) identified by its view id.
    Screen,
    /// A menu item identified by its menu id.
    Menu,
    /// A CRUD operation on an entity.
    Entity,
    /// Viewing or modifying an entity attribute.
    EntityAttribute,
    /// A custom, application-defined operation.
    Specific,
    /// A GraphQL query or mutation.
    Graphql,
}

impl ResourcePolicyType {
    /// Returns the canonical name of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Menu => "menu",
            Self::Entity => "entity",
            Self::EntityAttribute => "entity_attribute",
            Self::Specific => "specific",
            Self::Graphql => "graphql",
        }
    }
}

impl fmt::Display for ResourcePolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect of a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourcePolicyEffect {
    #[default]
    Allow,
    Deny,
}

// =============================================================================
// Declared Actions
// =============================================================================

/// Entity operation named in an entity policy declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityPolicyAction {
    Create,
    Read,
    Update,
    Delete,
    /// Shorthand for all four CRUD operations.
    All,
}

impl EntityPolicyAction {
    /// Expands the declared action into concrete action names.
    ///
    /// `All` expands to create, read, update and delete in that order.
    #[must_use]
    pub fn expand(&self) -> &'static [&'static str] {
        match self {
            Self::Create => &[actions::CREATE],
            Self::Read => &[actions::READ],
            Self::Update => &[actions::UPDATE],
            Self::Delete => &[actions::DELETE],
            Self::All => &[
                actions::CREATE,
                actions::READ,
                actions::UPDATE,
                actions::DELETE,
            ],
        }
    }
}

/// Attribute operation named in an entity attribute policy declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityAttributePolicyAction {
    View,
    Modify,
}

impl EntityAttributePolicyAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => actions::VIEW,
            Self::Modify => actions::MODIFY,
        }
    }
}

// =============================================================================
// Resource Policy
// =============================================================================

fn default_action() -> String {
    actions::ACCESS.to_string()
}

/// A single allow/deny statement about a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePolicy {
    /// Kind of resource.
    #[serde(rename = "type")]
    pub policy_type: ResourcePolicyType,

    /// Resource identifier. Entity attribute resources are `entity.attribute`.
    pub resource: String,

    /// Action on the resource.
    #[serde(default = "default_action")]
    pub action: String,

    /// Policy effect.
    #[serde(default)]
    pub effect: ResourcePolicyEffect,

    /// Free-form properties attached by extractors.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: BTreeMap<String, String>,
}

impl ResourcePolicy {
    /// Creates an ALLOW policy with the default `access` action.
    #[must_use]
    pub fn new(policy_type: ResourcePolicyType, resource: impl Into<String>) -> Self {
        Self {
            policy_type,
            resource: resource.into(),
            action: default_action(),
            effect: ResourcePolicyEffect::Allow,
            custom_properties: BTreeMap::new(),
        }
    }

    /// Creates a view access policy.
    #[must_use]
    pub fn screen(view_id: impl Into<String>) -> Self {
        Self::new(ResourcePolicyType::Screen, view_id)
    }

    /// Creates a menu access policy.
    #[must_use]
    pub fn menu(menu_id: impl Into<String>) -> Self {
        Self::new(ResourcePolicyType::Menu, menu_id)
    }

    /// Creates an entity operation policy.
    #[must_use]
    pub fn entity(entity_name: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(ResourcePolicyType::Entity, entity_name).with_action(action)
    }

    /// Creates an entity attribute policy for `entity.attribute`.
    #[must_use]
    pub fn entity_attribute(entity_name: &str, attribute: &str, action: impl Into<String>) -> Self {
        Self::new(
            ResourcePolicyType::EntityAttribute,
            format!("{entity_name}.{attribute}"),
        )
        .with_action(action)
    }

    /// Creates a specific operation policy.
    #[must_use]
    pub fn specific(resource: impl Into<String>) -> Self {
        Self::new(ResourcePolicyType::Specific, resource)
    }

    /// Creates a GraphQL endpoint policy.
    #[must_use]
    pub fn graphql(resource: impl Into<String>) -> Self {
        Self::new(ResourcePolicyType::Graphql, resource)
    }

    /// Sets the action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Sets the effect.
    #[must_use]
    pub fn with_effect(mut self, effect: ResourcePolicyEffect) -> Self {
        self.effect = effect;
        self
    }

    /// Adds a custom property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }

    /// Tags the policy with a fresh random key so it never equals another
    /// policy produced by a separate extraction.
    #[must_use]
    pub fn with_unique_key(self) -> Self {
        self.with_property(UNIQUE_KEY_PROPERTY, Uuid::new_v4().to_string())
    }

    /// Returns `true` if the policy grants access.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.effect == ResourcePolicyEffect::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = ResourcePolicy::screen("orderList");
        assert_eq!(policy.policy_type, ResourcePolicyType::Screen);
        assert_eq!(policy.action, actions::ACCESS);
        assert_eq!(policy.effect, ResourcePolicyEffect::Allow);
        assert!(policy.is_allowed());
    }

    #[test]
    fn test_entity_attribute_resource() {
        let policy = ResourcePolicy::entity_attribute("Order", "amount", actions::VIEW);
        assert_eq!(policy.resource, "Order.amount");
        assert_eq!(policy.action, "view");
    }

    #[test]
    fn test_equality_covers_all_fields() {
        let a = ResourcePolicy::entity("Order", actions::READ);
        let b = ResourcePolicy::entity("Order", actions::READ);
        assert_eq!(a, b);

        let denied = b.clone().with_effect(ResourcePolicyEffect::Deny);
        assert_ne!(a, denied);
    }

    #[test]
    fn test_unique_key_breaks_equality() {
        let a = ResourcePolicy::specific("report.print").with_unique_key();
        let b = ResourcePolicy::specific("report.print").with_unique_key();
        assert_ne!(a, b);
        assert!(a.custom_properties.contains_key(UNIQUE_KEY_PROPERTY));
    }

    #[test]
    fn test_all_expands_to_crud() {
        assert_eq!(
            EntityPolicyAction::All.expand(),
            &["create", "read", "update", "delete"]
        );
        assert_eq!(EntityPolicyAction::Read.expand(), &["read"]);
    }

    #[test]
    fn test_deserialize_defaults() {
        let policy: ResourcePolicy =
            serde_json::from_value(serde_json::json!({"type": "SCREEN", "resource": "main"}))
                .unwrap();
        assert_eq!(policy, ResourcePolicy::screen("main"));

        let policy: ResourcePolicy = serde_json::from_value(serde_json::json!({
            "type": "ENTITY_ATTRIBUTE",
            "resource": "Order.*",
            "action": "modify",
            "effect": "DENY"
        }))
        .unwrap();
        assert_eq!(policy.policy_type, ResourcePolicyType::EntityAttribute);
        assert!(!policy.is_allowed());
    }
}
