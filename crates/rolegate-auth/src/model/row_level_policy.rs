//! Row-level policies.
//!
//! A row-level policy restricts which rows of an entity a role may see or
//! modify. JPQL policies carry a query fragment that the persistence layer
//! appends to READ queries; predicate policies carry a function evaluated in
//! memory against an entity snapshot.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::resource_policy::UNIQUE_KEY_PROPERTY;

/// Normalized row predicate: entity snapshot plus evaluation context.
pub type RowLevelPredicate = Arc<dyn Fn(&Value, &PredicateContext) -> bool + Send + Sync>;

/// Operation a row-level policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowLevelPolicyAction {
    Create,
    Read,
    Update,
    Delete,
}

impl RowLevelPolicyAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// How a row-level policy is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowLevelPolicyType {
    /// Query fragment applied by the persistence layer.
    Jpql,
    /// Predicate evaluated in memory.
    Predicate,
}

/// Values available to row predicates besides the entity itself.
#[derive(Debug, Clone, Default)]
pub struct PredicateContext {
    /// Name of the current user, if authenticated.
    pub username: Option<String>,

    /// Session attributes of the current user.
    pub attributes: HashMap<String, Value>,
}

impl PredicateContext {
    /// Creates a context for the given user.
    #[must_use]
    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            attributes: HashMap::new(),
        }
    }

    /// Adds a session attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

// =============================================================================
// Row Level Policy
// =============================================================================

/// A filter restricting which rows of an entity a role may access.
///
/// Exactly one of `where_clause` and `predicate` is set, depending on
/// `policy_type`. Equality compares the predicate by identity.
#[derive(Clone)]
pub struct RowLevelPolicy {
    pub entity_name: String,
    pub action: RowLevelPolicyAction,
    pub policy_type: RowLevelPolicyType,
    pub where_clause: Option<String>,
    pub join_clause: Option<String>,
    pub predicate: Option<RowLevelPredicate>,
    pub custom_properties: BTreeMap<String, String>,
}

impl RowLevelPolicy {
    /// Creates a JPQL policy. JPQL policies always apply to READ.
    #[must_use]
    pub fn jpql(
        entity_name: impl Into<String>,
        where_clause: impl Into<String>,
        join_clause: Option<String>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            action: RowLevelPolicyAction::Read,
            policy_type: RowLevelPolicyType::Jpql,
            where_clause: Some(where_clause.into()),
            join_clause: join_clause.filter(|j| !j.trim().is_empty()),
            predicate: None,
            custom_properties: BTreeMap::new(),
        }
    }

    /// Creates an in-memory predicate policy.
    #[must_use]
    pub fn predicate(
        entity_name: impl Into<String>,
        action: RowLevelPolicyAction,
        predicate: RowLevelPredicate,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            action,
            policy_type: RowLevelPolicyType::Predicate,
            where_clause: None,
            join_clause: None,
            predicate: Some(predicate),
            custom_properties: BTreeMap::new(),
        }
    }

    /// Adds a custom property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }

    /// Tags the policy with a fresh random key.
    #[must_use]
    pub fn with_unique_key(self) -> Self {
        self.with_property(UNIQUE_KEY_PROPERTY, Uuid::new_v4().to_string())
    }

    /// Evaluates the predicate against an entity.
    ///
    /// JPQL policies are not evaluated in memory and always pass.
    #[must_use]
    pub fn test(&self, entity: &Value, context: &PredicateContext) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(entity, context),
            None => true,
        }
    }
}

impl PartialEq for RowLevelPolicy {
    fn eq(&self, other: &Self) -> bool {
        let same_predicate = match (&self.predicate, &other.predicate) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_predicate
            && self.entity_name == other.entity_name
            && self.action == other.action
            && self.policy_type == other.policy_type
            && self.where_clause == other.where_clause
            && self.join_clause == other.join_clause
            && self.custom_properties == other.custom_properties
    }
}

impl Eq for RowLevelPolicy {}

impl Hash for RowLevelPolicy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity_name.hash(state);
        self.action.hash(state);
        self.policy_type.hash(state);
        self.where_clause.hash(state);
        self.join_clause.hash(state);
        self.custom_properties.hash(state);
    }
}

impl fmt::Debug for RowLevelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowLevelPolicy")
            .field("entity_name", &self.entity_name)
            .field("action", &self.action)
            .field("policy_type", &self.policy_type)
            .field("where_clause", &self.where_clause)
            .field("join_clause", &self.join_clause)
            .field("predicate", &self.predicate.as_ref().map(|_| "<predicate>"))
            .field("custom_properties", &self.custom_properties)
            .finish()
    }
}
