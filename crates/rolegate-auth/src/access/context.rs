//! Access contexts.
//!
//! A context describes one access question raised by the host. Contexts start
//! out fully permitted; constraints narrow them.

use std::collections::HashMap;

use serde_json::Value;

use crate::access::menu::MenuItem;
use crate::model::{PredicateContext, RowLevelPolicy, RowLevelPolicyAction};

// =============================================================================
// Resource Contexts
// =============================================================================

/// Whether a view may be opened.
#[derive(Debug, Clone)]
pub struct ViewAccessContext {
    view_id: String,
    permitted: bool,
}

impl ViewAccessContext {
    #[must_use]
    pub fn new(view_id: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            permitted: true,
        }
    }

    #[must_use]
    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    #[must_use]
    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    pub fn deny(&mut self) {
        self.permitted = false;
    }
}

/// Whether a menu item is shown.
#[derive(Debug, Clone)]
pub struct MenuItemAccessContext {
    item: MenuItem,
    permitted: bool,
}

impl MenuItemAccessContext {
    #[must_use]
    pub fn new(item: MenuItem) -> Self {
        Self {
            item,
            permitted: true,
        }
    }

    #[must_use]
    pub fn item(&self) -> &MenuItem {
        &self.item
    }

    #[must_use]
    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    pub fn deny(&mut self) {
        self.permitted = false;
    }
}

/// CRUD permissions on an entity type.
#[derive(Debug, Clone)]
pub struct CrudEntityContext {
    entity_name: String,
    create_permitted: bool,
    read_permitted: bool,
    update_permitted: bool,
    delete_permitted: bool,
}

impl CrudEntityContext {
    #[must_use]
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            create_permitted: true,
            read_permitted: true,
            update_permitted: true,
            delete_permitted: true,
        }
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    #[must_use]
    pub fn is_create_permitted(&self) -> bool {
        self.create_permitted
    }

    #[must_use]
    pub fn is_read_permitted(&self) -> bool {
        self.read_permitted
    }

    #[must_use]
    pub fn is_update_permitted(&self) -> bool {
        self.update_permitted
    }

    #[must_use]
    pub fn is_delete_permitted(&self) -> bool {
        self.delete_permitted
    }

    pub fn deny_create(&mut self) {
        self.create_permitted = false;
    }

    pub fn deny_read(&mut self) {
        self.read_permitted = false;
    }

    pub fn deny_update(&mut self) {
        self.update_permitted = false;
    }

    pub fn deny_delete(&mut self) {
        self.delete_permitted = false;
    }
}

/// View and modify permissions on one entity attribute.
#[derive(Debug, Clone)]
pub struct EntityAttributeContext {
    entity_name: String,
    attribute: String,
    view_permitted: bool,
    modify_permitted: bool,
}

impl EntityAttributeContext {
    #[must_use]
    pub fn new(entity_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            attribute: attribute.into(),
            view_permitted: true,
            modify_permitted: true,
        }
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub fn is_view_permitted(&self) -> bool {
        self.view_permitted
    }

    #[must_use]
    pub fn is_modify_permitted(&self) -> bool {
        self.modify_permitted
    }

    pub fn deny_view(&mut self) {
        self.view_permitted = false;
    }

    pub fn deny_modify(&mut self) {
        self.modify_permitted = false;
    }
}

/// Whether a named custom operation may run.
#[derive(Debug, Clone)]
pub struct SpecificOperationAccessContext {
    resource: String,
    permitted: bool,
}

impl SpecificOperationAccessContext {
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            permitted: true,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    pub fn deny(&mut self) {
        self.permitted = false;
    }
}

/// Whether a GraphQL operation may run.
#[derive(Debug, Clone)]
pub struct GraphQlAccessContext {
    resource: String,
    permitted: bool,
}

impl GraphQlAccessContext {
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            permitted: true,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    pub fn deny(&mut self) {
        self.permitted = false;
    }
}

// =============================================================================
// Row Level Contexts
// =============================================================================

/// A JPQL fragment restricting a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCondition {
    pub where_clause: String,
    pub join_clause: Option<String>,
}

/// Conditions to add to a read query of an entity.
#[derive(Debug, Clone)]
pub struct ReadEntityQueryContext {
    entity_name: String,
    conditions: Vec<QueryCondition>,
}

impl ReadEntityQueryContext {
    #[must_use]
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn add_condition(&mut self, condition: QueryCondition) {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
    }

    #[must_use]
    pub fn conditions(&self) -> &[QueryCondition] {
        &self.conditions
    }

    /// All where clauses joined with `and`, or `None` when unrestricted.
    #[must_use]
    pub fn combined_where_clause(&self) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|c| format!("({})", c.where_clause))
            .collect();
        Some(clauses.join(" and "))
    }

    /// Join clauses in declaration order.
    pub fn join_clauses(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().filter_map(|c| c.join_clause.as_deref())
    }
}

/// In-memory row checks for a concrete entity instance.
///
/// Every predicate collected for an action must pass.
#[derive(Clone)]
pub struct InMemoryCrudEntityContext {
    entity_name: String,
    predicate_context: PredicateContext,
    policies: HashMap<RowLevelPolicyAction, Vec<RowLevelPolicy>>,
}

impl InMemoryCrudEntityContext {
    #[must_use]
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            predicate_context: PredicateContext::default(),
            policies: HashMap::new(),
        }
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn set_predicate_context(&mut self, context: PredicateContext) {
        self.predicate_context = context;
    }

    #[must_use]
    pub fn predicate_context(&self) -> &PredicateContext {
        &self.predicate_context
    }

    pub fn add_policy(&mut self, policy: RowLevelPolicy) {
        self.policies.entry(policy.action).or_default().push(policy);
    }

    /// Number of predicates collected for `action`.
    #[must_use]
    pub fn policy_count(&self, action: RowLevelPolicyAction) -> usize {
        self.policies.get(&action).map_or(0, Vec::len)
    }

    /// Tests `entity` against every predicate for `action`.
    #[must_use]
    pub fn is_permitted(&self, action: RowLevelPolicyAction, entity: &Value) -> bool {
        self.policies.get(&action).is_none_or(|policies| {
            policies
                .iter()
                .all(|policy| policy.test(entity, &self.predicate_context))
        })
    }
}

impl std::fmt::Debug for InMemoryCrudEntityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCrudEntityContext")
            .field("entity_name", &self.entity_name)
            .field("predicate_context", &self.predicate_context)
            .field("policies", &self.policies.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
