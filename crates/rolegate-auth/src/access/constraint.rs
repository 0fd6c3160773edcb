//! Access constraints.
//!
//! A constraint answers one kind of access question by narrowing the matching
//! context. The built-in constraints consult [`AccessDecisions`] for resource
//! policies and [`RowLevelPolicyStore`] for row-level policies.

use std::sync::Arc;

use crate::access::authentication::CurrentAuthentication;
use crate::access::context::{
    CrudEntityContext, EntityAttributeContext, GraphQlAccessContext, InMemoryCrudEntityContext,
    MenuItemAccessContext, QueryCondition, ReadEntityQueryContext, SpecificOperationAccessContext,
    ViewAccessContext,
};
use crate::access::decision::AccessDecisions;
use crate::model::{
    EntityAttributePolicyAction, RowLevelPolicyAction, RowLevelPolicyType, actions,
};
use crate::policy::RowLevelPolicyStore;

/// Narrows an access context of type `C`.
pub trait AccessConstraint<C>: Send + Sync {
    fn apply_to(&self, context: &mut C);
}

// =============================================================================
// Resource Constraints
// =============================================================================

pub struct ViewAccessConstraint {
    decisions: AccessDecisions,
}

impl ViewAccessConstraint {
    #[must_use]
    pub fn new(decisions: AccessDecisions) -> Self {
        Self { decisions }
    }
}

impl AccessConstraint<ViewAccessContext> for ViewAccessConstraint {
    fn apply_to(&self, context: &mut ViewAccessContext) {
        if !self.decisions.is_view_permitted(context.view_id()) {
            context.deny();
        }
    }
}

pub struct MenuItemAccessConstraint {
    decisions: AccessDecisions,
}

impl MenuItemAccessConstraint {
    #[must_use]
    pub fn new(decisions: AccessDecisions) -> Self {
        Self { decisions }
    }
}

impl AccessConstraint<MenuItemAccessContext> for MenuItemAccessConstraint {
    fn apply_to(&self, context: &mut MenuItemAccessContext) {
        if !self.decisions.is_menu_item_permitted(context.item()) {
            context.deny();
        }
    }
}

pub struct CrudEntityConstraint {
    decisions: AccessDecisions,
}

impl CrudEntityConstraint {
    #[must_use]
    pub fn new(decisions: AccessDecisions) -> Self {
        Self { decisions }
    }
}

impl AccessConstraint<CrudEntityContext> for CrudEntityConstraint {
    fn apply_to(&self, context: &mut CrudEntityContext) {
        let entity = context.entity_name().to_string();
        if !self.decisions.is_entity_permitted(&entity, actions::CREATE) {
            context.deny_create();
        }
        if !self.decisions.is_entity_permitted(&entity, actions::READ) {
            context.deny_read();
        }
        if !self.decisions.is_entity_permitted(&entity, actions::UPDATE) {
            context.deny_update();
        }
        if !self.decisions.is_entity_permitted(&entity, actions::DELETE) {
            context.deny_delete();
        }
    }
}

pub struct EntityAttributeConstraint {
    decisions: AccessDecisions,
}

impl EntityAttributeConstraint {
    #[must_use]
    pub fn new(decisions: AccessDecisions) -> Self {
        Self { decisions }
    }
}

impl AccessConstraint<EntityAttributeContext> for EntityAttributeConstraint {
    fn apply_to(&self, context: &mut EntityAttributeContext) {
        let (entity, attribute) = (
            context.entity_name().to_string(),
            context.attribute().to_string(),
        );
        if !self.decisions.is_entity_attribute_permitted(
            &entity,
            &attribute,
            EntityAttributePolicyAction::View,
        ) {
            context.deny_view();
        }
        if !self.decisions.is_entity_attribute_permitted(
            &entity,
            &attribute,
            EntityAttributePolicyAction::Modify,
        ) {
            context.deny_modify();
        }
    }
}

pub struct SpecificOperationConstraint {
    decisions: AccessDecisions,
}

impl SpecificOperationConstraint {
    #[must_use]
    pub fn new(decisions: AccessDecisions) -> Self {
        Self { decisions }
    }
}

impl AccessConstraint<SpecificOperationAccessContext> for SpecificOperationConstraint {
    fn apply_to(&self, context: &mut SpecificOperationAccessContext) {
        if !self.decisions.is_specific_permitted(context.resource()) {
            context.deny();
        }
    }
}

pub struct GraphQlConstraint {
    decisions: AccessDecisions,
}

impl GraphQlConstraint {
    #[must_use]
    pub fn new(decisions: AccessDecisions) -> Self {
        Self { decisions }
    }
}

impl AccessConstraint<GraphQlAccessContext> for GraphQlConstraint {
    fn apply_to(&self, context: &mut GraphQlAccessContext) {
        if !self.decisions.is_graphql_permitted(context.resource()) {
            context.deny();
        }
    }
}

// =============================================================================
// Row Level Constraints
// =============================================================================

/// Adds JPQL conditions of the current principal to read queries.
pub struct ReadEntityQueryConstraint {
    store: RowLevelPolicyStore,
}

impl ReadEntityQueryConstraint {
    #[must_use]
    pub fn new(store: RowLevelPolicyStore) -> Self {
        Self { store }
    }
}

impl AccessConstraint<ReadEntityQueryContext> for ReadEntityQueryConstraint {
    fn apply_to(&self, context: &mut ReadEntityQueryContext) {
        let policies = self.store.row_level_policies(context.entity_name());
        for policy in policies {
            if policy.policy_type != RowLevelPolicyType::Jpql
                || policy.action != RowLevelPolicyAction::Read
            {
                continue;
            }
            if let Some(where_clause) = policy.where_clause {
                context.add_condition(QueryCondition {
                    where_clause,
                    join_clause: policy.join_clause,
                });
            }
        }
    }
}

/// Collects predicate policies of the current principal for in-memory checks.
pub struct InMemoryCrudEntityConstraint {
    store: RowLevelPolicyStore,
    current: Arc<dyn CurrentAuthentication>,
}

impl InMemoryCrudEntityConstraint {
    #[must_use]
    pub fn new(store: RowLevelPolicyStore, current: Arc<dyn CurrentAuthentication>) -> Self {
        Self { store, current }
    }
}

impl AccessConstraint<InMemoryCrudEntityContext> for InMemoryCrudEntityConstraint {
    fn apply_to(&self, context: &mut InMemoryCrudEntityContext) {
        if let Some(auth) = self.current.authentication() {
            context.set_predicate_context(auth.predicate_context());
        }
        let policies = self.store.row_level_policies(context.entity_name());
        for policy in policies {
            if policy.policy_type == RowLevelPolicyType::Predicate {
                context.add_policy(policy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Authentication, AuthenticationHolder, RoleGrantedAuthority};
    use crate::config::DecisionConfig;
    use crate::model::{ResourcePolicy, RowLevelPolicy};
    use crate::policy::ResourcePolicyStore;
    use serde_json::json;

    fn holder(authority: RoleGrantedAuthority) -> Arc<AuthenticationHolder> {
        Arc::new(AuthenticationHolder::authenticated(
            Authentication::new("alice").with_authority(authority),
        ))
    }

    fn decisions(authority: RoleGrantedAuthority) -> AccessDecisions {
        AccessDecisions::new(
            ResourcePolicyStore::new(holder(authority)),
            DecisionConfig::default(),
        )
    }

    #[test]
    fn test_crud_constraint_denies_missing_actions() {
        let constraint = CrudEntityConstraint::new(decisions(
            RoleGrantedAuthority::new("ROLE_reader").with_resource_policies([
                ResourcePolicy::entity("Order", actions::READ),
                ResourcePolicy::entity("Order", actions::UPDATE),
            ]),
        ));
        let mut context = CrudEntityContext::new("Order");

        constraint.apply_to(&mut context);

        assert!(context.is_read_permitted());
        assert!(context.is_update_permitted());
        assert!(!context.is_create_permitted());
        assert!(!context.is_delete_permitted());
    }

    #[test]
    fn test_attribute_constraint() {
        let constraint = EntityAttributeConstraint::new(decisions(
            RoleGrantedAuthority::new("ROLE_a").with_resource_policies([
                ResourcePolicy::entity_attribute("Order", "total", actions::VIEW),
            ]),
        ));
        let mut context = EntityAttributeContext::new("Order", "total");

        constraint.apply_to(&mut context);

        assert!(context.is_view_permitted());
        assert!(!context.is_modify_permitted());
    }

    #[test]
    fn test_view_and_specific_constraints() {
        let decisions = decisions(RoleGrantedAuthority::new("ROLE_a").with_resource_policies([
            ResourcePolicy::screen("orderList"),
            ResourcePolicy::specific("reports.export"),
        ]));
        let view = ViewAccessConstraint::new(decisions.clone());
        let specific = SpecificOperationConstraint::new(decisions.clone());
        let graphql = GraphQlConstraint::new(decisions);

        let mut allowed = ViewAccessContext::new("orderList");
        let mut denied = ViewAccessContext::new("customerList");
        view.apply_to(&mut allowed);
        view.apply_to(&mut denied);
        assert!(allowed.is_permitted());
        assert!(!denied.is_permitted());

        let mut export = SpecificOperationAccessContext::new("reports.export");
        specific.apply_to(&mut export);
        assert!(export.is_permitted());

        let mut query = GraphQlAccessContext::new("orders");
        graphql.apply_to(&mut query);
        assert!(!query.is_permitted());
    }

    #[test]
    fn test_read_query_constraint_collects_jpql_only() {
        let store = RowLevelPolicyStore::new(holder(
            RoleGrantedAuthority::new("ROW_LEVEL_ROLE_a").with_row_level_policies([
                RowLevelPolicy::jpql("Order", "{E}.region = 'EU'", Some("join {E}.customer c".into())),
                RowLevelPolicy::predicate("Order", RowLevelPolicyAction::Read, Arc::new(|_, _| false)),
            ]),
        ));
        let constraint = ReadEntityQueryConstraint::new(store);
        let mut context = ReadEntityQueryContext::new("Order");

        constraint.apply_to(&mut context);

        assert_eq!(context.conditions().len(), 1);
        assert_eq!(context.conditions()[0].join_clause.as_deref(), Some("join {E}.customer c"));
    }

    #[test]
    fn test_in_memory_constraint_collects_predicates() {
        let holder = holder(RoleGrantedAuthority::new("ROW_LEVEL_ROLE_a").with_row_level_policies([
            RowLevelPolicy::jpql("Order", "{E}.region = 'EU'", None),
            RowLevelPolicy::predicate(
                "Order",
                RowLevelPolicyAction::Delete,
                Arc::new(|entity, ctx| ctx.username.as_deref() == entity["owner"].as_str()),
            ),
        ]));
        let constraint =
            InMemoryCrudEntityConstraint::new(RowLevelPolicyStore::new(holder.clone()), holder);
        let mut context = InMemoryCrudEntityContext::new("Order");

        constraint.apply_to(&mut context);

        assert_eq!(context.policy_count(RowLevelPolicyAction::Read), 0);
        assert!(context.is_permitted(RowLevelPolicyAction::Delete, &json!({"owner": "alice"})));
        assert!(!context.is_permitted(RowLevelPolicyAction::Delete, &json!({"owner": "bob"})));
    }
}
