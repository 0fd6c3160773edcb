//! Boolean access decisions over the current principal's resource policies.
//!
//! Only `ALLOW` policies are consulted. A request is permitted when an
//! `ALLOW` policy exists for the exact resource, or failing that for the
//! wildcard resource; otherwise it is denied. `DENY` policies never grant and
//! never override a grant.
//!
//! | Kind | Lookup order |
//! |------|--------------|
//! | View, menu, specific, GraphQL | `resource`, `*` |
//! | Entity | `(entity, action)`, `(*, action)` |
//! | Entity attribute | `entity.attr`, `entity.*`, `*.*` |
//!
//! Menu items are additionally permitted when any descendant is, unless
//! `decision.menu_transitive` is disabled.

use std::sync::Arc;

use tracing::debug;

use crate::access::menu::{MenuConfig, MenuItem};
use crate::config::DecisionConfig;
use crate::model::{
    EntityAttributePolicyAction, ResourcePolicy, ResourcePolicyType, actions,
};
use crate::policy::ResourcePolicyStore;

/// Evaluates resource access for the current principal.
#[derive(Clone)]
pub struct AccessDecisions {
    store: ResourcePolicyStore,
    config: DecisionConfig,
    menu: Option<Arc<MenuConfig>>,
}

impl AccessDecisions {
    #[must_use]
    pub fn new(store: ResourcePolicyStore, config: DecisionConfig) -> Self {
        Self {
            store,
            config,
            menu: None,
        }
    }

    /// Registers the menu tree used to resolve menu ids to items.
    #[must_use]
    pub fn with_menu(mut self, menu: Arc<MenuConfig>) -> Self {
        self.menu = Some(menu);
        self
    }

    #[must_use]
    pub fn store(&self) -> &ResourcePolicyStore {
        &self.store
    }

    // =========================================================================
    // Views and Menus
    // =========================================================================

    #[must_use]
    pub fn is_view_permitted(&self, view_id: &str) -> bool {
        let permitted = self.is_resource_permitted(ResourcePolicyType::Screen, view_id, None);
        self.log(ResourcePolicyType::Screen, view_id, actions::ACCESS, permitted);
        permitted
    }

    /// Checks a menu id.
    ///
    /// When a menu tree is registered and contains `menu_id`, the item is
    /// checked transitively; otherwise only the id itself is checked.
    #[must_use]
    pub fn is_menu_permitted(&self, menu_id: &str) -> bool {
        match self.menu.as_ref().and_then(|menu| menu.find(menu_id)) {
            Some(item) => self.is_menu_item_permitted(item),
            None => {
                let permitted = self.is_menu_id_permitted(menu_id);
                self.log(ResourcePolicyType::Menu, menu_id, actions::ACCESS, permitted);
                permitted
            }
        }
    }

    /// Checks a menu item, descending into its children when transitive.
    #[must_use]
    pub fn is_menu_item_permitted(&self, item: &MenuItem) -> bool {
        let permitted = self.is_menu_id_permitted(&item.id)
            || (self.config.menu_transitive
                && item
                    .children
                    .iter()
                    .any(|child| self.is_menu_item_permitted(child)));
        self.log(ResourcePolicyType::Menu, &item.id, actions::ACCESS, permitted);
        permitted
    }

    /// Returns the permitted part of a menu tree.
    ///
    /// Items that are not permitted are dropped with their subtrees.
    #[must_use]
    pub fn permitted_menu(&self, items: &[MenuItem]) -> Vec<MenuItem> {
        items
            .iter()
            .filter(|item| self.is_menu_item_permitted(item))
            .map(|item| MenuItem {
                id: item.id.clone(),
                children: self.permitted_menu(&item.children),
            })
            .collect()
    }

    fn is_menu_id_permitted(&self, menu_id: &str) -> bool {
        self.is_resource_permitted(ResourcePolicyType::Menu, menu_id, None)
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Checks an entity operation such as `read` or `update`.
    #[must_use]
    pub fn is_entity_permitted(&self, entity_name: &str, action: &str) -> bool {
        let permitted =
            self.is_resource_permitted(ResourcePolicyType::Entity, entity_name, Some(action));
        self.log(ResourcePolicyType::Entity, entity_name, action, permitted);
        permitted
    }

    /// Checks access to an entity attribute.
    ///
    /// A `modify` grant also permits `view`.
    #[must_use]
    pub fn is_entity_attribute_permitted(
        &self,
        entity_name: &str,
        attribute: &str,
        action: EntityAttributePolicyAction,
    ) -> bool {
        let wildcard = self.config.wildcard_resource.as_str();
        let candidates = [
            (entity_name, attribute),
            (entity_name, wildcard),
            (wildcard, wildcard),
        ];
        let permitted = candidates.iter().any(|(entity, attr)| {
            self.store
                .entity_attribute_policies(entity, attr)
                .any(|policy| grants_attribute(&policy, action))
        });

        self.log(
            ResourcePolicyType::EntityAttribute,
            &format!("{entity_name}.{attribute}"),
            action.as_str(),
            permitted,
        );
        permitted
    }

    // =========================================================================
    // Custom Operations
    // =========================================================================

    #[must_use]
    pub fn is_specific_permitted(&self, resource: &str) -> bool {
        let permitted = self.is_resource_permitted(ResourcePolicyType::Specific, resource, None);
        self.log(ResourcePolicyType::Specific, resource, actions::ACCESS, permitted);
        permitted
    }

    #[must_use]
    pub fn is_graphql_permitted(&self, resource: &str) -> bool {
        let permitted = self.is_resource_permitted(ResourcePolicyType::Graphql, resource, None);
        self.log(ResourcePolicyType::Graphql, resource, actions::ACCESS, permitted);
        permitted
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Exact resource first, then the wildcard resource.
    fn is_resource_permitted(
        &self,
        policy_type: ResourcePolicyType,
        resource: &str,
        action: Option<&str>,
    ) -> bool {
        let grants = |policy: &ResourcePolicy| {
            policy.is_allowed() && action.is_none_or(|action| policy.action == action)
        };

        self.store.policies(policy_type, resource).any(|p| grants(&p))
            || self
                .store
                .policies(policy_type, &self.config.wildcard_resource)
                .any(|p| grants(&p))
    }

    fn log(&self, policy_type: ResourcePolicyType, resource: &str, action: &str, permitted: bool) {
        if self.config.log_decisions {
            debug!(
                policy_type = %policy_type,
                resource = resource,
                action = action,
                permitted = permitted,
                "Access decision"
            );
        }
    }
}

fn grants_attribute(policy: &ResourcePolicy, action: EntityAttributePolicyAction) -> bool {
    if !policy.is_allowed() {
        return false;
    }
    match action {
        EntityAttributePolicyAction::View => {
            policy.action == actions::VIEW || policy.action == actions::MODIFY
        }
        EntityAttributePolicyAction::Modify => policy.action == actions::MODIFY,
    }
}
