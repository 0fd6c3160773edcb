//! Policy stores over the current authentication.
//!
//! Stores are stateless views: every query reads the principal from the
//! [`CurrentAuthentication`] source, keeps the role authorities that carry
//! policy data and apply to the authentication scope, and streams their
//! indexed policies. Results are materialized only as far as the caller
//! consumes them.

use std::sync::Arc;

use crate::access::{CurrentAuthentication, RoleGrantedAuthority};
use crate::model::{ResourcePolicy, ResourcePolicyType, RowLevelPolicy};

/// Collects the applicable authorities of the current principal.
fn applicable_authorities(current: &dyn CurrentAuthentication) -> Vec<Arc<RoleGrantedAuthority>> {
    let Some(auth) = current.authentication() else {
        return Vec::new();
    };
    auth.applicable_authorities().cloned().collect()
}

// =============================================================================
// Resource Policy Store
// =============================================================================

/// Resource policies of the current principal.
#[derive(Clone)]
pub struct ResourcePolicyStore {
    current: Arc<dyn CurrentAuthentication>,
}

impl ResourcePolicyStore {
    #[must_use]
    pub fn new(current: Arc<dyn CurrentAuthentication>) -> Self {
        Self { current }
    }

    /// Policies of `policy_type` for exactly `resource`.
    pub fn policies(
        &self,
        policy_type: ResourcePolicyType,
        resource: &str,
    ) -> impl Iterator<Item = ResourcePolicy> + use<> {
        let resource = resource.to_string();
        applicable_authorities(self.current.as_ref())
            .into_iter()
            .flat_map(move |authority| {
                authority
                    .resource_index()
                    .get(policy_type, &resource)
                    .to_vec()
            })
    }

    pub fn view_policies(&self, view_id: &str) -> impl Iterator<Item = ResourcePolicy> + use<> {
        self.policies(ResourcePolicyType::Screen, view_id)
    }

    pub fn menu_policies(&self, menu_id: &str) -> impl Iterator<Item = ResourcePolicy> + use<> {
        self.policies(ResourcePolicyType::Menu, menu_id)
    }

    /// Entity policies for `entity_name`, all actions.
    pub fn entity_policies(
        &self,
        entity_name: &str,
    ) -> impl Iterator<Item = ResourcePolicy> + use<> {
        self.policies(ResourcePolicyType::Entity, entity_name)
    }

    /// Attribute policies indexed under `entity.attribute`.
    pub fn entity_attribute_policies(
        &self,
        entity_name: &str,
        attribute: &str,
    ) -> impl Iterator<Item = ResourcePolicy> + use<> {
        self.policies(
            ResourcePolicyType::EntityAttribute,
            &format!("{entity_name}.{attribute}"),
        )
    }

    pub fn specific_policies(&self, resource: &str) -> impl Iterator<Item = ResourcePolicy> + use<> {
        self.policies(ResourcePolicyType::Specific, resource)
    }

    pub fn graphql_policies(&self, resource: &str) -> impl Iterator<Item = ResourcePolicy> + use<> {
        self.policies(ResourcePolicyType::Graphql, resource)
    }
}

// =============================================================================
// Row Level Policy Store
// =============================================================================

/// Row-level policies of the current principal.
#[derive(Clone)]
pub struct RowLevelPolicyStore {
    current: Arc<dyn CurrentAuthentication>,
}

impl RowLevelPolicyStore {
    #[must_use]
    pub fn new(current: Arc<dyn CurrentAuthentication>) -> Self {
        Self { current }
    }

    /// Policies restricting `entity_name`.
    pub fn row_level_policies(
        &self,
        entity_name: &str,
    ) -> impl Iterator<Item = RowLevelPolicy> + use<> {
        let entity_name = entity_name.to_string();
        applicable_authorities(self.current.as_ref())
            .into_iter()
            .flat_map(move |authority| authority.row_level_index().get(&entity_name).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Authentication, AuthenticationHolder, ClientDetails, GrantedAuthority};
    use crate::model::{RowLevelPolicyAction, actions};

    fn holder_with(authorities: Vec<RoleGrantedAuthority>) -> Arc<AuthenticationHolder> {
        let auth = Authentication::new("alice")
            .with_authorities(authorities.into_iter().map(GrantedAuthority::from));
        Arc::new(AuthenticationHolder::authenticated(auth))
    }

    // =========================================================================
    // Resource Policies
    // =========================================================================

    #[test]
    fn test_unauthenticated_yields_nothing() {
        let store = ResourcePolicyStore::new(Arc::new(AuthenticationHolder::new()));
        assert_eq!(store.view_policies("orderList").count(), 0);
    }

    #[test]
    fn test_policies_from_all_authorities() {
        let holder = holder_with(vec![
            RoleGrantedAuthority::new("ROLE_a")
                .with_resource_policies([ResourcePolicy::screen("orderList")]),
            RoleGrantedAuthority::new("ROLE_b").with_resource_policies([
                ResourcePolicy::screen("orderList"),
                ResourcePolicy::entity("Order", actions::READ),
            ]),
        ]);
        let store = ResourcePolicyStore::new(holder);

        assert_eq!(store.view_policies("orderList").count(), 2);
        assert_eq!(store.entity_policies("Order").count(), 1);
        assert_eq!(store.menu_policies("orderList").count(), 0);
    }

    #[test]
    fn test_attribute_policies_use_dotted_resource() {
        let holder = holder_with(vec![RoleGrantedAuthority::new("ROLE_a").with_resource_policies([
            ResourcePolicy::entity_attribute("Order", "total", actions::VIEW),
        ])]);
        let store = ResourcePolicyStore::new(holder);

        assert_eq!(store.entity_attribute_policies("Order", "total").count(), 1);
        assert_eq!(store.entity_attribute_policies("Order", "number").count(), 0);
    }

    #[test]
    fn test_scope_filters_authorities() {
        let auth = Authentication::new("alice")
            .with_authority(
                RoleGrantedAuthority::new("ROLE_admin")
                    .with_scope("API")
                    .with_resource_policies([ResourcePolicy::specific("reports.export")]),
            )
            .with_authority(
                RoleGrantedAuthority::new("ROLE_user")
                    .with_scope("UI")
                    .with_resource_policies([ResourcePolicy::graphql("orders")]),
            )
            .with_details(ClientDetails::with_scope("UI"));
        let store = ResourcePolicyStore::new(Arc::new(AuthenticationHolder::authenticated(auth)));

        assert_eq!(store.specific_policies("reports.export").count(), 0);
        assert_eq!(store.graphql_policies("orders").count(), 1);
    }

    #[test]
    fn test_store_follows_holder_updates() {
        let holder = Arc::new(AuthenticationHolder::new());
        let store = ResourcePolicyStore::new(holder.clone());
        assert_eq!(store.view_policies("home").count(), 0);

        holder.set(Authentication::new("bob").with_authority(
            RoleGrantedAuthority::new("ROLE_b").with_resource_policies([ResourcePolicy::screen("home")]),
        ));
        assert_eq!(store.view_policies("home").count(), 1);
    }

    // =========================================================================
    // Row Level Policies
    // =========================================================================

    #[test]
    fn test_row_level_policies_by_entity() {
        let holder = holder_with(vec![
            RoleGrantedAuthority::new("ROW_LEVEL_ROLE_a").with_row_level_policies([
                RowLevelPolicy::jpql("Order", "{E}.region = :session_region", None),
            ]),
            RoleGrantedAuthority::new("ROW_LEVEL_ROLE_b").with_row_level_policies([
                RowLevelPolicy::predicate("Order", RowLevelPolicyAction::Delete, Arc::new(|_, _| false)),
                RowLevelPolicy::jpql("Customer", "{E}.active = true", None),
            ]),
        ]);
        let store = RowLevelPolicyStore::new(holder);

        assert_eq!(store.row_level_policies("Order").count(), 2);
        assert_eq!(store.row_level_policies("Customer").count(), 1);
        assert_eq!(store.row_level_policies("Invoice").count(), 0);
    }
}
