//! Policy and role value types.
//!
//! - [`ResourcePolicy`] - allow/deny statement about a view, menu item, entity
//!   operation, entity attribute, specific operation or GraphQL endpoint
//! - [`RowLevelPolicy`] - row filter expressed as a JPQL fragment or predicate
//! - [`ResourceRole`] / [`RowLevelRole`] - named bundles of policies that may
//!   declare child roles to inherit from
//!
//! Roles are written against the [`Role`] trait so that the hierarchy merge
//! engine in [`crate::policy::repository`] is shared by both role kinds.

pub mod resource_policy;
pub mod role;
pub mod row_level_policy;

pub use resource_policy::{
    EntityAttributePolicyAction, EntityPolicyAction, ResourcePolicy, ResourcePolicyEffect,
    ResourcePolicyType, UNIQUE_KEY_PROPERTY, WILDCARD, actions,
};
pub use role::{BaseRole, ResourceRole, Role, RoleSource, RowLevelRole};
pub use row_level_policy::{
    PredicateContext, RowLevelPolicy, RowLevelPolicyAction, RowLevelPolicyType,
    RowLevelPredicate,
};
