//! Access checks for the current principal.
//!
//! - [`authentication`] - the principal, its authorities and where to find it
//! - [`authority`] - authorities carrying resolved role policies
//! - [`loader`] - building authorities from role assignments
//! - [`decision`] - boolean resource decisions
//! - [`context`] / [`constraint`] - access questions and the rules narrowing them
//! - [`manager`] - per-context constraint chains
//! - [`menu`] - menu tree for transitive menu checks

pub mod authentication;
pub mod authority;
pub mod constraint;
pub mod context;
pub mod decision;
pub mod loader;
pub mod manager;
pub mod menu;

pub use authentication::{
    Authentication, AuthenticationHolder, ClientDetails, CurrentAuthentication, GrantedAuthority,
};
pub use authority::{RESOURCE_ROLE_PREFIX, ROW_LEVEL_ROLE_PREFIX, RoleGrantedAuthority};
pub use constraint::{
    AccessConstraint, CrudEntityConstraint, EntityAttributeConstraint, GraphQlConstraint,
    InMemoryCrudEntityConstraint, MenuItemAccessConstraint, ReadEntityQueryConstraint,
    SpecificOperationConstraint, ViewAccessConstraint,
};
pub use context::{
    CrudEntityContext, EntityAttributeContext, GraphQlAccessContext, InMemoryCrudEntityContext,
    MenuItemAccessContext, QueryCondition, ReadEntityQueryContext, SpecificOperationAccessContext,
    ViewAccessContext,
};
pub use decision::AccessDecisions;
pub use loader::{
    AuthorityLoader, InMemoryRoleAssignmentProvider, RoleAssignment, RoleAssignmentProvider,
    RoleAssignmentType,
};
pub use manager::AccessManager;
pub use menu::{MenuConfig, MenuItem};
