//! # rolegate-auth
//!
//! Role and policy based authorization engine.
//!
//! This crate provides:
//! - Resource and row-level policy models
//! - Policy extraction from declarative role definitions
//! - Pluggable role providers with explicit precedence
//! - Role hierarchy resolution with cycle-safe traversal and caching
//! - Scope-aware policy stores and boolean access decisions
//! - Access contexts and constraint chains for host integration
//!
//! ## Overview
//!
//! Roles come from an ordered list of [`storage::RoleProvider`]s. The
//! [`policy::RoleRepository`] resolves a role code to a role whose merged
//! policies include those of every reachable child role, and caches the
//! result until invalidated. Resolved roles become
//! [`access::RoleGrantedAuthority`] values on an [`access::Authentication`];
//! the policy stores read them through [`access::CurrentAuthentication`] and
//! [`access::AccessDecisions`] turns them into yes/no answers.
//!
//! ## Modules
//!
//! - [`model`] - Policies and roles
//! - [`extractor`] - Declarations to policies
//! - [`storage`] - Role providers
//! - [`policy`] - Role repository, cache, indices and policy stores
//! - [`access`] - Authentication, decisions, contexts and constraints
//! - [`config`] - Engine configuration
//! - [`error`] - Error types

pub mod access;
pub mod config;
pub mod error;
pub mod extractor;
pub mod model;
pub mod policy;
pub mod storage;

pub use access::{
    AccessConstraint, AccessDecisions, AccessManager, Authentication, AuthenticationHolder,
    AuthorityLoader, ClientDetails, CurrentAuthentication, GrantedAuthority, MenuConfig, MenuItem,
    RoleAssignment, RoleAssignmentProvider, RoleGrantedAuthority,
};
pub use config::{AuthorizationConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use extractor::{PolicyExtractors, ResourceRoleDeclaration, RowLevelRoleDeclaration};
pub use model::{
    ResourcePolicy, ResourcePolicyEffect, ResourcePolicyType, ResourceRole, Role, RowLevelPolicy,
    RowLevelPolicyAction, RowLevelRole,
};
pub use policy::{
    ResourcePolicyStore, ResourceRoleRepository, RoleRepository, RowLevelPolicyStore,
    RowLevelRoleRepository,
};
pub use storage::{DeclaredRoleProvider, InMemoryRoleProvider, RoleProvider};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use rolegate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::access::{
        AccessConstraint, AccessDecisions, AccessManager, Authentication, AuthenticationHolder,
        AuthorityLoader, ClientDetails, CrudEntityContext, CurrentAuthentication,
        EntityAttributeContext, GrantedAuthority, GraphQlAccessContext, InMemoryCrudEntityContext,
        MenuConfig, MenuItem, MenuItemAccessContext, ReadEntityQueryContext, RoleAssignment,
        RoleAssignmentProvider, RoleGrantedAuthority, SpecificOperationAccessContext,
        ViewAccessContext,
    };
    pub use crate::config::{AuthorizationConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::extractor::{
        EntityNameResolver, ExtendedEntities, PolicyExtractors, ResourcePolicyDeclaration,
        ResourceRoleDeclaration, RowLevelPolicyDeclaration, RowLevelRoleDeclaration,
    };
    pub use crate::model::{
        EntityAttributePolicyAction, EntityPolicyAction, PredicateContext, ResourcePolicy,
        ResourcePolicyEffect, ResourcePolicyType, ResourceRole, Role, RowLevelPolicy,
        RowLevelPolicyAction, RowLevelRole, actions,
    };
    pub use crate::policy::{
        ResourcePolicyStore, ResourceRoleRepository, RoleRepository, RowLevelPolicyStore,
        RowLevelRoleRepository,
    };
    pub use crate::storage::{DeclaredRoleProvider, InMemoryRoleProvider, RoleProvider};
}
