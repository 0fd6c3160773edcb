//! Policy extraction from role declarations.
//!
//! Role declarations are plain records registered by the host application
//! (in code or loaded from a definition file). Each policy declaration is a
//! variant of a tagged union, and [`PolicyExtractors`] dispatches every
//! variant to its extraction function:
//!
//! | Declaration                           | Output                                      |
//! |---------------------------------------|---------------------------------------------|
//! | `Entity { entity_class, actions }`    | one ENTITY policy per action (`ALL` = CRUD) |
//! | `EntityAttribute { .. }`              | one policy per `(attribute, action)`        |
//! | `View` / `Menu`                       | one SCREEN / MENU policy per id             |
//! | `Specific` / `Graphql`                | one uniquely keyed policy per id            |
//! | `Explicit { name, policies }`         | the validated list, uniquely keyed          |
//! | `Jpql { entity_class, where, join }`  | one JPQL READ row-level policy              |
//! | `Predicate { .., factory }`           | one predicate policy per action             |
//!
//! Outputs of all declarations of a role are unioned into an insertion-ordered
//! set.

pub mod entity_name;
pub mod resource;
pub mod row_level;

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;
use crate::model::{
    BaseRole, ResourcePolicy, ResourcePolicyType, ResourceRole, RoleSource, RowLevelPolicy,
    RowLevelRole,
};

pub use entity_name::{EntityNameResolver, ExtendedEntities};
pub use resource::{
    EntityAttributePolicyDeclaration, EntityPolicyDeclaration, ExplicitPolicyDeclaration,
    ResourceListDeclaration, ResourcePolicyDeclaration,
};
pub use row_level::{
    DeclaredPredicate, JpqlRowLevelDeclaration, PredicateFactory, PredicateRowLevelDeclaration,
    RowLevelPolicyDeclaration,
};

// =============================================================================
// Role Declarations
// =============================================================================

/// Declaration of a resource role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRoleDeclaration {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub child_roles: Vec<String>,
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub policies: Vec<ResourcePolicyDeclaration>,
}

/// Declaration of a row-level role.
#[derive(Debug, Clone, Default)]
pub struct RowLevelRoleDeclaration {
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub child_roles: Vec<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub policies: Vec<RowLevelPolicyDeclaration>,
}

fn base_role(
    code: &str,
    name: Option<&String>,
    description: Option<&String>,
    child_roles: &[String],
    custom_properties: &BTreeMap<String, String>,
) -> AuthResult<BaseRole> {
    if code.trim().is_empty() {
        return Err(AuthError::configuration("role declaration is missing a code"));
    }

    let mut base = BaseRole::new(code);
    if let Some(name) = name {
        base.name = name.clone();
    }
    base.description = description.cloned();
    base.source = RoleSource::Annotated;
    base.child_role_codes = child_roles.iter().cloned().collect();
    base.custom_properties = custom_properties.clone();
    Ok(base)
}

// =============================================================================
// Extractor Registry
// =============================================================================

/// Dispatches policy declarations to their extractors.
#[derive(Clone)]
pub struct PolicyExtractors {
    resolver: Arc<dyn EntityNameResolver>,
}

impl PolicyExtractors {
    /// Creates a registry resolving entity names through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn EntityNameResolver>) -> Self {
        Self { resolver }
    }

    /// Extracts the policies of one resource policy declaration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the declaration is malformed.
    pub fn extract_resource_policies(
        &self,
        declaration: &ResourcePolicyDeclaration,
    ) -> AuthResult<Vec<ResourcePolicy>> {
        let resolver = self.resolver.as_ref();
        match declaration {
            ResourcePolicyDeclaration::Entity(d) => resource::extract_entity_policies(d, resolver),
            ResourcePolicyDeclaration::EntityAttribute(d) => {
                resource::extract_entity_attribute_policies(d, resolver)
            }
            ResourcePolicyDeclaration::View(d) => {
                resource::extract_resource_list(ResourcePolicyType::Screen, d)
            }
            ResourcePolicyDeclaration::Menu(d) => {
                resource::extract_resource_list(ResourcePolicyType::Menu, d)
            }
            ResourcePolicyDeclaration::Specific(d) => {
                resource::extract_resource_list(ResourcePolicyType::Specific, d)
            }
            ResourcePolicyDeclaration::Graphql(d) => {
                resource::extract_resource_list(ResourcePolicyType::Graphql, d)
            }
            ResourcePolicyDeclaration::Explicit(d) => resource::extract_explicit_policies(d),
        }
    }

    /// Extracts the policies of one row-level policy declaration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the declaration is malformed or its
    /// predicate factory fails.
    pub fn extract_row_level_policies(
        &self,
        declaration: &RowLevelPolicyDeclaration,
    ) -> AuthResult<Vec<RowLevelPolicy>> {
        let resolver = self.resolver.as_ref();
        match declaration {
            RowLevelPolicyDeclaration::Jpql(d) => row_level::extract_jpql_policy(d, resolver),
            RowLevelPolicyDeclaration::Predicate(d) => {
                row_level::extract_predicate_policies(d, resolver)
            }
        }
    }

    /// Builds a resource role from its declaration.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed policy declaration.
    pub fn build_resource_role(
        &self,
        declaration: &ResourceRoleDeclaration,
    ) -> AuthResult<ResourceRole> {
        let base = base_role(
            &declaration.code,
            declaration.name.as_ref(),
            declaration.description.as_ref(),
            &declaration.child_roles,
            &declaration.custom_properties,
        )?;

        let mut policies = IndexSet::new();
        for policy_declaration in &declaration.policies {
            policies.extend(self.extract_resource_policies(policy_declaration)?);
        }

        Ok(ResourceRole {
            base,
            scopes: declaration.scopes.iter().cloned().collect(),
            resource_policies: policies.into_iter().collect(),
            all_resource_policies: None,
        })
    }

    /// Builds a row-level role from its declaration.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed policy declaration.
    pub fn build_row_level_role(
        &self,
        declaration: &RowLevelRoleDeclaration,
    ) -> AuthResult<RowLevelRole> {
        let base = base_role(
            &declaration.code,
            declaration.name.as_ref(),
            declaration.description.as_ref(),
            &declaration.child_roles,
            &declaration.custom_properties,
        )?;

        let mut policies = IndexSet::new();
        for policy_declaration in &declaration.policies {
            policies.extend(self.extract_row_level_policies(policy_declaration)?);
        }

        Ok(RowLevelRole {
            base,
            row_level_policies: policies.into_iter().collect(),
            all_row_level_policies: None,
        })
    }
}
