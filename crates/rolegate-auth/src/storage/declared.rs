//! Read-only provider for declared roles.
//!
//! Roles are built once, when the provider is constructed, by running every
//! policy declaration through the extractor registry. A malformed declaration
//! aborts construction of the whole role set.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::AuthResult;
use crate::error::AuthError;
use crate::extractor::{PolicyExtractors, ResourceRoleDeclaration, RowLevelRoleDeclaration};
use crate::model::{ResourceRole, Role, RowLevelRole};
use crate::storage::provider::RoleProvider;

/// Default provider name.
pub const DECLARED_PROVIDER_NAME: &str = "annotated";

/// Role definition file layout.
///
/// ```toml
/// [[roles]]
/// code = "order-viewer"
/// scopes = ["UI"]
///
/// [[roles.policies]]
/// kind = "view"
/// resources = ["orderList"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ResourceRoleDefinitions {
    #[serde(default)]
    pub roles: Vec<ResourceRoleDeclaration>,
}

/// Immutable provider of roles built from declarations.
pub struct DeclaredRoleProvider<R: Role> {
    name: String,
    roles: IndexMap<String, R>,
}

impl<R: Role> DeclaredRoleProvider<R> {
    fn from_roles(name: impl Into<String>, built: Vec<R>) -> AuthResult<Self> {
        let name = name.into();
        let mut roles = IndexMap::with_capacity(built.len());
        for role in built {
            let code = role.code().to_string();
            if roles.insert(code.clone(), role).is_some() {
                return Err(AuthError::configuration(format!(
                    "role '{}' is declared more than once",
                    code
                )));
            }
        }
        tracing::info!(provider = %name, roles = roles.len(), "Declared roles loaded");
        Ok(Self { name, roles })
    }

    /// Renames the provider.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Codes of all declared roles, in declaration order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }
}

impl DeclaredRoleProvider<ResourceRole> {
    /// Builds resource roles from declarations.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed or duplicate declarations.
    pub fn resource_roles(
        extractors: &PolicyExtractors,
        declarations: &[ResourceRoleDeclaration],
    ) -> AuthResult<Self> {
        let built = declarations
            .iter()
            .map(|d| extractors.build_resource_role(d))
            .collect::<AuthResult<Vec<_>>>()?;
        Self::from_roles(DECLARED_PROVIDER_NAME, built)
    }

    /// Builds resource roles from a TOML role definition document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document cannot be parsed or a
    /// declaration is malformed.
    pub fn from_toml_str(extractors: &PolicyExtractors, content: &str) -> AuthResult<Self> {
        let definitions: ResourceRoleDefinitions = toml::from_str(content).map_err(|e| {
            AuthError::configuration(format!("invalid role definition document: {}", e))
        })?;
        Self::resource_roles(extractors, &definitions.roles)
    }
}

impl DeclaredRoleProvider<RowLevelRole> {
    /// Builds row-level roles from declarations.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed or duplicate declarations,
    /// including failing predicate factories.
    pub fn row_level_roles(
        extractors: &PolicyExtractors,
        declarations: &[RowLevelRoleDeclaration],
    ) -> AuthResult<Self> {
        let built = declarations
            .iter()
            .map(|d| extractors.build_row_level_role(d))
            .collect::<AuthResult<Vec<_>>>()?;
        Self::from_roles(DECLARED_PROVIDER_NAME, built)
    }
}

#[async_trait]
impl<R: Role> RoleProvider<R> for DeclaredRoleProvider<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_role_by_code(&self, code: &str) -> AuthResult<Option<R>> {
        Ok(self.roles.get(code).cloned())
    }

    async fn get_all_roles(&self) -> AuthResult<Vec<R>> {
        Ok(self.roles.values().cloned().collect())
    }

    async fn delete_role(&self, role: &R) -> AuthResult<bool> {
        Err(AuthError::unsupported(format!(
            "declared role '{}' cannot be deleted",
            role.code()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{
        ExtendedEntities, ResourceListDeclaration, ResourcePolicyDeclaration,
    };
    use crate::model::{ResourcePolicyType, actions};
    use std::sync::Arc;

    fn extractors() -> PolicyExtractors {
        let mut entities = ExtendedEntities::new();
        entities.register("Order", "Order");
        PolicyExtractors::new(Arc::new(entities))
    }

    fn declaration(code: &str) -> ResourceRoleDeclaration {
        ResourceRoleDeclaration {
            code: code.to_string(),
            policies: vec![ResourcePolicyDeclaration::Menu(ResourceListDeclaration {
                resources: vec!["orders".to_string()],
            })],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_declared_roles() {
        let provider =
            DeclaredRoleProvider::resource_roles(&extractors(), &[declaration("a"), declaration("b")])
                .unwrap();

        assert_eq!(provider.name(), DECLARED_PROVIDER_NAME);
        assert_eq!(provider.codes().collect::<Vec<_>>(), vec!["a", "b"]);
        let role = provider.find_role_by_code("b").await.unwrap().unwrap();
        assert_eq!(
            role.resource_policies[0].policy_type,
            ResourcePolicyType::Menu
        );
    }

    #[tokio::test]
    async fn test_duplicate_codes_rejected() {
        let result =
            DeclaredRoleProvider::resource_roles(&extractors(), &[declaration("a"), declaration("a")]);
        assert!(matches!(result, Err(AuthError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_delete_is_unsupported() {
        let provider =
            DeclaredRoleProvider::resource_roles(&extractors(), &[declaration("a")]).unwrap();
        let err = provider
            .delete_role(&ResourceRole::new("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedOperation { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_from_toml() {
        let content = r#"
            [[roles]]
            code = "order-viewer"
            name = "Order viewer"
            scopes = ["UI"]
            childRoles = ["ui-minimal"]

            [[roles.policies]]
            kind = "view"
            resources = ["orderList"]

            [[roles.policies]]
            kind = "entity"
            entityClass = "Order"
            actions = ["READ"]

            [[roles.policies]]
            kind = "explicit"
            name = "extra"
            policies = [{ type = "SPECIFIC", resource = "orders.export" }]
        "#;

        let provider = DeclaredRoleProvider::from_toml_str(&extractors(), content).unwrap();
        let role = provider
            .find_role_by_code("order-viewer")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.base.name, "Order viewer");
        assert!(role.scopes.contains("UI"));
        assert_eq!(role.resource_policies.len(), 3);
        assert_eq!(role.resource_policies[1].action, actions::READ);
    }

    #[test]
    fn test_invalid_toml() {
        let result = DeclaredRoleProvider::from_toml_str(&extractors(), "[[roles]]\nname = 1");
        assert!(matches!(result, Err(AuthError::Configuration { .. })));
    }
}
