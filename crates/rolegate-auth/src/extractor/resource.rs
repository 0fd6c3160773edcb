//! Resource policy extraction.
//!
//! Each function turns one declaration into policies. They are pure apart
//! from the random unique keys attached to specific, GraphQL and explicit
//! policies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AuthResult;
use crate::error::AuthError;
use crate::extractor::entity_name::EntityNameResolver;
use crate::model::{
    EntityAttributePolicyAction, EntityPolicyAction, ResourcePolicy, ResourcePolicyType,
};

// =============================================================================
// Declarations
// =============================================================================

/// CRUD permissions on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPolicyDeclaration {
    pub entity_class: String,
    pub actions: Vec<EntityPolicyAction>,
}

/// Attribute permissions on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAttributePolicyDeclaration {
    pub entity_class: String,
    pub attributes: Vec<String>,
    pub actions: Vec<EntityAttributePolicyAction>,
}

/// A plain list of resource identifiers of one policy type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceListDeclaration {
    pub resources: Vec<String>,
}

/// A named, ready-made list of policies supplied as a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplicitPolicyDeclaration {
    /// Name used in error messages.
    pub name: String,

    /// Must be an array of resource policies.
    pub policies: Value,
}

/// Tagged union of all resource policy declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourcePolicyDeclaration {
    Entity(EntityPolicyDeclaration),
    EntityAttribute(EntityAttributePolicyDeclaration),
    View(ResourceListDeclaration),
    Menu(ResourceListDeclaration),
    Specific(ResourceListDeclaration),
    Graphql(ResourceListDeclaration),
    Explicit(ExplicitPolicyDeclaration),
}

// =============================================================================
// Extraction
// =============================================================================

fn require_entity_class(entity_class: &str) -> AuthResult<()> {
    if entity_class.trim().is_empty() {
        return Err(AuthError::configuration(
            "entity policy declaration is missing the entity class",
        ));
    }
    Ok(())
}

/// One policy per declared CRUD action; `ALL` expands to the four actions.
pub fn extract_entity_policies(
    declaration: &EntityPolicyDeclaration,
    resolver: &dyn EntityNameResolver,
) -> AuthResult<Vec<ResourcePolicy>> {
    require_entity_class(&declaration.entity_class)?;
    let entity_name = resolver.original_entity_name(&declaration.entity_class)?;

    Ok(declaration
        .actions
        .iter()
        .flat_map(|action| action.expand().iter())
        .map(|action| ResourcePolicy::entity(entity_name.clone(), *action))
        .collect())
}

/// One policy per `(attribute, action)` pair.
pub fn extract_entity_attribute_policies(
    declaration: &EntityAttributePolicyDeclaration,
    resolver: &dyn EntityNameResolver,
) -> AuthResult<Vec<ResourcePolicy>> {
    require_entity_class(&declaration.entity_class)?;
    let entity_name = resolver.original_entity_name(&declaration.entity_class)?;

    let mut policies = Vec::with_capacity(declaration.attributes.len() * declaration.actions.len());
    for attribute in &declaration.attributes {
        if attribute.trim().is_empty() {
            return Err(AuthError::configuration(format!(
                "entity attribute policy for '{}' contains an empty attribute name",
                entity_name
            )));
        }
        for action in &declaration.actions {
            policies.push(ResourcePolicy::entity_attribute(
                &entity_name,
                attribute,
                action.as_str(),
            ));
        }
    }
    Ok(policies)
}

/// One policy per identifier. Specific and GraphQL policies get a fresh
/// unique key so repeated extraction never collapses them.
pub fn extract_resource_list(
    policy_type: ResourcePolicyType,
    declaration: &ResourceListDeclaration,
) -> AuthResult<Vec<ResourcePolicy>> {
    let unique = matches!(
        policy_type,
        ResourcePolicyType::Specific | ResourcePolicyType::Graphql
    );

    declaration
        .resources
        .iter()
        .map(|resource| {
            if resource.trim().is_empty() {
                return Err(AuthError::configuration(format!(
                    "{} policy declaration contains an empty resource",
                    policy_type
                )));
            }
            let policy = ResourcePolicy::new(policy_type, resource.clone());
            Ok(if unique { policy.with_unique_key() } else { policy })
        })
        .collect()
}

/// Validates and returns a ready-made policy list.
///
/// # Errors
///
/// Returns a configuration error if the payload is not an array of resource
/// policies.
pub fn extract_explicit_policies(
    declaration: &ExplicitPolicyDeclaration,
) -> AuthResult<Vec<ResourcePolicy>> {
    let Value::Array(items) = &declaration.policies else {
        return Err(AuthError::configuration(format!(
            "explicit policy declaration '{}' must provide a collection of resource policies",
            declaration.name
        )));
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value::<ResourcePolicy>(item.clone())
                .map(ResourcePolicy::with_unique_key)
                .map_err(|e| {
                    AuthError::configuration(format!(
                        "explicit policy declaration '{}' item {} is not a resource policy: {}",
                        declaration.name, idx, e
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtendedEntities;
    use crate::model::{UNIQUE_KEY_PROPERTY, actions};
    use serde_json::json;

    fn entities() -> ExtendedEntities {
        let mut entities = ExtendedEntities::new();
        entities.register("Foo", "Foo");
        entities.replace("Foo", "ExtFoo", "ExtFoo");
        entities.register("Order", "Order");
        entities
    }

    #[test]
    fn test_entity_all_expands() {
        let declaration = EntityPolicyDeclaration {
            entity_class: "Order".to_string(),
            actions: vec![EntityPolicyAction::All],
        };
        let policies = extract_entity_policies(&declaration, &entities()).unwrap();
        let actions: Vec<_> = policies.iter().map(|p| p.action.as_str()).collect();
        assert_eq!(actions, vec!["create", "read", "update", "delete"]);
        assert!(policies.iter().all(|p| p.resource == "Order"));
    }

    #[test]
    fn test_entity_uses_original_name() {
        let declaration = EntityPolicyDeclaration {
            entity_class: "Foo".to_string(),
            actions: vec![EntityPolicyAction::Read],
        };
        let policies = extract_entity_policies(&declaration, &entities()).unwrap();
        assert_eq!(policies, vec![ResourcePolicy::entity("Foo", actions::READ)]);
    }

    #[test]
    fn test_entity_missing_class() {
        let declaration = EntityPolicyDeclaration {
            entity_class: " ".to_string(),
            actions: vec![EntityPolicyAction::Read],
        };
        assert!(extract_entity_policies(&declaration, &entities()).is_err());
    }

    #[test]
    fn test_entity_attribute_cartesian_product() {
        let declaration = EntityAttributePolicyDeclaration {
            entity_class: "ExtFoo".to_string(),
            attributes: vec!["name".to_string(), "price".to_string()],
            actions: vec![
                EntityAttributePolicyAction::View,
                EntityAttributePolicyAction::Modify,
            ],
        };
        let policies = extract_entity_attribute_policies(&declaration, &entities()).unwrap();
        assert_eq!(policies.len(), 4);
        assert_eq!(policies[0].resource, "Foo.name");
        assert_eq!(policies[0].action, "view");
        assert_eq!(policies[3].resource, "Foo.price");
        assert_eq!(policies[3].action, "modify");
    }

    #[test]
    fn test_specific_policies_are_unique() {
        let declaration = ResourceListDeclaration {
            resources: vec!["report.print".to_string()],
        };
        let first = extract_resource_list(ResourcePolicyType::Specific, &declaration).unwrap();
        let second = extract_resource_list(ResourcePolicyType::Specific, &declaration).unwrap();
        assert_ne!(first, second);
        assert!(first[0].custom_properties.contains_key(UNIQUE_KEY_PROPERTY));
    }

    #[test]
    fn test_view_policies_are_deduplicated_by_value() {
        let declaration = ResourceListDeclaration {
            resources: vec!["orderList".to_string()],
        };
        let first = extract_resource_list(ResourcePolicyType::Screen, &declaration).unwrap();
        let second = extract_resource_list(ResourcePolicyType::Screen, &declaration).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_explicit_policies() {
        let declaration = ExplicitPolicyDeclaration {
            name: "adminPolicies".to_string(),
            policies: json!([
                {"type": "SCREEN", "resource": "*"},
                {"type": "ENTITY", "resource": "*", "action": "read"}
            ]),
        };
        let policies = extract_explicit_policies(&declaration).unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[1].action, "read");
        assert!(policies[0].custom_properties.contains_key(UNIQUE_KEY_PROPERTY));
    }

    #[test]
    fn test_explicit_wrong_shape_fails() {
        let declaration = ExplicitPolicyDeclaration {
            name: "broken".to_string(),
            policies: json!({"type": "SCREEN", "resource": "*"}),
        };
        let err = extract_explicit_policies(&declaration).unwrap_err();
        assert!(err.to_string().contains("broken"));

        let declaration = ExplicitPolicyDeclaration {
            name: "broken-item".to_string(),
            policies: json!([{"resource": "no-type"}]),
        };
        assert!(matches!(
            extract_explicit_policies(&declaration),
            Err(AuthError::Configuration { .. })
        ));
    }
}
