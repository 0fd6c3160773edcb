//! Entity name resolution.
//!
//! Policy declarations reference entity classes, while policies are matched
//! by entity name. When an application replaces an entity with an extension
//! entity, declarations written against either class must still produce the
//! name of the original entity so that policy matching does not depend on
//! which extension is active.

use std::collections::HashMap;

use crate::AuthResult;
use crate::error::AuthError;

/// Maps declared entity classes to canonical entity names.
pub trait EntityNameResolver: Send + Sync {
    /// Returns the name of the original entity for the given class.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the class is not part of the metamodel.
    fn original_entity_name(&self, entity_class: &str) -> AuthResult<String>;
}

/// In-memory entity metamodel with support for extension entities.
///
/// # Example
///
/// ```
/// use rolegate_auth::extractor::{EntityNameResolver, ExtendedEntities};
///
/// let mut entities = ExtendedEntities::new();
/// entities.register("com.acme.Foo", "Foo");
/// entities.replace("com.acme.Foo", "com.acme.ext.ExtFoo", "ExtFoo");
///
/// assert_eq!(entities.original_entity_name("com.acme.Foo").unwrap(), "Foo");
/// assert_eq!(entities.original_entity_name("com.acme.ext.ExtFoo").unwrap(), "Foo");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtendedEntities {
    /// Entity class to entity name.
    names: HashMap<String, String>,

    /// Extension class to the class it replaces.
    originals: HashMap<String, String>,

    /// Original class to the extension class replacing it.
    replacements: HashMap<String, String>,
}

impl ExtendedEntities {
    /// Creates an empty metamodel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity class under the given entity name.
    pub fn register(&mut self, entity_class: impl Into<String>, entity_name: impl Into<String>) {
        self.names.insert(entity_class.into(), entity_name.into());
    }

    /// Registers `extension_class` as the replacement of `original_class`.
    pub fn replace(
        &mut self,
        original_class: impl Into<String>,
        extension_class: impl Into<String>,
        extension_name: impl Into<String>,
    ) {
        let original_class = original_class.into();
        let extension_class = extension_class.into();
        self.names
            .insert(extension_class.clone(), extension_name.into());
        self.originals
            .insert(extension_class.clone(), original_class.clone());
        self.replacements.insert(original_class, extension_class);
    }

    /// Returns the class that is in effect for the given class, following
    /// replacements.
    #[must_use]
    pub fn effective_class<'a>(&'a self, entity_class: &'a str) -> &'a str {
        let mut current = entity_class;
        while let Some(next) = self.replacements.get(current) {
            if next == entity_class {
                break;
            }
            current = next.as_str();
        }
        current
    }

    /// Returns the original class for the given class, following extensions
    /// back to the first declared entity.
    #[must_use]
    pub fn original_class<'a>(&'a self, entity_class: &'a str) -> &'a str {
        let mut current = entity_class;
        while let Some(previous) = self.originals.get(current) {
            if previous == entity_class {
                break;
            }
            current = previous.as_str();
        }
        current
    }
}

impl EntityNameResolver for ExtendedEntities {
    fn original_entity_name(&self, entity_class: &str) -> AuthResult<String> {
        let effective = self.effective_class(entity_class);
        if !self.names.contains_key(effective) {
            return Err(AuthError::configuration(format!(
                "Entity class '{}' is not registered in the metamodel",
                entity_class
            )));
        }

        let original = self.original_class(effective);
        self.names.get(original).cloned().ok_or_else(|| {
            AuthError::configuration(format!(
                "Original entity of class '{}' has no name",
                entity_class
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metamodel() -> ExtendedEntities {
        let mut entities = ExtendedEntities::new();
        entities.register("Foo", "Foo");
        entities.register("Bar", "app_Bar");
        entities.replace("Foo", "ExtFoo", "ExtFoo");
        entities
    }

    #[test]
    fn test_plain_entity() {
        assert_eq!(metamodel().original_entity_name("Bar").unwrap(), "app_Bar");
    }

    #[test]
    fn test_replaced_entity_keeps_original_name() {
        let entities = metamodel();
        assert_eq!(entities.effective_class("Foo"), "ExtFoo");
        assert_eq!(entities.original_entity_name("Foo").unwrap(), "Foo");
        assert_eq!(entities.original_entity_name("ExtFoo").unwrap(), "Foo");
    }

    #[test]
    fn test_chained_extensions() {
        let mut entities = metamodel();
        entities.replace("ExtFoo", "ExtExtFoo", "ExtExtFoo");
        assert_eq!(entities.effective_class("Foo"), "ExtExtFoo");
        assert_eq!(entities.original_entity_name("Foo").unwrap(), "Foo");
        assert_eq!(entities.original_entity_name("ExtExtFoo").unwrap(), "Foo");
    }

    #[test]
    fn test_unknown_class_is_configuration_error() {
        let err = metamodel().original_entity_name("Missing").unwrap_err();
        assert!(matches!(err, AuthError::Configuration { .. }));
    }
}
