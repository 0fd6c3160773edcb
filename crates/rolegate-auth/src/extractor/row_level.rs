//! Row-level policy extraction.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AuthResult;
use crate::error::AuthError;
use crate::extractor::entity_name::EntityNameResolver;
use crate::model::{RowLevelPolicy, RowLevelPolicyAction, RowLevelPredicate};

// =============================================================================
// Declarations
// =============================================================================

/// Query fragment restricting the rows returned for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JpqlRowLevelDeclaration {
    pub entity_class: String,
    #[serde(rename = "where")]
    pub where_clause: String,
    #[serde(default, rename = "join")]
    pub join_clause: Option<String>,
}

/// Predicate returned by a predicate factory.
#[derive(Clone)]
pub enum DeclaredPredicate {
    /// Tests the entity alone.
    Entity(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
    /// Tests the entity together with the evaluation context.
    EntityWithContext(RowLevelPredicate),
}

impl DeclaredPredicate {
    /// Converts both shapes to the two-argument form.
    #[must_use]
    pub fn normalize(self) -> RowLevelPredicate {
        match self {
            Self::Entity(predicate) => Arc::new(move |entity, _| predicate(entity)),
            Self::EntityWithContext(predicate) => predicate,
        }
    }
}

impl fmt::Debug for DeclaredPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(_) => f.write_str("DeclaredPredicate::Entity"),
            Self::EntityWithContext(_) => f.write_str("DeclaredPredicate::EntityWithContext"),
        }
    }
}

/// Declaring function invoked once at extraction time to obtain the predicate.
pub type PredicateFactory =
    Arc<dyn Fn() -> Result<DeclaredPredicate, String> + Send + Sync>;

/// In-memory predicate applied to the listed operations on an entity.
#[derive(Clone)]
pub struct PredicateRowLevelDeclaration {
    pub entity_class: String,
    pub actions: Vec<RowLevelPolicyAction>,
    pub factory: PredicateFactory,
}

impl fmt::Debug for PredicateRowLevelDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRowLevelDeclaration")
            .field("entity_class", &self.entity_class)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Tagged union of all row-level policy declarations.
#[derive(Debug, Clone)]
pub enum RowLevelPolicyDeclaration {
    Jpql(JpqlRowLevelDeclaration),
    Predicate(PredicateRowLevelDeclaration),
}

// =============================================================================
// Extraction
// =============================================================================

/// Emits one JPQL READ policy with a fresh unique key.
pub fn extract_jpql_policy(
    declaration: &JpqlRowLevelDeclaration,
    resolver: &dyn EntityNameResolver,
) -> AuthResult<Vec<RowLevelPolicy>> {
    if declaration.where_clause.trim().is_empty() {
        return Err(AuthError::configuration(format!(
            "JPQL row-level policy for '{}' has an empty where clause",
            declaration.entity_class
        )));
    }
    let entity_name = resolver.original_entity_name(&declaration.entity_class)?;

    Ok(vec![
        RowLevelPolicy::jpql(
            entity_name,
            declaration.where_clause.clone(),
            declaration.join_clause.clone(),
        )
        .with_unique_key(),
    ])
}

/// Invokes the declaring function and emits one predicate policy per action.
///
/// # Errors
///
/// A failing factory is a configuration error; it is never deferred to
/// evaluation time.
pub fn extract_predicate_policies(
    declaration: &PredicateRowLevelDeclaration,
    resolver: &dyn EntityNameResolver,
) -> AuthResult<Vec<RowLevelPolicy>> {
    let entity_name = resolver.original_entity_name(&declaration.entity_class)?;
    if declaration.actions.is_empty() {
        return Err(AuthError::configuration(format!(
            "predicate row-level policy for '{}' declares no actions",
            entity_name
        )));
    }

    let predicate = (declaration.factory)()
        .map_err(|e| {
            AuthError::configuration(format!(
                "predicate row-level policy for '{}' could not be created: {}",
                entity_name, e
            ))
        })?
        .normalize();

    Ok(declaration
        .actions
        .iter()
        .map(|action| RowLevelPolicy::predicate(entity_name.clone(), *action, predicate.clone()))
        .collect())
}
