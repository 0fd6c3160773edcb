//! Per-authority policy indices.
//!
//! An index is built once from an authority's merged policies and never
//! mutated afterwards. Authorities publish their indices through `OnceLock`,
//! so concurrent readers either see no index yet or a complete one.

use std::collections::HashMap;

use crate::model::{ResourcePolicy, ResourcePolicyType, RowLevelPolicy};

/// Resource policies grouped by `(type, resource)`.
#[derive(Debug, Default)]
pub struct ResourcePolicyIndex {
    by_resource: HashMap<ResourcePolicyType, HashMap<String, Vec<ResourcePolicy>>>,
}

impl ResourcePolicyIndex {
    /// Builds the index.
    #[must_use]
    pub fn build<'a>(policies: impl IntoIterator<Item = &'a ResourcePolicy>) -> Self {
        let mut by_resource: HashMap<ResourcePolicyType, HashMap<String, Vec<ResourcePolicy>>> =
            HashMap::new();
        for policy in policies {
            by_resource
                .entry(policy.policy_type)
                .or_default()
                .entry(policy.resource.clone())
                .or_default()
                .push(policy.clone());
        }
        Self { by_resource }
    }

    /// Policies of `policy_type` for exactly `resource`.
    #[must_use]
    pub fn get(&self, policy_type: ResourcePolicyType, resource: &str) -> &[ResourcePolicy] {
        self.by_resource
            .get(&policy_type)
            .and_then(|resources| resources.get(resource))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct resources indexed for `policy_type`.
    #[must_use]
    pub fn resource_count(&self, policy_type: ResourcePolicyType) -> usize {
        self.by_resource
            .get(&policy_type)
            .map_or(0, HashMap::len)
    }
}

/// Row-level policies grouped by entity name.
#[derive(Debug, Default)]
pub struct RowLevelPolicyIndex {
    by_entity: HashMap<String, Vec<RowLevelPolicy>>,
}

impl RowLevelPolicyIndex {
    /// Builds the index.
    #[must_use]
    pub fn build<'a>(policies: impl IntoIterator<Item = &'a RowLevelPolicy>) -> Self {
        let mut by_entity: HashMap<String, Vec<RowLevelPolicy>> = HashMap::new();
        for policy in policies {
            by_entity
                .entry(policy.entity_name.clone())
                .or_default()
                .push(policy.clone());
        }
        Self { by_entity }
    }

    /// Policies for `entity_name`.
    #[must_use]
    pub fn get(&self, entity_name: &str) -> &[RowLevelPolicy] {
        self.by_entity
            .get(entity_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
