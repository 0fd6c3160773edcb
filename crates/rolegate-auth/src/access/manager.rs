//! Constraint registry keyed by context type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::access::authentication::CurrentAuthentication;
use crate::access::constraint::{
    AccessConstraint, CrudEntityConstraint, EntityAttributeConstraint, GraphQlConstraint,
    InMemoryCrudEntityConstraint, MenuItemAccessConstraint, ReadEntityQueryConstraint,
    SpecificOperationConstraint, ViewAccessConstraint,
};
use crate::access::context::{
    CrudEntityContext, EntityAttributeContext, GraphQlAccessContext, InMemoryCrudEntityContext,
    MenuItemAccessContext, ReadEntityQueryContext, SpecificOperationAccessContext,
    ViewAccessContext,
};
use crate::access::decision::AccessDecisions;
use crate::policy::RowLevelPolicyStore;

type ConstraintChain<C> = Vec<Arc<dyn AccessConstraint<C>>>;

/// Applies registered constraint chains to access contexts.
///
/// Constraints run in registration order; each sees the context as left by
/// the previous one.
#[derive(Default)]
pub struct AccessManager {
    chains: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl AccessManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with the built-in constraint for every context type.
    #[must_use]
    pub fn with_default_constraints(
        decisions: AccessDecisions,
        row_level: RowLevelPolicyStore,
        current: Arc<dyn CurrentAuthentication>,
    ) -> Self {
        let mut manager = Self::new();
        manager.register::<ViewAccessContext>(Arc::new(ViewAccessConstraint::new(
            decisions.clone(),
        )));
        manager.register::<MenuItemAccessContext>(Arc::new(MenuItemAccessConstraint::new(
            decisions.clone(),
        )));
        manager.register::<CrudEntityContext>(Arc::new(CrudEntityConstraint::new(
            decisions.clone(),
        )));
        manager.register::<EntityAttributeContext>(Arc::new(EntityAttributeConstraint::new(
            decisions.clone(),
        )));
        manager.register::<SpecificOperationAccessContext>(Arc::new(
            SpecificOperationConstraint::new(decisions.clone()),
        ));
        manager.register::<GraphQlAccessContext>(Arc::new(GraphQlConstraint::new(decisions)));
        manager.register::<ReadEntityQueryContext>(Arc::new(ReadEntityQueryConstraint::new(
            row_level.clone(),
        )));
        manager.register::<InMemoryCrudEntityContext>(Arc::new(
            InMemoryCrudEntityConstraint::new(row_level, current),
        ));
        manager
    }

    /// Appends a constraint to the chain for context type `C`.
    pub fn register<C: 'static>(&mut self, constraint: Arc<dyn AccessConstraint<C>>) {
        let chain = self
            .chains
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(ConstraintChain::<C>::new()));
        if let Some(chain) = chain.downcast_mut::<ConstraintChain<C>>() {
            chain.push(constraint);
            debug!(
                context = std::any::type_name::<C>(),
                constraints = chain.len(),
                "Registered access constraint"
            );
        }
    }

    /// Number of constraints registered for context type `C`.
    #[must_use]
    pub fn constraint_count<C: 'static>(&self) -> usize {
        self.chain::<C>().map_or(0, Vec::len)
    }

    /// Runs the registered chain for `C` over `context`.
    pub fn apply_registered_constraints<C: 'static>(&self, context: &mut C) {
        if let Some(chain) = self.chain::<C>() {
            for constraint in chain {
                constraint.apply_to(context);
            }
        }
    }

    /// Runs the registered chain, then `extra` constraints.
    pub fn apply_constraints<C: 'static>(
        &self,
        context: &mut C,
        extra: &[Arc<dyn AccessConstraint<C>>],
    ) {
        self.apply_registered_constraints(context);
        for constraint in extra {
            constraint.apply_to(context);
        }
    }

    fn chain<C: 'static>(&self) -> Option<&ConstraintChain<C>> {
        self.chains
            .get(&TypeId::of::<C>())
            .and_then(|chain| chain.downcast_ref::<ConstraintChain<C>>())
    }
}
