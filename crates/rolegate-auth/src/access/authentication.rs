//! The authenticated principal and access to it.
//!
//! Policy stores never hold an [`Authentication`] directly. They ask a
//! [`CurrentAuthentication`] source on every query, so the host decides how
//! the principal is scoped (per request, per task, process-wide).

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::Value;

use crate::access::authority::RoleGrantedAuthority;
use crate::model::PredicateContext;

// =============================================================================
// Authorities
// =============================================================================

/// An authority granted to a principal.
#[derive(Debug, Clone)]
pub enum GrantedAuthority {
    /// A plain named authority with no policy data.
    Simple(String),

    /// An authority carrying resolved role policies.
    Role(Arc<RoleGrantedAuthority>),
}

impl GrantedAuthority {
    /// Authority name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(name) => name,
            Self::Role(role) => role.authority(),
        }
    }

    /// Returns the role authority, if this is one.
    #[must_use]
    pub fn as_role(&self) -> Option<&Arc<RoleGrantedAuthority>> {
        match self {
            Self::Role(role) => Some(role),
            Self::Simple(_) => None,
        }
    }
}

impl From<RoleGrantedAuthority> for GrantedAuthority {
    fn from(authority: RoleGrantedAuthority) -> Self {
        Self::Role(Arc::new(authority))
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Client details attached to an authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDetails {
    client_id: Option<String>,
    scope: Option<String>,
}

impl ClientDetails {
    #[must_use]
    pub fn new(client_id: impl Into<String>, scope: Option<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            scope,
        }
    }

    /// Client details with only a scope.
    #[must_use]
    pub fn with_scope(scope: impl Into<String>) -> Self {
        Self {
            client_id: None,
            scope: Some(scope.into()),
        }
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Authentication scope, e.g. `UI` or `API`.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// An authenticated principal.
#[derive(Debug, Clone)]
pub struct Authentication {
    pub username: String,
    pub authorities: Vec<GrantedAuthority>,
    pub details: Option<ClientDetails>,

    /// Extra values exposed to row-level predicates.
    pub attributes: HashMap<String, Value>,
}

impl Authentication {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authorities: Vec::new(),
            details: None,
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<GrantedAuthority>) -> Self {
        self.authorities.push(authority.into());
        self
    }

    #[must_use]
    pub fn with_authorities(mut self, authorities: impl IntoIterator<Item = GrantedAuthority>) -> Self {
        self.authorities.extend(authorities);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: ClientDetails) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Authentication scope from the client details.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.details.as_ref().and_then(ClientDetails::scope)
    }

    /// Role authorities that carry policy data and apply to the current scope.
    pub fn applicable_authorities(&self) -> impl Iterator<Item = &Arc<RoleGrantedAuthority>> {
        let scope = self.scope();
        self.authorities
            .iter()
            .filter_map(GrantedAuthority::as_role)
            .filter(move |a| a.has_policies() && a.applies_to_scope(scope))
    }

    /// Returns `true` if an authority with `name` was granted.
    #[must_use]
    pub fn has_authority(&self, name: &str) -> bool {
        self.authorities.iter().any(|a| a.name() == name)
    }

    /// Context handed to row-level predicates.
    #[must_use]
    pub fn predicate_context(&self) -> PredicateContext {
        let mut context = PredicateContext::for_user(self.username.clone());
        context.attributes = self.attributes.clone();
        context
    }
}

// =============================================================================
// Current Authentication
// =============================================================================

/// Source of the principal for the current unit of work.
pub trait CurrentAuthentication: Send + Sync {
    /// The current principal, or `None` when unauthenticated.
    fn authentication(&self) -> Option<Arc<Authentication>>;
}

/// Lock-free holder for the current principal.
#[derive(Debug, Default)]
pub struct AuthenticationHolder {
    current: ArcSwapOption<Authentication>,
}

impl AuthenticationHolder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a holder set to `authentication`.
    #[must_use]
    pub fn authenticated(authentication: Authentication) -> Self {
        let holder = Self::new();
        holder.set(authentication);
        holder
    }

    /// Replaces the current principal.
    pub fn set(&self, authentication: Authentication) {
        self.current.store(Some(Arc::new(authentication)));
    }

    /// Removes the current principal.
    pub fn clear(&self) {
        self.current.store(None);
    }
}

impl CurrentAuthentication for AuthenticationHolder {
    fn authentication(&self) -> Option<Arc<Authentication>> {
        self.current.load_full()
    }
}
