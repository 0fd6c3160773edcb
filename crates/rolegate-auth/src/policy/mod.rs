//! Role resolution and policy lookup.
//!
//! - [`cache`] - generation-based cache of resolved roles
//! - [`repository`] - hierarchy resolution over ordered providers
//! - [`index`] - per-authority policy indices
//! - [`store`] - policy stores over the current authentication

pub mod cache;
pub mod index;
pub mod repository;
pub mod store;

pub use cache::{CacheGeneration, RoleCache, RoleCacheStats};
pub use index::{ResourcePolicyIndex, RowLevelPolicyIndex};
pub use repository::{ResourceRoleRepository, RoleRepository, RowLevelRoleRepository};
pub use store::{ResourcePolicyStore, RowLevelPolicyStore};
