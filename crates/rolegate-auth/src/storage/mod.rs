//! Role sources.
//!
//! This module defines the [`RoleProvider`] interface consumed by the role
//! repository, plus two reference implementations:
//!
//! - [`InMemoryRoleProvider`] - mutable in-process store (stands in for a
//!   database-backed provider)
//! - [`DeclaredRoleProvider`] - read-only roles built from declarations
//!
//! Providers are handed to the repository as an ordered list; on a code
//! collision the first provider wins.

pub mod declared;
pub mod memory;
pub mod provider;

pub use declared::DeclaredRoleProvider;
pub use memory::InMemoryRoleProvider;
pub use provider::{DynRoleProvider, RoleProvider};
