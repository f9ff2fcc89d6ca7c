//! Capture sets and storage locations

use serde::{Deserialize, Serialize};

use super::{BindingId, ScopeId};
use crate::shared::models::DeclId;

/// One captured outer identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub name: String,
    pub declaring_scope: ScopeId,
    pub binding: BindingId,
    /// Fresh binding per loop iteration
    pub per_iteration: bool,
    /// `%parent` links followed from `%closures`
    pub hops: u32,
}

/// Ordered capture set of one function (first reference first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSet {
    pub function: DeclId,
    pub captures: Vec<Capture>,
}

impl CaptureSet {
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.captures.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.captures.iter().any(|c| c.name == name)
    }
}

/// Where a binding lives, as seen from one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Module-level binding or unresolved free name
    Global(String),
    /// Plain local of the current function
    Local(String),
    /// Field of an environment created by the current function
    Env { env_local: String, field: String },
    /// Field of an outer environment: `%closures` then `hops` × `%parent`
    Captured { hops: u32, field: String },
}

/// Reference to an environment value from inside a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvRef {
    Local(String),
    Closures,
}

/// Parent link written when an environment is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParent {
    None,
    Env(String),
    Closures,
}

impl EnvParent {
    pub fn as_env_ref(&self) -> Option<EnvRef> {
        match self {
            EnvParent::None => None,
            EnvParent::Env(local) => Some(EnvRef::Local(local.clone())),
            EnvParent::Closures => Some(EnvRef::Closures),
        }
    }
}
