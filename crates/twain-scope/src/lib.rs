//! Short-circuit scopes over `Either`.
//!
//! This crate implements:
//! - a sequential comprehension that binds `Either` values and stops at the
//!   first `Left`
//! - success dispatch: pick a handler by the runtime type of a `Right`
//! - failure recovery: pick a handler by the kind of a `Left(Fault)`
//!
//! A scope runs a step sequence, a closure that receives the scope and
//! returns a [`Step`]. Scope operations that end the scope hand back an
//! [`Abort`]; the step sequence returns it through `?`, so nothing after the
//! abort point runs. The outcome travels through a write-once slot owned by
//! the scope invocation, and misuse of that slot is a fatal diagnostic
//! (see `twain-diag`).

pub mod at;
pub mod comprehension;
pub mod config;
pub mod recover;
pub mod trace;

mod frame;
mod slot;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub use at::{
    AtScope, Payload, PolyMapExt, boxed, dispatch_on_success, dispatch_on_success_with,
    try_dispatch_on_success, try_dispatch_on_success_with,
};
pub use comprehension::{Comprehension, FxExt, run_sequential_scope, run_sequential_scope_with};
pub use config::ScopeConfig;
pub use recover::{RecoverExt, RecoverScope, recover_failure, recover_failure_with};
pub use trace::{ScopeAction, ScopeKind, ScopeStep, Traced};

/// Source of scope ids. Every scope invocation takes the next value, so two
/// scopes never share an id within a process.
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of one scope invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(u64);

impl ScopeId {
    fn fresh() -> Self {
        Self(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Proof that a scope has its outcome and the step sequence must stop.
///
/// Only scope operations create one. Return it from the step sequence,
/// usually through `?`.
#[must_use = "return the abort from the step sequence, usually with `?`"]
#[derive(Debug, PartialEq, Eq)]
pub struct Abort {
    scope: ScopeId,
}

impl Abort {
    /// The scope that produced this abort.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

/// What a step sequence, or a step inside it, returns.
pub type Step<T> = Result<T, Abort>;


#[cfg(test)]
mod scope_tests;
