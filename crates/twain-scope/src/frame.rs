//! State shared by every scope kind: identity, label, trace and reporting.

use std::borrow::Cow;
use std::cell::Cell;

use twain_diag::{Category, Diagnostic, SourceLocation, raise};

use crate::trace::{ScopeAction, ScopeKind, ScopeStep, Tracer};
use crate::{Abort, ScopeConfig, ScopeId};

#[derive(Debug)]
pub(crate) struct Frame {
    id: ScopeId,
    kind: ScopeKind,
    label: Cow<'static, str>,
    tracer: Tracer,
    violated: Cell<bool>,
}

impl Frame {
    pub(crate) fn open(config: &ScopeConfig, kind: ScopeKind) -> Self {
        let id = ScopeId::fresh();
        tracing::trace!(scope = %config.label, id = id.as_u64(), kind = kind.as_str(), "scope opened");
        Self {
            id,
            kind,
            label: config.label.clone(),
            tracer: Tracer::new(kind, config.trace),
            violated: Cell::new(false),
        }
    }

    /// Whether this scope has reported a contract violation.
    pub(crate) fn violated(&self) -> bool {
        self.violated.get()
    }

    pub(crate) fn abort(&self) -> Abort {
        Abort { scope: self.id }
    }

    pub(crate) fn record(&mut self, action: ScopeAction, detail: impl FnOnce() -> String) {
        tracing::trace!(
            scope = %self.label,
            id = self.id.as_u64(),
            kind = self.kind.as_str(),
            action = action.as_str(),
            "scope step"
        );
        self.tracer.record(action, detail);
    }

    /// Log how the scope ended and hand back its trace.
    pub(crate) fn close(self, outcome: &'static str) -> Vec<ScopeStep> {
        tracing::debug!(
            scope = %self.label,
            id = self.id.as_u64(),
            kind = self.kind.as_str(),
            outcome,
            "scope finished"
        );
        self.tracer.into_steps()
    }

    /// Reject an abort token that some other scope produced.
    #[track_caller]
    pub(crate) fn check_abort(&self, abort: Abort) {
        if abort.scope != self.id {
            self.violation(
                Category::ForeignAbort,
                format!(
                    "scope {} received the abort of scope {}",
                    self.id,
                    abort.scope()
                ),
            );
        }
    }

    /// Build a diagnostic tagged with this scope and the caller's location.
    #[track_caller]
    pub(crate) fn diagnostic(&self, category: Category, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(category, message)
            .in_scope(self.label.clone())
            .at(SourceLocation::caller())
            .with_default_help()
    }

    /// Report a broken scope contract. Never returns.
    #[cold]
    #[track_caller]
    pub(crate) fn violation(&self, category: Category, message: impl Into<String>) -> ! {
        let diag = self.diagnostic(category, message);
        self.violated.set(true);
        tracing::error!(
            scope = %self.label,
            id = self.id.as_u64(),
            code = category.code(),
            "scope contract violated"
        );
        raise(diag)
    }
}
