//! Step traces for scope observability.
//!
//! A scope opened with [`ScopeConfig::trace`](crate::ScopeConfig) records
//! every decision it makes: which binds passed, which guards rejected the
//! value, where it aborted. Tracing is opt-in; when disabled no detail
//! string is ever built.

use serde::Serialize;

/// Which builder produced a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Sequential,
    At,
    Recover,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Sequential => "sequential",
            ScopeKind::At => "at",
            ScopeKind::Recover => "recover",
        }
    }
}

/// What happened during a scope step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeAction {
    /// A `Right` was bound and its payload handed back.
    Bind,
    /// A guard condition held; the sequence continues.
    Ensure,
    /// An outcome was declared and the sequence must stop.
    Abort,
    /// The scope read its outcome.
    Complete,
    /// A dispatch case did not accept the value.
    GuardRejected,
    /// A dispatch case accepted the value.
    GuardAccepted,
    /// A recovery handler produced a success.
    Recovered,
    /// A recovery handler panicked.
    HandlerRaised,
    /// The recovery step sequence itself panicked.
    StepsRaised,
    /// No recovery case matched; the failure is returned unchanged.
    PassThrough,
}

impl ScopeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeAction::Bind => "bind",
            ScopeAction::Ensure => "ensure",
            ScopeAction::Abort => "abort",
            ScopeAction::Complete => "complete",
            ScopeAction::GuardRejected => "guard_rejected",
            ScopeAction::GuardAccepted => "guard_accepted",
            ScopeAction::Recovered => "recovered",
            ScopeAction::HandlerRaised => "handler_raised",
            ScopeAction::StepsRaised => "steps_raised",
            ScopeAction::PassThrough => "pass_through",
        }
    }
}

/// A single recorded step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeStep {
    pub step: usize,
    pub kind: ScopeKind,
    pub action: ScopeAction,
    pub detail: String,
}

/// A scope result together with the steps recorded while producing it.
///
/// `trace` is empty unless tracing was enabled, or when the scope was never
/// entered (a `Left` given to success dispatch, a `Right` given to recovery).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Traced<T> {
    pub value: T,
    pub trace: Vec<ScopeStep>,
}

impl<T> Traced<T> {
    pub fn untraced(value: T) -> Self {
        Self {
            value,
            trace: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Traced<U> {
        Traced {
            value: f(self.value),
            trace: self.trace,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Actions in the order they were recorded.
    pub fn actions(&self) -> Vec<ScopeAction> {
        self.trace.iter().map(|step| step.action).collect()
    }
}

/// Step recorder owned by one scope frame.
#[derive(Debug)]
pub(crate) struct Tracer {
    kind: ScopeKind,
    steps: Option<Vec<ScopeStep>>,
}

impl Tracer {
    pub(crate) fn new(kind: ScopeKind, enabled: bool) -> Self {
        Self {
            kind,
            steps: enabled.then(Vec::new),
        }
    }

    pub(crate) fn record(&mut self, action: ScopeAction, detail: impl FnOnce() -> String) {
        if let Some(steps) = &mut self.steps {
            steps.push(ScopeStep {
                step: steps.len(),
                kind: self.kind,
                action,
                detail: detail(),
            });
        }
    }

    pub(crate) fn into_steps(self) -> Vec<ScopeStep> {
        self.steps.unwrap_or_default()
    }
}
