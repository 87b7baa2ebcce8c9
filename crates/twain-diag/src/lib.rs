//! Diagnostics for twain scopes.
//!
//! Modeled failures travel as the `Left` payload of an `Either` and never
//! show up here. This crate covers the other two kinds of failure: a
//! success dispatch that no case matched, and contract violations in the
//! write-once discipline of a scope (an outcome declared twice, a slot read
//! before it was written, an abort token handed to the wrong scope).
//!
//! Diagnostics are created by `twain-scope` and either returned to the
//! caller or raised with [`raise`].

use std::fmt;
use std::panic::Location;

// ---------------------------------------------------------------------------
// Diagnostic severity and categories
// ---------------------------------------------------------------------------

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The caller's match was not exhaustive. Reported, never retried.
    Error,
    /// The scope itself was misused. Always raised immediately.
    Fatal,
}

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Success dispatch: no case accepted the payload.
    NonExhaustive,
    /// An outcome was declared after the scope already had one.
    DoubleOutcome,
    /// The result slot was read before anything was written to it.
    MissingOutcome,
    /// The result slot was read a second time.
    ConsumedSlot,
    /// An abort token produced by one scope was returned from another.
    ForeignAbort,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::NonExhaustive,
        Category::DoubleOutcome,
        Category::MissingOutcome,
        Category::ConsumedSlot,
        Category::ForeignAbort,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::NonExhaustive => "non_exhaustive",
            Category::DoubleOutcome => "double_outcome",
            Category::MissingOutcome => "missing_outcome",
            Category::ConsumedSlot => "consumed_slot",
            Category::ForeignAbort => "foreign_abort",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::NonExhaustive => "E0101",
            Category::DoubleOutcome => "E0102",
            Category::MissingOutcome => "E0103",
            Category::ConsumedSlot => "E0104",
            Category::ForeignAbort => "E0105",
        }
    }

    /// Severity a diagnostic of this category is reported with.
    pub fn severity(self) -> Severity {
        match self {
            Category::NonExhaustive => Severity::Error,
            Category::DoubleOutcome
            | Category::MissingOutcome
            | Category::ConsumedSlot
            | Category::ForeignAbort => Severity::Fatal,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::NonExhaustive => "No dispatch case accepts the success payload.",
            Category::DoubleOutcome => "A scope was used, or returned normally, after it aborted.",
            Category::MissingOutcome => "A scope finished without declaring any outcome.",
            Category::ConsumedSlot => "A scope outcome was read more than once.",
            Category::ForeignAbort => "A scope returned an abort produced by another scope.",
        }
    }

    pub fn example_fix(self) -> &'static str {
        match self {
            Category::NonExhaustive => "Register a case for the payload type or add `otherwise`.",
            Category::DoubleOutcome => {
                "Propagate the abort with `?` instead of discarding it."
            }
            Category::MissingOutcome => "Return the abort you received, not a fresh one.",
            Category::ConsumedSlot => "Finish each scope exactly once.",
            Category::ForeignAbort => {
                "Handle a nested scope's result as an `Either` instead of forwarding its abort."
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Source locations
// ---------------------------------------------------------------------------

/// The Rust source position a diagnostic was raised from.
///
/// Scope operations are `#[track_caller]`, so this points at the user's
/// step sequence rather than at twain internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. E0101).
    pub code: Option<String>,
    pub severity: Severity,
    pub category: Category,
    /// Primary message: what went wrong.
    pub message: String,
    /// Where it went wrong.
    pub location: Option<SourceLocation>,
    /// Scope label the diagnostic belongs to, if any.
    pub scope: Option<String>,
    /// Suggested fix, if any.
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            code: Some(category.code().to_string()),
            severity: category.severity(),
            category,
            message: message.into(),
            location: None,
            scope: None,
            help: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn in_scope(mut self, label: impl Into<String>) -> Self {
        self.scope = Some(label.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach the category's stock fix as help text.
    pub fn with_default_help(self) -> Self {
        let help = self.category.example_fix();
        self.with_help(help)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        if let Some(code) = &self.code {
            write!(f, "{prefix}[{code}]: {}", self.message)?;
        } else {
            write!(f, "{prefix}: {}", self.message)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, "\n  in scope `{scope}`")?;
        }
        if let Some(location) = &self.location {
            write!(f, "\n  --> {location}")?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error type for crates that produce diagnostics
// ---------------------------------------------------------------------------

/// Error type wrapping one or more diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.first().map(|d| d.to_string()).unwrap_or_default())]
pub struct DiagnosticError(pub Vec<Diagnostic>);

impl DiagnosticError {
    pub fn single(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }

    /// Category of the first diagnostic.
    pub fn category(&self) -> Option<Category> {
        self.0.first().map(|d| d.category)
    }
}

/// Report a diagnostic as a panic.
///
/// The panic message is the rendered diagnostic, so it starts with the
/// severity and the stable code.
#[cold]
#[track_caller]
pub fn raise(diag: Diagnostic) -> ! {
    panic!("{diag}")
}
