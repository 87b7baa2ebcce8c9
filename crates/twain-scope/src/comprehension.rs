//! Sequential short-circuit scope.
//!
//! ```
//! use twain_either::{Either, Left, Right};
//! use twain_scope::run_sequential_scope;
//!
//! let total: Either<&str, i32> = run_sequential_scope(|s| {
//!     let a = s.bind(Right(1))?;
//!     let b = s.bind(Right(2))?;
//!     s.ensure(a + b < 10, || "too large")?;
//!     Ok(a + b)
//! });
//! assert_eq!(total, Right(3));
//!
//! let failed: Either<&str, i32> = run_sequential_scope(|s| {
//!     let a: i32 = s.bind(Left("boom"))?;
//!     Ok(a + 1)
//! });
//! assert_eq!(failed, Left("boom"));
//! ```

use twain_diag::Category;
use twain_either::{Either, Left, Right};

use crate::frame::Frame;
use crate::slot::Slot;
use crate::trace::{ScopeAction, ScopeKind, Traced};
use crate::{Abort, ScopeConfig, Step};

/// Handle given to a sequential step sequence.
///
/// The first `Left` bound, or the first outcome declared, is the scope's
/// result. Returning `Ok(value)` from the step sequence declares
/// `Right(value)`.
#[derive(Debug)]
pub struct Comprehension<L, R> {
    frame: Frame,
    slot: Slot<Either<L, R>>,
}

impl<L, R> Comprehension<L, R> {
    fn open(config: &ScopeConfig) -> Self {
        Self {
            frame: Frame::open(config, ScopeKind::Sequential),
            slot: Slot::new(),
        }
    }

    /// Hand back the payload of a `Right`, or abort with a `Left`.
    #[track_caller]
    pub fn bind<T>(&mut self, either: Either<L, T>) -> Step<T> {
        self.ensure_running();
        match either {
            Right(value) => {
                self.frame.record(ScopeAction::Bind, || "right".to_string());
                Ok(value)
            }
            Left(err) => Err(self.declare(Left(err))),
        }
    }

    /// Bind every item in order. The first `Left` aborts and later items are
    /// not looked at.
    #[track_caller]
    pub fn bind_all<T, I>(&mut self, items: I) -> Step<Vec<T>>
    where
        I: IntoIterator<Item = Either<L, T>>,
    {
        let mut values = Vec::new();
        for item in items {
            values.push(self.bind(item)?);
        }
        Ok(values)
    }

    /// Declare `Left(err)` as the outcome.
    #[track_caller]
    pub fn yield_left(&mut self, err: L) -> Abort {
        self.declare(Left(err))
    }

    /// Declare `Right(value)` as the outcome without running the rest of
    /// the sequence.
    #[track_caller]
    pub fn yield_right(&mut self, value: R) -> Abort {
        self.declare(Right(value))
    }

    /// Abort with `failure()` unless `condition` holds.
    #[track_caller]
    pub fn ensure(&mut self, condition: bool, failure: impl FnOnce() -> L) -> Step<()> {
        self.ensure_running();
        if condition {
            self.frame.record(ScopeAction::Ensure, || "held".to_string());
            Ok(())
        } else {
            Err(self.declare(Left(failure())))
        }
    }

    /// Abort with `failure()` if `condition` holds.
    #[track_caller]
    pub fn ensure_not(&mut self, condition: bool, failure: impl FnOnce() -> L) -> Step<()> {
        self.ensure(!condition, failure)
    }

    #[track_caller]
    fn ensure_running(&self) {
        if self.slot.is_written() {
            self.frame.violation(
                Category::DoubleOutcome,
                "the step sequence kept running after the scope aborted",
            );
        }
    }

    #[track_caller]
    fn declare(&mut self, outcome: Either<L, R>) -> Abort {
        let side = if outcome.is_left() { "left" } else { "right" };
        if let Err(category) = self.slot.write(outcome) {
            self.frame
                .violation(category, format!("a {side} outcome was declared after the scope aborted"));
        }
        self.frame.record(ScopeAction::Abort, || side.to_string());
        self.frame.abort()
    }

    #[track_caller]
    fn finish(mut self, outcome: Step<R>) -> Traced<Either<L, R>> {
        match outcome {
            Ok(value) => {
                if let Err(category) = self.slot.write(Right(value)) {
                    self.frame.violation(
                        category,
                        "the step sequence returned normally after the scope aborted",
                    );
                }
            }
            Err(abort) => self.frame.check_abort(abort),
        }
        let value = match self.slot.take() {
            Ok(value) => value,
            Err(category) => self
                .frame
                .violation(category, "the scope finished without an outcome"),
        };
        self.frame.record(ScopeAction::Complete, String::new);
        let side = if value.is_left() { "left" } else { "right" };
        Traced {
            value,
            trace: self.frame.close(side),
        }
    }
}

/// Run a step sequence and return its first failure or its result.
///
/// Panics raised by the step sequence propagate to the caller.
#[track_caller]
pub fn run_sequential_scope<L, R, F>(steps: F) -> Either<L, R>
where
    F: FnOnce(&mut Comprehension<L, R>) -> Step<R>,
{
    run_sequential_scope_with(&ScopeConfig::default(), steps).value
}

/// [`run_sequential_scope`] with an explicit configuration.
#[track_caller]
pub fn run_sequential_scope_with<L, R, F>(config: &ScopeConfig, steps: F) -> Traced<Either<L, R>>
where
    F: FnOnce(&mut Comprehension<L, R>) -> Step<R>,
{
    let mut scope = Comprehension::open(config);
    let outcome = steps(&mut scope);
    scope.finish(outcome)
}

/// Continue an `Either` with a sequential scope.
pub trait FxExt<L, R> {
    /// Run `steps` on the success payload; a `Left` is returned without
    /// entering a scope.
    fn fx<T, F>(self, steps: F) -> Either<L, T>
    where
        F: FnOnce(&mut Comprehension<L, T>, R) -> Step<T>;
}

impl<L, R> FxExt<L, R> for Either<L, R> {
    #[track_caller]
    fn fx<T, F>(self, steps: F) -> Either<L, T>
    where
        F: FnOnce(&mut Comprehension<L, T>, R) -> Step<T>,
    {
        match self {
            Left(err) => Left(err),
            Right(value) => run_sequential_scope(|scope| steps(scope, value)),
        }
    }
}
