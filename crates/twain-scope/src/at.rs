//! Success dispatch by runtime type.
//!
//! The success payload is type-erased as a `Box<dyn Payload>`. Cases are
//! tried in the order the step sequence registers them; the first case whose
//! type matches the payload takes it, and its handler's result becomes the
//! `Right` of the scope. A `Left` input never enters the scope.
//!
//! No matching case is the caller's bug, reported as a
//! [`Category::NonExhaustive`] diagnostic naming the payload.

use std::any::{Any, type_name};
use std::fmt;

use twain_diag::{Category, DiagnosticError, raise};
use twain_either::{Either, Left, Right};

use crate::frame::Frame;
use crate::slot::Slot;
use crate::trace::{ScopeAction, ScopeKind, Traced};
use crate::{Abort, ScopeConfig, Step};

/// A type-erased success payload that can still be printed.
///
/// Implemented for every `Any + Debug` type.
pub trait Payload: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Name of the concrete type behind the payload.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

impl dyn Payload {
    pub fn is<A: Any>(&self) -> bool {
        self.as_any().is::<A>()
    }

    pub fn downcast_ref<A: Any>(&self) -> Option<&A> {
        self.as_any().downcast_ref::<A>()
    }
}

/// Erase a value for dispatch.
///
/// Passing a `Box<dyn Payload>` here boxes it again, and dispatch would
/// then see the box, not the value inside.
pub fn boxed<P: Payload>(value: P) -> Box<dyn Payload> {
    Box::new(value)
}

type Handler<'a, R> = Box<dyn FnOnce() -> R + 'a>;

/// Handle given to a success dispatch step sequence.
pub struct AtScope<'a, R> {
    frame: Frame,
    payload: Option<Box<dyn Payload>>,
    closure: Slot<Handler<'a, R>>,
}

impl<R> fmt::Debug for AtScope<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtScope")
            .field("frame", &self.frame)
            .field("payload", &self.payload)
            .field("matched", &self.closure.is_written())
            .finish()
    }
}

impl<'a, R> AtScope<'a, R> {
    fn open(config: &ScopeConfig, payload: Box<dyn Payload>) -> Self {
        Self {
            frame: Frame::open(config, ScopeKind::At),
            payload: Some(payload),
            closure: Slot::new(),
        }
    }

    /// Case for payloads of type `A`. On a match the payload moves into
    /// `handler` and the scope aborts; otherwise the next case is tried.
    #[track_caller]
    pub fn at<A, F>(&mut self, handler: F) -> Step<()>
    where
        A: Any,
        F: FnOnce(A) -> R + 'a,
    {
        self.ensure_running();
        match self.payload.take() {
            Some(payload) if (*payload).is::<A>() => {
                let Ok(value) = payload.into_any().downcast::<A>() else {
                    unreachable!("payload type was checked before downcasting")
                };
                self.frame
                    .record(ScopeAction::GuardAccepted, || type_name::<A>().to_string());
                Err(self.declare(Box::new(move || handler(*value))))
            }
            payload => {
                self.payload = payload;
                self.frame
                    .record(ScopeAction::GuardRejected, || type_name::<A>().to_string());
                Ok(())
            }
        }
    }

    /// Catch-all case taking whatever payload no earlier case matched.
    #[track_caller]
    pub fn otherwise<F>(&mut self, handler: F) -> Abort
    where
        F: FnOnce(Box<dyn Payload>) -> R + 'a,
    {
        self.ensure_running();
        match self.payload.take() {
            Some(payload) => {
                self.frame
                    .record(ScopeAction::GuardAccepted, || "otherwise".to_string());
                self.declare(Box::new(move || handler(payload)))
            }
            None => self
                .frame
                .violation(Category::ConsumedSlot, "the payload was already taken"),
        }
    }

    #[track_caller]
    fn ensure_running(&self) {
        if self.closure.is_written() {
            self.frame.violation(
                Category::DoubleOutcome,
                "a case was registered after an earlier case matched",
            );
        }
    }

    #[track_caller]
    fn declare(&mut self, handler: Handler<'a, R>) -> Abort {
        if let Err(category) = self.closure.write(handler) {
            self.frame.violation(category, "a second case matched");
        }
        self.frame.record(ScopeAction::Abort, || "matched".to_string());
        self.frame.abort()
    }

    #[track_caller]
    fn finish(mut self, outcome: Step<()>) -> Result<Traced<R>, DiagnosticError> {
        match outcome {
            Err(abort) => {
                self.frame.check_abort(abort);
                let handler = match self.closure.take() {
                    Ok(handler) => handler,
                    Err(category) => self
                        .frame
                        .violation(category, "the scope aborted without a matching case"),
                };
                let value = handler();
                self.frame.record(ScopeAction::Complete, String::new);
                Ok(Traced {
                    value,
                    trace: self.frame.close("right"),
                })
            }
            Ok(()) if self.closure.is_written() => self.frame.violation(
                Category::DoubleOutcome,
                "the step sequence returned normally after a case matched",
            ),
            Ok(()) => {
                let message = match self.payload.as_deref() {
                    Some(payload) => format!(
                        "no `at` case matches {payload:?} of type `{}`",
                        payload.type_name()
                    ),
                    None => "no `at` case matches the payload".to_string(),
                };
                let diag = self.frame.diagnostic(Category::NonExhaustive, message);
                self.frame.close("non_exhaustive");
                Err(DiagnosticError::single(diag))
            }
        }
    }
}

/// Dispatch a success payload to the first case that accepts its type,
/// returning the non-exhaustive diagnostic instead of raising it.
#[track_caller]
pub fn try_dispatch_on_success_with<'a, L, R, F>(
    config: &ScopeConfig,
    either: Either<L, Box<dyn Payload>>,
    steps: F,
) -> Result<Traced<Either<L, R>>, DiagnosticError>
where
    F: FnOnce(&mut AtScope<'a, R>) -> Step<()>,
{
    match either {
        Left(err) => Ok(Traced::untraced(Left(err))),
        Right(payload) => {
            let mut scope = AtScope::open(config, payload);
            let outcome = steps(&mut scope);
            Ok(scope.finish(outcome)?.map(Right))
        }
    }
}

#[track_caller]
pub fn try_dispatch_on_success<'a, L, R, F>(
    either: Either<L, Box<dyn Payload>>,
    steps: F,
) -> Result<Either<L, R>, DiagnosticError>
where
    F: FnOnce(&mut AtScope<'a, R>) -> Step<()>,
{
    try_dispatch_on_success_with(&ScopeConfig::default(), either, steps).map(Traced::into_value)
}

/// [`dispatch_on_success`] with an explicit configuration.
#[track_caller]
pub fn dispatch_on_success_with<'a, L, R, F>(
    config: &ScopeConfig,
    either: Either<L, Box<dyn Payload>>,
    steps: F,
) -> Traced<Either<L, R>>
where
    F: FnOnce(&mut AtScope<'a, R>) -> Step<()>,
{
    match try_dispatch_on_success_with(config, either, steps) {
        Ok(traced) => traced,
        Err(err) => raise_first(err),
    }
}

/// Dispatch a success payload to the first case that accepts its type.
///
/// Panics with a non-exhaustive diagnostic if no case matches.
#[track_caller]
pub fn dispatch_on_success<'a, L, R, F>(either: Either<L, Box<dyn Payload>>, steps: F) -> Either<L, R>
where
    F: FnOnce(&mut AtScope<'a, R>) -> Step<()>,
{
    dispatch_on_success_with(&ScopeConfig::default(), either, steps).value
}

#[track_caller]
fn raise_first(err: DiagnosticError) -> ! {
    match err.0.into_iter().next() {
        Some(diag) => raise(diag),
        None => panic!("dispatch failed without a diagnostic"),
    }
}

/// Dispatch the success payload of an erased `Either`.
pub trait PolyMapExt<L> {
    fn poly_map<'a, R, F>(self, steps: F) -> Either<L, R>
    where
        F: FnOnce(&mut AtScope<'a, R>) -> Step<()>;
}

impl<L> PolyMapExt<L> for Either<L, Box<dyn Payload>> {
    #[track_caller]
    fn poly_map<'a, R, F>(self, steps: F) -> Either<L, R>
    where
        F: FnOnce(&mut AtScope<'a, R>) -> Step<()>,
    {
        dispatch_on_success(self, steps)
    }
}
