//! Failure recovery by fault kind.
//!
//! Cases are tried in registration order against the fault of a
//! `Left(Fault)`. The first accepting case's handler turns the failure into
//! a `Right`. Without a match the original `Left` comes back untouched.
//! When the handler itself panics, the new fault is returned with the
//! original attached as its cause; pass-through never attaches anything.
//! A panic in the step sequence, guards included, becomes the returned
//! `Left` on its own, except for contract violations of the scope, which
//! keep unwinding.

use std::any::{Any, type_name};
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use twain_diag::Category;
use twain_either::{Either, Fault, Left, Right};

use crate::frame::Frame;
use crate::slot::Slot;
use crate::trace::{ScopeAction, ScopeKind, Traced};
use crate::{Abort, ScopeConfig, Step};

type Handler<'a, R> = Box<dyn FnOnce(&Fault) -> R + 'a>;

/// Handle given to a recovery step sequence.
pub struct RecoverScope<'a, R> {
    frame: Frame,
    fault: Fault,
    closure: Slot<Handler<'a, R>>,
}

impl<R> fmt::Debug for RecoverScope<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoverScope")
            .field("frame", &self.frame)
            .field("fault", &self.fault)
            .field("matched", &self.closure.is_written())
            .finish()
    }
}

impl<'a, R> RecoverScope<'a, R> {
    fn open(config: &ScopeConfig, fault: Fault) -> Self {
        Self {
            frame: Frame::open(config, ScopeKind::Recover),
            fault,
            closure: Slot::new(),
        }
    }

    /// The failure being recovered.
    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    /// Case for faults of kind `C`.
    #[track_caller]
    pub fn case<C, F>(&mut self, handler: F) -> Step<()>
    where
        C: Error + 'static,
        F: FnOnce(&C) -> R + 'a,
    {
        self.ensure_running();
        if !self.fault.is::<C>() {
            self.frame
                .record(ScopeAction::GuardRejected, || type_name::<C>().to_string());
            return Ok(());
        }
        self.frame
            .record(ScopeAction::GuardAccepted, || type_name::<C>().to_string());
        Err(self.declare(Box::new(move |fault: &Fault| match fault.downcast_ref::<C>() {
            Some(case) => handler(case),
            None => unreachable!("fault kind was checked when the case matched"),
        })))
    }

    /// Case for faults accepted by `guard`.
    #[track_caller]
    pub fn case_where<G, F>(&mut self, guard: G, handler: F) -> Step<()>
    where
        G: FnOnce(&Fault) -> bool,
        F: FnOnce(&Fault) -> R + 'a,
    {
        self.ensure_running();
        if !guard(&self.fault) {
            self.frame
                .record(ScopeAction::GuardRejected, || "predicate".to_string());
            return Ok(());
        }
        self.frame
            .record(ScopeAction::GuardAccepted, || "predicate".to_string());
        Err(self.declare(Box::new(handler)))
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
    fn finish(self, outcome: Step<()>) -> Traced<Either<Fault, R>> {
        let Self {
            mut frame,
            fault,
            mut closure,
        } = self;
        let handler = match outcome {
            Ok(()) if closure.is_written() => frame.violation(
                Category::DoubleOutcome,
                "the step sequence returned normally after a case matched",
            ),
            Ok(()) => {
                frame.record(ScopeAction::PassThrough, || fault.to_string());
                return Traced {
                    value: Left(fault),
                    trace: frame.close("pass_through"),
                };
            }
            Err(abort) => {
                frame.check_abort(abort);
                match closure.take() {
                    Ok(handler) => handler,
                    Err(category) => {
                        frame.violation(category, "the scope aborted without a matching case")
                    }
                }
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler(&fault))) {
            Ok(value) => {
                frame.record(ScopeAction::Recovered, String::new);
                Traced {
                    value: Right(value),
                    trace: frame.close("recovered"),
                }
            }
            Err(payload) => {
                let raised = Fault::from_panic(payload);
                tracing::warn!(
                    original = %fault,
                    raised = %raised,
                    "recovery handler raised a fault"
                );
                frame.record(ScopeAction::HandlerRaised, || raised.to_string());
                Traced {
                    value: Left(raised.with_cause(fault)),
                    trace: frame.close("handler_raised"),
                }
            }
        }
    }

    fn fail(self, payload: Box<dyn Any + Send>) -> Traced<Either<Fault, R>> {
        let Self {
            mut frame, fault, ..
        } = self;
        let raised = Fault::from_panic(payload);
        tracing::warn!(
            original = %fault,
            raised = %raised,
            "recovery step sequence raised a fault"
        );
        frame.record(ScopeAction::StepsRaised, || raised.to_string());
        Traced {
            value: Left(raised),
            trace: frame.close("steps_raised"),
        }
    }
}

/// [`recover_failure`] with an explicit configuration.
#[track_caller]
pub fn recover_failure_with<'a, R, F>(
    config: &ScopeConfig,
    either: Either<Fault, R>,
    steps: F,
) -> Traced<Either<Fault, R>>
where
    F: FnOnce(&mut RecoverScope<'a, R>) -> Step<()>,
{
    match either {
        Right(value) => Traced::untraced(Right(value)),
        Left(fault) => {
            let mut scope = RecoverScope::open(config, fault);
            match panic::catch_unwind(AssertUnwindSafe(|| steps(&mut scope))) {
                Ok(outcome) => scope.finish(outcome),
                Err(payload) if scope.frame.violated() => panic::resume_unwind(payload),
                Err(payload) => scope.fail(payload),
            }
        }
    }
}

/// Recover a failure through the first case that accepts its fault.
///
/// A `Right` passes through without entering the scope. A panic in the step
/// sequence is returned as `Left` without the original fault attached.
#[track_caller]
pub fn recover_failure<'a, R, F>(either: Either<Fault, R>, steps: F) -> Either<Fault, R>
where
    F: FnOnce(&mut RecoverScope<'a, R>) -> Step<()>,
{
    recover_failure_with(&ScopeConfig::default(), either, steps).value
}

/// Recover the failure of a fault-carrying `Either`.
pub trait RecoverExt<R> {
    fn recover_with<'a, F>(self, steps: F) -> Either<Fault, R>
    where
        F: FnOnce(&mut RecoverScope<'a, R>) -> Step<()>;
}

impl<R> RecoverExt<R> for Either<Fault, R> {
    #[track_caller]
    fn recover_with<'a, F>(self, steps: F) -> Either<Fault, R>
    where
        F: FnOnce(&mut RecoverScope<'a, R>) -> Step<()>,
    {
        recover_failure(self, steps)
    }
}
