//! Raised faults captured as data.
//!
//! A [`Fault`] owns a boxed error whose concrete type is the fault's kind,
//! the fault it was raised while handling, and any suppressed faults.
//! Panics become a [`Panicked`] fault unless the panic payload already is a
//! `Fault`.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::{Either, Left, Right};

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Kind of a fault captured from a panic that did not carry a `Fault`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("panicked: {message}")]
pub struct Panicked {
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

/// A raised fault: an error of some runtime kind, the fault it was raised
/// while handling, and the faults suppressed along the way.
///
/// `Fault` does not implement `std::error::Error`, so any error
/// converts into it with `?`.
#[derive(Debug)]
pub struct Fault {
    error: BoxError,
    cause: Option<Box<Fault>>,
    suppressed: Vec<Fault>,
}

impl Fault {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            error: Box::new(error),
            cause: None,
            suppressed: Vec::new(),
        }
    }

    /// A fault carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Convert a panic payload into a fault.
    ///
    /// A payload raised with [`Fault::raise`] comes back unchanged; string
    /// payloads become [`Panicked`] with that message.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<Fault>() {
            Ok(fault) => *fault,
            Err(payload) => Self::new(Panicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Whether this fault's kind is `C`.
    pub fn is<C>(&self) -> bool
    where
        C: Error + 'static,
    {
        self.error.is::<C>()
    }

    pub fn downcast_ref<C>(&self) -> Option<&C>
    where
        C: Error + 'static,
    {
        self.error.downcast_ref::<C>()
    }

    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.error.as_ref()
    }

    pub fn into_error(self) -> BoxError {
        self.error
    }

    /// Faults suppressed while this one was raised, oldest first.
    pub fn suppressed(&self) -> &[Fault] {
        &self.suppressed
    }

    /// The fault that was being handled when this one was raised.
    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_deref()
    }

    /// Record `cause` as the fault being handled. A cause set earlier moves
    /// to the front of the suppressed list.
    pub fn with_cause(mut self, cause: Fault) -> Self {
        if let Some(previous) = self.cause.replace(Box::new(cause)) {
            self.suppressed.insert(0, *previous);
        }
        self
    }

    pub fn add_suppressed(&mut self, fault: Fault) {
        self.suppressed.push(fault);
    }

    pub fn with_suppressed(mut self, fault: Fault) -> Self {
        self.add_suppressed(fault);
        self
    }

    /// Unwind with this fault as the panic payload.
    ///
    /// The panic hook does not run; [`catch`] and recovery scopes get the
    /// fault back exactly as raised.
    pub fn raise(self) -> ! {
        panic::resume_unwind(Box::new(self))
    }
}

impl<E> From<E> for Fault
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl AsRef<dyn Error + Send + Sync + 'static> for Fault {
    fn as_ref(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.error()
    }
}

/// `{}` shows the error, `{:#}` also shows the cause and suppressed faults.
impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if f.alternate() {
            if let Some(cause) = &self.cause {
                write!(f, "\n  caused by: {cause}")?;
            }
            for fault in &self.suppressed {
                write!(f, "\n  suppressed: {fault}")?;
            }
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Run `attempt`, turning any panic into `Left(Fault)`.
///
/// Every panic is intercepted, including ones that report programming
/// errors. This is the single bridge from unwinding code into `Either`.
pub fn catch<R>(attempt: impl FnOnce() -> R) -> Either<Fault, R> {
    match panic::catch_unwind(AssertUnwindSafe(attempt)) {
        Ok(value) => Right(value),
        Err(payload) => Left(Fault::from_panic(payload)),
    }
}

/// Like [`catch`], for attempts that also report errors by value.
pub fn catch_result<R, E>(attempt: impl FnOnce() -> Result<R, E>) -> Either<Fault, R>
where
    E: Into<Fault>,
{
    catch(attempt).flat_map(|result| match result {
        Ok(value) => Right(value),
        Err(err) => Left(err.into()),
    })
}
