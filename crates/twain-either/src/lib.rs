//! The `Either` value and its combinators.
//!
//! `Either<L, R>` holds exactly one of two payloads: `Left(L)` for a modeled
//! failure and `Right(R)` for a success. Every combinator here is derived
//! from the two constructors; the control-flow scopes built on top live in
//! `twain-scope`.
//!
//! Raised faults (panics, boxed errors) enter the `Either` world through
//! [`catch`], which turns them into `Left(Fault)`.

pub mod fault;

use serde::{Deserialize, Serialize};

pub use fault::{Fault, Panicked, catch, catch_result};

/// A value that is either a failure (`Left`) or a success (`Right`).
#[must_use = "an Either may hold a failure that should be handled"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Either<L, R> {
    /// Terminal failure payload.
    Left(L),
    /// Terminal success payload.
    Right(R),
}

pub use Either::{Left, Right};

/// Iterator over the success payload of a borrowed `Either`.
pub type Iter<'a, R> = std::option::IntoIter<&'a R>;

/// Iterator over the success payload of an owned `Either`.
pub type IntoIter<R> = std::option::IntoIter<R>;

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Wrap a failure payload.
#[inline]
pub fn left_of<L, R>(value: L) -> Either<L, R> {
    Left(value)
}

/// Wrap a success payload.
#[inline]
pub fn right_of<L, R>(value: R) -> Either<L, R> {
    Right(value)
}

impl<R> Either<(), R> {
    /// The canonical payload-free failure produced by [`option`].
    pub const NONE: Self = Left(());
}

/// `Right` if a value is present, otherwise [`Either::NONE`].
#[inline]
pub fn option<R>(value: Option<R>) -> Either<(), R> {
    match value {
        Some(value) => Right(value),
        None => Either::NONE,
    }
}

/// Build a `Right` from `right` when `condition` holds, else a `Left` from
/// `left`. Only the selected thunk runs.
#[inline]
pub fn when<L, R>(
    condition: bool,
    left: impl FnOnce() -> L,
    right: impl FnOnce() -> R,
) -> Either<L, R> {
    if condition { Right(right()) } else { Left(left()) }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(result: Result<R, L>) -> Self {
        match result {
            Ok(value) => Right(value),
            Err(err) => Left(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

impl<L, R> Either<L, R> {
    #[inline]
    pub const fn is_left(&self) -> bool {
        matches!(self, Left(_))
    }

    #[inline]
    pub const fn is_right(&self) -> bool {
        matches!(self, Right(_))
    }

    /// The failure payload, if this is a `Left`.
    #[inline]
    pub fn left(&self) -> Option<&L> {
        match self {
            Left(value) => Some(value),
            Right(_) => None,
        }
    }

    /// The success payload, if this is a `Right`.
    #[inline]
    pub fn right(&self) -> Option<&R> {
        match self {
            Left(_) => None,
            Right(value) => Some(value),
        }
    }

    #[inline]
    pub fn into_left(self) -> Option<L> {
        match self {
            Left(value) => Some(value),
            Right(_) => None,
        }
    }

    #[inline]
    pub fn into_right(self) -> Option<R> {
        match self {
            Left(_) => None,
            Right(value) => Some(value),
        }
    }

    #[inline]
    pub fn as_ref(&self) -> Either<&L, &R> {
        match self {
            Left(value) => Left(value),
            Right(value) => Right(value),
        }
    }

    /// Convert into a `std` result, `Right` becoming `Ok`.
    #[inline]
    pub fn into_result(self) -> Result<R, L> {
        match self {
            Left(err) => Err(err),
            Right(value) => Ok(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

impl<L, R> Either<L, R> {
    /// Apply `f` to the success payload. A `Left` passes through.
    #[inline]
    pub fn map<T, F>(self, f: F) -> Either<L, T>
    where
        F: FnOnce(R) -> T,
    {
        self.flat_map(|value| Right(f(value)))
    }

    /// Monadic bind: apply `f` to the success payload and return its result
    /// as is. On a `Left`, `f` is never invoked.
    #[inline]
    pub fn flat_map<T, F>(self, f: F) -> Either<L, T>
    where
        F: FnOnce(R) -> Either<L, T>,
    {
        match self {
            Left(err) => Left(err),
            Right(value) => f(value),
        }
    }

    #[inline]
    pub fn left_map<T, F>(self, f: F) -> Either<T, R>
    where
        F: FnOnce(L) -> T,
    {
        self.left_flat_map(|err| Left(f(err)))
    }

    #[inline]
    pub fn left_flat_map<T, F>(self, f: F) -> Either<T, R>
    where
        F: FnOnce(L) -> Either<T, R>,
    {
        match self {
            Left(err) => f(err),
            Right(value) => Right(value),
        }
    }

    /// Exchange the variants, keeping the payload.
    #[inline]
    pub fn swap(self) -> Either<R, L> {
        match self {
            Left(err) => Right(err),
            Right(value) => Left(value),
        }
    }

    /// Eliminate the `Either`. Exactly one branch runs.
    #[inline]
    pub fn fold<T>(self, on_left: impl FnOnce(L) -> T, on_right: impl FnOnce(R) -> T) -> T {
        match self {
            Left(err) => on_left(err),
            Right(value) => on_right(value),
        }
    }

    /// Run `action` on the failure payload, if any, and return `self`.
    #[inline]
    pub fn on_left(self, action: impl FnOnce(&L)) -> Self {
        if let Left(err) = &self {
            action(err);
        }
        self
    }

    /// Run `action` on the success payload, if any, and return `self`.
    #[inline]
    pub fn on_right(self, action: impl FnOnce(&R)) -> Self {
        if let Right(value) = &self {
            action(value);
        }
        self
    }

    /// Pair two successes. The first `Left`, in argument order, wins.
    #[inline]
    pub fn zip<T>(self, other: Either<L, T>) -> Either<L, (R, T)> {
        self.flat_map(|first| other.map(|second| (first, second)))
    }

    /// Return the success payload, or keep feeding the failure payload to
    /// `step` until it produces one. See [`tailrec`].
    pub fn tailrec<F>(self, step: F) -> R
    where
        F: FnMut(L) -> Either<L, R>,
    {
        match self {
            Left(seed) => tailrec(seed, step),
            Right(value) => value,
        }
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, R> {
        self.right().into_iter()
    }

    /// The success payload as a zero- or one-element vector.
    pub fn to_vec(&self) -> Vec<R>
    where
        R: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T> Either<T, T> {
    /// The payload, whichever side holds it.
    #[inline]
    pub fn merge(self) -> T {
        match self {
            Left(value) | Right(value) => value,
        }
    }
}

impl<L, R> IntoIterator for Either<L, R> {
    type Item = R;
    type IntoIter = IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_right().into_iter()
    }
}

impl<'a, L, R> IntoIterator for &'a Either<L, R> {
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Collects successes until the first `Left`, which is returned instead.
impl<L, A, V> FromIterator<Either<L, A>> for Either<L, V>
where
    V: FromIterator<A>,
{
    fn from_iter<I: IntoIterator<Item = Either<L, A>>>(iter: I) -> Self {
        let mut failure = None;
        let collected = iter
            .into_iter()
            .map_while(|item| match item {
                Left(err) => {
                    failure = Some(err);
                    None
                }
                Right(value) => Some(value),
            })
            .collect();
        match failure {
            Some(err) => Left(err),
            None => Right(collected),
        }
    }
}

// ---------------------------------------------------------------------------
// Free combinators
// ---------------------------------------------------------------------------

/// Feed `initial` to `step`, then every `Left` it returns, until it returns
/// a `Right`. Runs in constant stack space.
pub fn tailrec<L, R, F>(initial: L, mut step: F) -> R
where
    F: FnMut(L) -> Either<L, R>,
{
    let mut next = initial;
    loop {
        match step(next) {
            Left(seed) => next = seed,
            Right(value) => return value,
        }
    }
}

/// `Right` with every payload in order if all items are `Right`, otherwise
/// the first `Left`.
pub fn sequence<L, R, I>(items: I) -> Either<L, Vec<R>>
where
    I: IntoIterator<Item = Either<L, R>>,
{
    items.into_iter().collect()
}

/// Split into all failure payloads and all success payloads, each in their
/// original relative order.
pub fn unzip<L, R, I>(items: I) -> (Vec<L>, Vec<R>)
where
    I: IntoIterator<Item = Either<L, R>>,
{
    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    for item in items {
        match item {
            Left(err) => lefts.push(err),
            Right(value) => rights.push(value),
        }
    }
    (lefts, rights)
}

/// Lift a plain function over the success side of an `Either`.
pub fn lift<L, R, T, F>(f: F) -> impl Fn(Either<L, R>) -> Either<L, T>
where
    F: Fn(R) -> T,
{
    move |either| either.map(&f)
}
