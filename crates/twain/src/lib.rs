//! `Either` values with short-circuit comprehensions and typed dispatch.
//!
//! ```
//! use twain::prelude::*;
//!
//! fn parse(text: &str) -> Either<String, i32> {
//!     text.parse::<i32>().map_err(|err| format!("{text}: {err}")).into()
//! }
//!
//! let sum: Either<String, i32> = run_sequential_scope(|s| {
//!     let a = s.bind(parse("20"))?;
//!     let b = s.bind(parse("22"))?;
//!     Ok(a + b)
//! });
//! assert_eq!(sum, Right(42));
//! ```

pub use twain_diag as diag;
pub use twain_either as either;
pub use twain_scope as scope;

pub use twain_diag::{Category, Diagnostic, DiagnosticError};
pub use twain_either::{Either, Fault, Left, Panicked, Right};
pub use twain_scope::{Abort, ScopeConfig, Step, Traced};

/// Everything a step sequence usually needs.
pub mod prelude {
    pub use twain_either::{
        Either, Fault, Left, Panicked, Right, catch, catch_result, left_of, option, right_of,
        sequence, when,
    };
    pub use twain_scope::{
        Abort, AtScope, Comprehension, FxExt, Payload, PolyMapExt, RecoverExt, RecoverScope,
        ScopeConfig, Step, Traced, boxed, dispatch_on_success, recover_failure,
        run_sequential_scope,
    };
}
