//! Tests for the three scope kinds.
//!
//! Side-effect counters check that nothing after an abort point runs; the
//! `should_panic` tests pin the diagnostic code of each contract violation.

use std::cell::{Cell, RefCell};

use twain_diag::Category;
use twain_either::{Either, Fault, Left, Panicked, Right, catch};

use crate::*;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("no record for `{key}`")]
struct NotFound {
    key: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {0}ms")]
struct Timeout(u64);

fn not_found(key: &str) -> Either<Fault, String> {
    Left(Fault::new(NotFound {
        key: key.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Sequential scope
// ---------------------------------------------------------------------------

#[test]
fn sequential_stops_at_first_left() {
    let executed = Cell::new(0);
    let result: Either<&str, i32> = run_sequential_scope(|s| {
        let a = s.bind(Right(1))?;
        executed.set(executed.get() + 1);
        let _b: i32 = s.bind(Left("boom"))?;
        executed.set(executed.get() + 1);
        let c = s.bind(Right(3))?;
        executed.set(executed.get() + 1);
        Ok(a + c)
    });
    assert_eq!(result, Left("boom"));
    assert_eq!(executed.get(), 1);
}

#[test]
fn sequential_returns_right_when_every_bind_succeeds() {
    let result: Either<String, i32> = run_sequential_scope(|s| {
        let a = s.bind(Right(1))?;
        let b = s.bind(Right(2))?;
        let c = s.bind(Right(3))?;
        Ok(a + b + c)
    });
    assert_eq!(result, Right(6));
}

#[test]
fn yield_right_skips_the_rest() {
    let reached_end = Cell::new(false);
    let result: Either<&str, i32> = run_sequential_scope(|s| {
        let cached = Some(7);
        if let Some(hit) = cached {
            return Err(s.yield_right(hit));
        }
        reached_end.set(true);
        Ok(0)
    });
    assert_eq!(result, Right(7));
    assert!(!reached_end.get());
}

#[test]
fn yield_left_declares_failure() {
    let result: Either<&str, i32> = run_sequential_scope(|s| {
        let balance = s.bind(Right(10))?;
        if balance < 50 {
            return Err(s.yield_left("insufficient funds"));
        }
        Ok(balance)
    });
    assert_eq!(result, Left("insufficient funds"));
}

#[test]
fn ensure_and_ensure_not_guard_the_sequence() {
    let passing: Either<&str, u32> = run_sequential_scope(|s| {
        s.ensure(true, || "unreachable")?;
        s.ensure_not(false, || "unreachable")?;
        Ok(1)
    });
    assert_eq!(passing, Right(1));

    let failure_built = Cell::new(0);
    let failing: Either<&str, u32> = run_sequential_scope(|s| {
        s.ensure(true, || {
            failure_built.set(failure_built.get() + 1);
            "lazy"
        })?;
        s.ensure_not(2 > 1, || "two is greater")?;
        Ok(1)
    });
    assert_eq!(failing, Left("two is greater"));
    assert_eq!(failure_built.get(), 0);
}

#[test]
fn bind_all_collects_in_order() {
    let result: Either<&str, Vec<i32>> = run_sequential_scope(|s| {
        let values = s.bind_all(vec![Right(3), Right(1), Right(2)])?;
        Ok(values)
    });
    assert_eq!(result, Right(vec![3, 1, 2]));
}

#[test]
fn bind_all_stops_pulling_items_after_first_left() {
    let pulled = Cell::new(0);
    let result: Either<String, Vec<i32>> = run_sequential_scope(|s| {
        let items = (0..5).map(|i| {
            pulled.set(pulled.get() + 1);
            if i == 2 { Left(format!("item {i}")) } else { Right(i) }
        });
        s.bind_all(items)
    });
    assert_eq!(result, Left("item 2".to_string()));
    assert_eq!(pulled.get(), 3);
}

#[test]
fn nested_scope_result_binds_into_outer() {
    let result: Either<&str, i32> = run_sequential_scope(|outer| {
        let a = outer.bind(Right(2))?;
        let inner: Either<&str, i32> = run_sequential_scope(|inner| {
            let b = inner.bind(Right(a * 10))?;
            Ok(b + 1)
        });
        let b = outer.bind(inner)?;
        Ok(b)
    });
    assert_eq!(result, Right(21));
}

#[test]
fn fx_continues_a_right_and_skips_a_left() {
    let doubled = Either::<&str, i32>::Right(4).fx(|s, v| {
        let w = s.bind(Right(v * 2))?;
        Ok(w + 1)
    });
    assert_eq!(doubled, Right(9));

    let entered = Cell::new(false);
    let skipped = Either::<&str, i32>::Left("early").fx(|_, v| {
        entered.set(true);
        Ok(v)
    });
    assert_eq!(skipped, Left("early"));
    assert!(!entered.get());
}

#[test]
fn sequential_trace_records_each_decision() {
    let config = ScopeConfig::labeled("checkout").traced();
    let traced: Traced<Either<&str, i32>> = run_sequential_scope_with(&config, |s| {
        let a = s.bind(Right(1))?;
        s.ensure(a > 0, || "negative")?;
        let _: i32 = s.bind(Left("declined"))?;
        Ok(a)
    });
    assert_eq!(traced.value, Left("declined"));
    assert_eq!(
        traced.actions(),
        vec![
            ScopeAction::Bind,
            ScopeAction::Ensure,
            ScopeAction::Abort,
            ScopeAction::Complete,
        ]
    );
    assert!(traced.trace.iter().all(|step| step.kind == ScopeKind::Sequential));
}

#[test]
fn untraced_scope_records_nothing() {
    let traced: Traced<Either<&str, i32>> =
        run_sequential_scope_with(&ScopeConfig::default(), |s| s.bind(Right(1)));
    assert_eq!(traced.value, Right(1));
    assert!(traced.trace.is_empty());
}

#[test]
#[should_panic(expected = "step exploded")]
fn panic_in_step_sequence_propagates() {
    let _: Either<&str, i32> = run_sequential_scope(|s| {
        let _ = s.bind(Right::<&str, i32>(1))?;
        panic!("step exploded");
    });
}

#[test]
#[should_panic(expected = "E0102")]
fn binding_after_ignored_abort_is_fatal() {
    let _: Either<&str, i32> = run_sequential_scope(|s| {
        let _ignored = s.bind::<i32>(Left("first"));
        s.bind::<i32>(Left("second"))
    });
}

#[test]
#[should_panic(expected = "E0102")]
fn returning_normally_after_abort_is_fatal() {
    let _: Either<&str, i32> = run_sequential_scope(|s| {
        let _ignored = s.bind::<i32>(Left("first"));
        Ok(1)
    });
}

#[test]
#[should_panic(expected = "E0105")]
fn abort_from_another_scope_is_fatal() {
    let _: Either<&str, i32> = run_sequential_scope(|outer| {
        let nested: Either<&str, i32> =
            run_sequential_scope(|_inner| Err(outer.yield_left("leaked")));
        outer.bind(nested)
    });
}

#[test]
fn contract_violation_names_the_scope() {
    let config = ScopeConfig::labeled("payment");
    let fault = catch(|| {
        run_sequential_scope_with::<&str, i32, _>(&config, |s| {
            let _ignored = s.bind::<i32>(Left("first"));
            Ok(1)
        })
    })
    .into_left()
    .unwrap();
    let message = &fault.downcast_ref::<Panicked>().unwrap().message;
    assert!(message.starts_with("fatal[E0102]"), "{message}");
    assert!(message.contains("in scope `payment`"), "{message}");
    assert!(message.contains("scope_tests.rs"), "{message}");
}

// ---------------------------------------------------------------------------
// Success dispatch
// ---------------------------------------------------------------------------

#[test]
fn first_matching_type_wins() {
    let reached_third = Cell::new(false);
    let out: Either<(), usize> = dispatch_on_success(Right(boxed("x".to_string())), |s| {
        s.at(|n: i32| n as usize)?;
        s.at(|text: String| text.len() + 100)?;
        reached_third.set(true);
        s.at(|n: i32| n as usize * 2)?;
        Ok(())
    });
    assert_eq!(out, Right(101));
    assert!(!reached_third.get());
}

#[test]
fn left_never_enters_dispatch() {
    let entered = Cell::new(false);
    let out: Either<&str, usize> = dispatch_on_success(Left("failed upstream"), |s| {
        entered.set(true);
        s.at(|text: String| text.len())?;
        Ok(())
    });
    assert_eq!(out, Left("failed upstream"));
    assert!(!entered.get());
}

#[test]
fn handler_runs_after_the_step_sequence_returns() {
    let log = RefCell::new(Vec::new());
    let out: Either<(), i64> = dispatch_on_success(Right(boxed(5i64)), |s| {
        let matched = s.at(|v: i64| {
            log.borrow_mut().push("handler");
            v * 3
        });
        log.borrow_mut().push("steps");
        matched?;
        Ok(())
    });
    assert_eq!(out, Right(15));
    assert_eq!(*log.borrow(), vec!["steps", "handler"]);
}

#[test]
fn otherwise_takes_the_unmatched_payload() {
    let out: Either<(), String> = dispatch_on_success(Right(boxed(vec![1u8, 2])), |s| {
        s.at(|text: String| text)?;
        Err(s.otherwise(|payload| format!("{payload:?} as {}", (*payload).type_name())))
    });
    assert_eq!(out, Right("[1, 2] as alloc::vec::Vec<u8>".to_string()));
}

#[test]
fn poly_map_dispatches_through_extension() {
    let input: Either<&str, Box<dyn Payload>> = Right(boxed(2.5f64));
    let out = input.poly_map(|s| {
        s.at(|v: f32| v as f64)?;
        s.at(|v: f64| v * 2.0)?;
        Ok(())
    });
    assert_eq!(out, Right(5.0));
}

#[test]
fn unmatched_payload_is_reported() {
    let err = try_dispatch_on_success::<(), usize, _>(Right(boxed(3.5f64)), |s| {
        s.at(|text: String| text.len())?;
        s.at(|n: i32| n as usize)?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err.category(), Some(Category::NonExhaustive));
    let diag = &err.diagnostics()[0];
    insta::assert_snapshot!(diag.message, @"no `at` case matches 3.5 of type `f64`");
    assert!(diag.help.is_some());
}

#[test]
#[should_panic(expected = "E0101")]
fn unmatched_payload_raises() {
    let _: Either<(), usize> = dispatch_on_success(Right(boxed('c')), |s| {
        s.at(|text: String| text.len())?;
        Ok(())
    });
}

#[test]
#[should_panic(expected = "E0105")]
fn abort_from_another_scope_is_fatal_in_dispatch() {
    let _: Either<&str, i32> = run_sequential_scope(|outer| {
        let nested: Either<(), i32> =
            dispatch_on_success(Right(boxed(1i32)), |_| Err(outer.yield_left("leaked")));
        outer.bind(nested.left_map(|()| "unmatched"))
    });
}

#[test]
#[should_panic(expected = "E0102")]
fn registering_after_a_match_is_fatal() {
    let _: Either<(), i32> = dispatch_on_success(Right(boxed(1i32)), |s| {
        let _ignored = s.at(|v: i32| v);
        s.at(|v: i32| v + 1)?;
        Ok(())
    });
}

#[test]
fn dispatch_trace_shows_rejected_guards() {
    let config = ScopeConfig::labeled("render").traced();
    let traced: Traced<Either<(), usize>> =
        dispatch_on_success_with(&config, Right(boxed("hi".to_string())), |s| {
            s.at(|n: u8| n as usize)?;
            s.at(|text: String| text.len())?;
            Ok(())
        });
    assert_eq!(traced.value, Right(2));
    assert_eq!(
        traced.actions(),
        vec![
            ScopeAction::GuardRejected,
            ScopeAction::GuardAccepted,
            ScopeAction::Abort,
            ScopeAction::Complete,
        ]
    );
    assert_eq!(traced.trace[0].detail, "u8");
}

// ---------------------------------------------------------------------------
// Failure recovery
// ---------------------------------------------------------------------------

#[test]
fn matching_case_recovers_into_right() {
    let out = recover_failure(not_found("user:7"), |s| {
        s.case::<NotFound, _>(|err| format!("default for {}", err.key))?;
        Ok(())
    });
    assert_eq!(out.into_right(), Some("default for user:7".to_string()));
}

#[test]
fn unregistered_kind_passes_through_unchanged() {
    let out = recover_failure(not_found("order:1"), |s| {
        s.case::<Timeout, _>(|_| "retry later".to_string())?;
        Ok(())
    });
    let fault = out.into_left().unwrap();
    assert_eq!(
        fault.downcast_ref::<NotFound>(),
        Some(&NotFound {
            key: "order:1".to_string()
        })
    );
    assert!(fault.suppressed().is_empty());
}

#[test]
fn right_never_enters_recovery() {
    let entered = Cell::new(false);
    let out = recover_failure(Right::<Fault, i32>(3), |s| {
        entered.set(true);
        s.case::<NotFound, _>(|_| 0)?;
        Ok(())
    });
    assert!(matches!(out, Right(3)));
    assert!(!entered.get());
}

#[test]
fn first_matching_case_wins() {
    let reached_second = Cell::new(false);
    let out = recover_failure(not_found("k"), |s| {
        s.case::<NotFound, _>(|_| "first".to_string())?;
        reached_second.set(true);
        s.case::<NotFound, _>(|_| "second".to_string())?;
        Ok(())
    });
    assert_eq!(out.into_right().as_deref(), Some("first"));
    assert!(!reached_second.get());
}

#[test]
fn panicking_handler_keeps_original_as_cause() {
    let out = recover_failure(not_found("cfg"), |s| {
        s.case::<NotFound, _>(|err| -> String { panic!("fallback for {} failed", err.key) })?;
        Ok(())
    });
    let fault = out.into_left().unwrap();
    assert_eq!(
        fault.downcast_ref::<Panicked>().map(|p| p.message.as_str()),
        Some("fallback for cfg failed")
    );
    let cause = fault.cause().unwrap();
    assert!(cause.is::<NotFound>());
    assert!(fault.suppressed().is_empty());
}

#[test]
fn raised_fault_from_handler_keeps_its_kind() {
    let out = recover_failure(not_found("cache"), |s| {
        s.case::<NotFound, _>(|_| -> String { Fault::new(Timeout(250)).raise() })?;
        Ok(())
    });
    let fault = out.into_left().unwrap();
    assert_eq!(fault.downcast_ref::<Timeout>(), Some(&Timeout(250)));
    assert!(fault.cause().is_some_and(|c| c.is::<NotFound>()));
    assert_eq!(
        format!("{fault:#}"),
        "timed out after 250ms\n  caused by: no record for `cache`"
    );
}

#[test]
fn cause_survives_suppressed_faults_on_the_raised_fault() {
    let out = recover_failure(not_found("session"), |s| {
        s.case::<NotFound, _>(|_| -> String {
            Fault::new(Timeout(1))
                .with_suppressed(Fault::msg("earlier retry"))
                .raise()
        })?;
        Ok(())
    });
    let fault = out.into_left().unwrap();
    assert!(fault.cause().is_some_and(|c| c.is::<NotFound>()));
    assert_eq!(fault.suppressed().len(), 1);
    assert_eq!(fault.suppressed()[0].to_string(), "earlier retry");
}

#[test]
fn case_where_matches_on_predicate() {
    let out = catch(|| -> usize { panic!("db down") }).recover_with(|s| {
        s.case::<NotFound, _>(|_| 0)?;
        s.case_where(
            |fault| fault.to_string().contains("db down"),
            |fault| fault.to_string().len(),
        )?;
        Ok(())
    });
    assert_eq!(out.into_right(), Some("panicked: db down".len()));
}

#[test]
fn recovers_panics_captured_by_catch() {
    let out = catch(|| -> u32 { panic!("parse failure") }).recover_with(|s| {
        s.case::<Panicked, _>(|p| p.message.len() as u32)?;
        Ok(())
    });
    assert!(matches!(out, Right(13)));
}

#[test]
fn recovery_trace_on_pass_through() {
    let config = ScopeConfig::labeled("lookup").traced();
    let traced = recover_failure_with(&config, not_found("x"), |s| {
        s.case::<Timeout, _>(|_| String::new())?;
        Ok(())
    });
    assert!(traced.value.is_left());
    assert_eq!(
        traced.actions(),
        vec![ScopeAction::GuardRejected, ScopeAction::PassThrough]
    );
    assert_eq!(traced.trace[1].detail, "no record for `x`");
}

#[test]
fn panic_in_recovery_steps_becomes_the_failure() {
    let out = recover_failure(not_found("x"), |s| {
        s.case::<Timeout, _>(|_| String::new())?;
        panic!("lookup table corrupt");
    });
    let fault = out.into_left().unwrap();
    assert_eq!(
        fault.downcast_ref::<Panicked>().map(|p| p.message.as_str()),
        Some("lookup table corrupt")
    );
    assert!(fault.cause().is_none());
    assert!(fault.suppressed().is_empty());
}

#[test]
fn panicking_guard_becomes_the_failure() {
    let config = ScopeConfig::labeled("guarded").traced();
    let traced = recover_failure_with(&config, not_found("x"), |s| {
        s.case_where(|_| panic!("guard blew up"), |_| String::new())?;
        Ok(())
    });
    let fault = traced.value.into_left().unwrap();
    assert_eq!(fault.to_string(), "panicked: guard blew up");
    assert!(fault.cause().is_none());
    assert_eq!(traced.trace.len(), 1);
    assert_eq!(traced.trace[0].action, ScopeAction::StepsRaised);
}

#[test]
fn raised_fault_in_recovery_steps_keeps_its_kind() {
    let out = recover_failure(not_found("x"), |_| -> Step<()> { Fault::new(Timeout(30)).raise() });
    let fault = out.into_left().unwrap();
    assert_eq!(fault.downcast_ref::<Timeout>(), Some(&Timeout(30)));
}

#[test]
#[should_panic(expected = "E0102")]
fn registering_after_a_recovery_match_is_fatal() {
    let _ = recover_failure(not_found("x"), |s| {
        let _ignored = s.case::<NotFound, _>(|_| String::new());
        s.case::<NotFound, _>(|_| String::new())?;
        Ok(())
    });
}

#[test]
#[should_panic(expected = "E0105")]
fn abort_from_another_scope_is_fatal_in_recovery() {
    let _: Either<&str, i32> = run_sequential_scope(|outer| {
        let nested = recover_failure(not_found("x"), |_| Err(outer.yield_left("leaked")));
        outer.bind(nested.left_map(|_| "unrecovered"))?;
        Ok(0)
    });
}

#[test]
#[should_panic(expected = "E0102")]
fn returning_normally_after_recovery_match_is_fatal() {
    let _ = recover_failure(not_found("x"), |s| {
        let _ignored = s.case::<NotFound, _>(|_| String::new());
        Ok(())
    });
}
