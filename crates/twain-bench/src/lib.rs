//! Fixture builders shared by the twain benchmarks.

use twain::prelude::*;

/// `len` successes, or a failure at `fail_at` when it is inside the range.
pub fn build_chain(len: usize, fail_at: Option<usize>) -> Vec<Either<String, u64>> {
    (0..len)
        .map(|index| {
            if Some(index) == fail_at {
                Left(format!("item {index} rejected"))
            } else {
                Right(index as u64)
            }
        })
        .collect()
}

/// Payloads of rotating types so dispatch has to skip a varying number of
/// cases.
pub fn build_payloads(count: usize) -> Vec<Either<(), Box<dyn Payload>>> {
    (0..count)
        .map(|index| match index % 4 {
            0 => Right(boxed(index as u8)),
            1 => Right(boxed(index as u32)),
            2 => Right(boxed(index as u64)),
            _ => Right(boxed(format!("payload {index}"))),
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
#[error("transient failure #{0}")]
pub struct Transient(pub usize);

#[derive(Debug, thiserror::Error)]
#[error("permanent failure #{0}")]
pub struct Permanent(pub usize);

/// Alternating recoverable and unrecoverable faults.
pub fn build_faults(count: usize) -> Vec<Either<Fault, usize>> {
    (0..count)
        .map(|index| {
            if index % 2 == 0 {
                Left(Fault::new(Transient(index)))
            } else {
                Left(Fault::new(Permanent(index)))
            }
        })
        .collect()
}

/// Sum a chain through a sequential scope.
pub fn sum_chain(chain: Vec<Either<String, u64>>) -> Either<String, u64> {
    run_sequential_scope(|s| {
        let mut total = 0;
        for item in chain {
            total += s.bind(item)?;
        }
        Ok(total)
    })
}

/// Sum a chain with `flat_map` and no scope.
pub fn sum_chain_flat_map(chain: Vec<Either<String, u64>>) -> Either<String, u64> {
    chain
        .into_iter()
        .fold(Right(0), |acc, item| acc.flat_map(|total| item.map(|v| total + v)))
}

pub fn classify(payload: Either<(), Box<dyn Payload>>) -> Either<(), u64> {
    dispatch_on_success(payload, |s| {
        s.at(|v: String| v.len() as u64)?;
        s.at(|v: u64| v)?;
        s.at(|v: u32| u64::from(v))?;
        s.at(|v: u8| u64::from(v))?;
        Ok(())
    })
}

pub fn recover_transient(fault: Either<Fault, usize>) -> Either<Fault, usize> {
    fault.recover_with(|s| {
        s.case::<Transient, _>(|t| t.0)?;
        Ok(())
    })
}
