//! Order-preserving parallel batch execution.
//!
//! Every batch operation maps its items through a per-worker state (an
//! encoder, an encryptor, …) on the rayon pool. Results come back in input
//! order; a failed item leaves `None` at its position and its error is
//! collected alongside its index instead of aborting the batch.

use rayon::prelude::*;

/// Positional results of a batch plus the failures, sorted by index.
#[derive(Debug)]
pub struct BatchOutcome<U, E> {
    pub results: Vec<Option<U>>,
    pub failures: Vec<(usize, E)>,
}

impl<U, E> BatchOutcome<U, E> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }
}

/// Maps `items` in parallel. `init` builds one worker state per rayon task
/// split; `f` receives the state, the item's index and the item.
pub fn batch_map<T, U, E, S, I, F>(items: &[T], init: I, f: F) -> BatchOutcome<U, E>
where
    T: Sync,
    U: Send,
    E: Send,
    I: Fn() -> S + Sync + Send,
    F: Fn(&mut S, usize, &T) -> Result<U, E> + Sync + Send,
{
    let outcomes: Vec<Result<U, E>> = items
        .par_iter()
        .enumerate()
        .map_init(init, |state, (index, item)| f(state, index, item))
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => results.push(Some(value)),
            Err(error) => {
                results.push(None);
                failures.push((index, error));
            }
        }
    }
    BatchOutcome { results, failures }
}

/// Applies `f` to every item in place, in parallel. Returns the failures
/// sorted by index.
pub fn batch_apply<T, E, F>(items: &mut [T], f: F) -> Vec<(usize, E)>
where
    T: Send,
    E: Send,
    F: Fn(&mut T) -> Result<(), E> + Sync + Send,
{
    let mut failures: Vec<(usize, E)> = items
        .par_iter_mut()
        .enumerate()
        .filter_map(|(index, item)| f(item).err().map(|e| (index, e)))
        .collect();
    failures.sort_by_key(|(index, _)| *index);
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_positions_around_failures() {
        let items: Vec<i32> = (0..100).collect();
        let outcome = batch_map(
            &items,
            || 10,
            |offset, _, &x| if x % 7 == 3 { Err(x) } else { Ok(x + *offset) },
        );

        assert_eq!(outcome.results.len(), 100);
        for (i, result) in outcome.results.iter().enumerate() {
            if i % 7 == 3 {
                assert!(result.is_none());
            } else {
                assert_eq!(*result, Some(i as i32 + 10));
            }
        }
        let failed: Vec<usize> = outcome.failures.iter().map(|(i, _)| *i).collect();
        assert_eq!(failed, (0..100).filter(|i| i % 7 == 3).collect::<Vec<_>>());
        assert!(!outcome.is_complete());
    }

    #[test]
    fn empty_batch() {
        let outcome: BatchOutcome<i32, ()> = batch_map(&[] as &[i32], || (), |_, _, &x| Ok(x));
        assert!(outcome.results.is_empty());
        assert!(outcome.is_complete());
    }

    #[test]
    fn apply_reports_sorted_failures() {
        let mut items: Vec<i32> = (0..64).collect();
        let failures = batch_apply(&mut items, |x| {
            if *x % 5 == 0 {
                Err(*x)
            } else {
                *x *= 2;
                Ok(())
            }
        });
        assert_eq!(failures.first().map(|f| f.0), Some(0));
        assert!(failures.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(items[3], 6);
    }
}
