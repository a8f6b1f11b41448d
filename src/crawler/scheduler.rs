//! Bounded concurrency scheduler
//!
//! Runs a batch of futures with at most `cap` of them in flight. A new task is
//! started only after a running one settles, so the cap holds for the whole
//! batch regardless of how long individual tasks take. Every task runs to
//! completion: a failure does not cancel its siblings.

use futures::future::FutureExt;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs `tasks` with at most `cap` in flight at once
///
/// # Arguments
///
/// * `tasks` - Futures to run; none is polled before the scheduler starts it
/// * `cap` - Maximum number of tasks in flight
///
/// # Returns
///
/// * `Ok(Vec<T>)` - Every task succeeded; outputs are in input order
/// * `Err(Vec<E>)` - At least one task failed; every failure in input order
///
/// An empty batch or a cap of zero completes immediately with `Ok(vec![])`.
///
/// # Example
///
/// ```
/// use sitemap_stream::run_capped;
///
/// # async fn example() {
/// let tasks = (1..=3).map(|n| async move { Ok::<_, String>(n * 2) });
/// assert_eq!(run_capped(tasks, 2).await, Ok(vec![2, 4, 6]));
/// # }
/// ```
pub async fn run_capped<I, Fut, T, E>(tasks: I, cap: usize) -> Result<Vec<T>, Vec<E>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    if cap == 0 {
        return Ok(Vec::new());
    }

    let indexed: Vec<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| task.map(move |result| (index, result)))
        .collect();

    let mut settled: Vec<(usize, Result<T, E>)> = stream::iter(indexed)
        .buffer_unordered(cap)
        .collect()
        .await;

    settled.sort_by_key(|(index, _)| *index);

    let mut outputs = Vec::with_capacity(settled.len());
    let mut failures = Vec::new();
    for (_, result) in settled {
        match result {
            Ok(output) => outputs.push(output),
            Err(error) => failures.push(error),
        }
    }

    if failures.is_empty() {
        Ok(outputs)
    } else {
        tracing::debug!(
            "{} of {} scheduled tasks failed",
            failures.len(),
            failures.len() + outputs.len()
        );
        Err(failures)
    }
}
