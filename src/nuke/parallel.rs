//! Bounded-concurrency fan-out for listing and removal calls.

use std::future::Future;
use std::pin::Pin;

use futures::stream::{FuturesUnordered, StreamExt};
use log::trace;

/// Boxed future tagged with the index of its input
type IndexedFuture<'a, T> = Pin<Box<dyn Future<Output = (usize, T)> + 'a>>;

/// Run `task` for every input with at most `max_concurrent` in flight.
///
/// Results are returned in input order regardless of completion order.
///
/// # Example
///
/// ```ignore
/// let sizes = run_bounded(urls, |url| async move { fetch(&url).await }, 16).await;
/// ```
pub async fn run_bounded<'a, I, T, F, Fut>(inputs: Vec<I>, task: F, max_concurrent: usize) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + 'a,
    T: 'a,
{
    let total = inputs.len();
    if total == 0 {
        return Vec::new();
    }

    let max_concurrent = max_concurrent.max(1);
    trace!("running {} tasks with max {} concurrent", total, max_concurrent);

    let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut futures: FuturesUnordered<IndexedFuture<'a, T>> = FuturesUnordered::new();
    let mut pending = inputs.into_iter().enumerate();

    let make_future = |(index, input): (usize, I)| -> IndexedFuture<'a, T> {
        let fut = task(input);
        Box::pin(async move { (index, fut.await) })
    };

    // Seed initial batch up to max_concurrent
    for next in pending.by_ref().take(max_concurrent) {
        futures.push(make_future(next));
    }

    // Keep the pipeline full as tasks finish
    while let Some((index, result)) = futures.next().await {
        results[index] = Some(result);
        if let Some(next) = pending.next() {
            futures.push(make_future(next));
        }
    }

    results.into_iter().flatten().collect()
}
