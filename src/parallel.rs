use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::debug;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::errors::{RootAngleError, Result};

/// Pool settings for `run_chunked`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorOptions {
    /// Number of worker threads, CPU count when `None`
    pub workers: Option<usize>,
    /// Items per chunk, all items in one chunk when `None`
    pub chunk_size: Option<usize>,
}

impl ExecutorOptions {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Run `func(shared, item)` for every item on a bounded worker pool.
///
/// Items are processed chunk by chunk; after each chunk `progress` receives
/// the number of items finished so far. Results come back in input order.
/// A failing or panicking invocation only affects its own slot, and the
/// failure is surfaced when that slot is read.
pub fn run_chunked<S, T, R, F, P>(
    func: F,
    shared: &S,
    items: &[T],
    options: ExecutorOptions,
    mut progress: P,
) -> Result<Vec<Result<R>>>
where
    S: Sync + ?Sized,
    T: Sync,
    R: Send,
    F: Fn(&S, &T) -> Result<R> + Sync,
    P: FnMut(usize),
{
    let workers = options.worker_count();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| RootAngleError::ThreadPool(e.to_string()))?;

    let chunk_size = options.chunk_size.unwrap_or(items.len()).max(1);
    debug!("running {} items on {} workers, chunk size {}", items.len(), workers, chunk_size);

    let start = Instant::now();
    let mut results = Vec::with_capacity(items.len());
    let mut done = 0;

    for chunk in items.chunks(chunk_size) {
        let chunk_results: Vec<Result<R>> = pool.install(|| {
            chunk
                .par_iter()
                .map(|item| {
                    panic::catch_unwind(AssertUnwindSafe(|| func(shared, item)))
                        .unwrap_or_else(|payload| Err(RootAngleError::Worker(panic_message(&*payload))))
                })
                .collect()
        });

        done += chunk_results.len();
        results.extend(chunk_results);
        progress(done);
    }

    debug!("{} items took {:.2} seconds", items.len(), start.elapsed().as_secs_f64());
    Ok(results)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn results_keep_input_order() {
        let items: Vec<u64> = (0..40).collect();
        let results = run_chunked(
            |offset: &u64, &item: &u64| {
                // later items finish first
                thread::sleep(Duration::from_millis(40 - item));
                Ok(item + offset)
            },
            &100u64,
            &items,
            ExecutorOptions { workers: Some(4), chunk_size: None },
            |_| {},
        )
        .unwrap();

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, (100..140).collect::<Vec<u64>>());
    }

    #[test]
    fn progress_reports_cumulative_counts() {
        let items: Vec<u32> = (0..10).collect();
        let mut seen = Vec::new();
        run_chunked(
            |_: &(), &item: &u32| Ok(item),
            &(),
            &items,
            ExecutorOptions { workers: Some(2), chunk_size: Some(4) },
            |n| seen.push(n),
        )
        .unwrap();
        assert_eq!(seen, vec![4, 8, 10]);
    }

    #[test]
    fn concurrency_is_bounded() {
        let active = AtomicUsize::new(0);
        let peak = Mutex::new(0usize);
        let items: Vec<u32> = (0..24).collect();

        run_chunked(
            |_: &(), _item: &u32| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                {
                    let mut peak = peak.lock().unwrap();
                    *peak = (*peak).max(now);
                }
                thread::sleep(Duration::from_millis(5));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            },
            &(),
            &items,
            ExecutorOptions { workers: Some(3), chunk_size: None },
            |_| {},
        )
        .unwrap();

        assert!(*peak.lock().unwrap() <= 3);
    }

    #[test]
    fn failures_stay_in_their_slot() {
        let items: Vec<u32> = (0..6).collect();
        let results = run_chunked(
            |_: &(), &item: &u32| {
                if item == 2 {
                    Err(RootAngleError::Other("bad item".to_string()))
                } else if item == 4 {
                    panic!("worker blew up");
                } else {
                    Ok(item)
                }
            },
            &(),
            &items,
            ExecutorOptions { workers: Some(2), chunk_size: Some(3) },
            |_| {},
        )
        .unwrap();

        assert_eq!(results.len(), 6);
        assert!(matches!(results[2], Err(RootAngleError::Other(_))));
        match &results[4] {
            Err(RootAngleError::Worker(msg)) => assert!(msg.contains("worker blew up")),
            other => panic!("expected worker error, got {:?}", other.as_ref().map(|_| ())),
        }
        assert_eq!(*results[5].as_ref().unwrap(), 5);
    }

    #[test]
    fn empty_input_is_fine() {
        let items: Vec<u32> = Vec::new();
        let results = run_chunked(|_: &(), &i: &u32| Ok(i), &(), &items, ExecutorOptions::default(), |_| {})
            .unwrap();
        assert!(results.is_empty());
    }
}
