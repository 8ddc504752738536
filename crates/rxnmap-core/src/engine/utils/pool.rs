use crate::engine::error::EngineError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

/// Worker count for a batch of `jobs` tasks.
///
/// Defaults to one less than the available cores (at least one). A requested
/// size replaces the default but is still capped at the number of jobs.
pub fn pool_size(requested: Option<usize>, jobs: usize) -> usize {
    let wanted = requested.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .saturating_sub(1)
    });
    wanted.max(1).min(jobs.max(1))
}

pub fn build_pool(threads: usize, name: &'static str) -> Result<ThreadPool, EngineError> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("rxnmap-{name}-{i}"))
        .build()?)
}

/// Runs `work` once per item on `pool` and hands every outcome to
/// `on_complete` on the calling thread, in completion order.
///
/// A panicking task is reported as `Err(payload)`. The call returns only after
/// every spawned task has finished.
pub fn run_to_completion<T, O, W, C>(
    pool: &ThreadPool,
    items: &[T],
    stage: &'static str,
    work: W,
    mut on_complete: C,
) -> Result<(), EngineError>
where
    T: Sync,
    O: Send,
    W: Fn(&T) -> O + Sync,
    C: FnMut(usize, thread::Result<O>),
{
    let expected = items.len();
    let work = &work;
    let (sender, receiver) = mpsc::channel();

    pool.in_place_scope(|scope| {
        for (index, item) in items.iter().enumerate() {
            let sender = sender.clone();
            scope.spawn(move |_| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(item)));
                // A closed channel means the batch was already abandoned.
                let _ = sender.send((index, outcome));
            });
        }
        drop(sender);
        drain(&receiver, expected, stage, &mut on_complete)
    })
}

/// Receives `expected` outcomes, failing with `InterruptedWait` if every
/// sender is gone before they all arrive.
fn drain<O, C>(
    receiver: &mpsc::Receiver<(usize, O)>,
    expected: usize,
    stage: &'static str,
    on_complete: &mut C,
) -> Result<(), EngineError>
where
    C: FnMut(usize, O),
{
    for received in 0..expected {
        match receiver.recv() {
            Ok((index, outcome)) => on_complete(index, outcome),
            Err(_) => {
                return Err(EngineError::InterruptedWait {
                    stage,
                    received,
                    expected,
                });
            }
        }
    }
    Ok(())
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
