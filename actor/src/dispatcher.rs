// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Dispatcher
//!
//! The `dispatcher` module hands out serial execution queues to cells. A [`SerialQueue`]
//! runs submitted jobs strictly FIFO with no overlap, which is what lets an actor mutate
//! its own state without further locking. The [`Dispatcher`] trait decides how queues map
//! onto cells: one private queue per cell, or a bounded shared pool.
//!

use futures::future::BoxFuture;

use rand::{Rng, SeedableRng, rngs::StdRng};

use tokio::sync::mpsc;

use tracing::debug;

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};

/// A unit of work scheduled on a serial queue.
pub(crate) type Job = BoxFuture<'static, ()>;

static NEXT_QUEUE_ID: AtomicUsize = AtomicUsize::new(0);

/// A serial execution queue.
///
/// Jobs submitted to a `SerialQueue` run one at a time, in submission order, on a single
/// consumer task. Cloning the handle does not clone the consumer: all clones feed the same
/// queue, and two handles with the same [`id`](SerialQueue::id) are the same executor.
///
/// Cells bound to the same queue serialize against each other, so user code must not block
/// inside `receive` when a shared dispatcher is in use.
#[derive(Clone)]
pub struct SerialQueue {
    id: usize,
    jobs: mpsc::UnboundedSender<Job>,
}

impl SerialQueue {
    /// Creates a queue and spawns its consumer task. The task drains jobs until every
    /// handle to the queue has been dropped.
    pub(crate) fn spawn() -> Self {
        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let (jobs, mut receiver) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job.await;
            }
            debug!("Serial queue {} drained and closed.", id);
        });
        Self { id, jobs }
    }

    /// Returns the queue identity. Two handles with equal ids share one consumer.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Submits a job for execution after every previously submitted job has completed.
    pub(crate) fn submit(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            debug!("Serial queue {} is closed, job dropped.", self.id);
        }
    }
}

/// Assigns serial queues to cells.
///
/// The runtime calls [`assign_queue`](Dispatcher::assign_queue) exactly once per cell it
/// creates. Any user-supplied implementation is accepted.
pub trait Dispatcher: Send + Sync + 'static {
    /// Returns the queue the next cell will be bound to for its whole life.
    fn assign_queue(&self) -> SerialQueue;
}

/// The per-cell policy: every call returns a freshly created queue.
///
/// Unbounded in the worst case. This is the default policy and the right one for tests,
/// where blocking a queue must never stall an unrelated actor.
#[derive(Default)]
pub struct DedicatedDispatcher;

impl Dispatcher for DedicatedDispatcher {
    fn assign_queue(&self) -> SerialQueue {
        SerialQueue::spawn()
    }
}

/// The shared-pool policy: at most `max_queues` queues, reused across cells.
///
/// The first `max_queues` assignments create and record new queues; every later
/// assignment returns one of the recorded queues chosen uniformly at random. The pool
/// and its random source sit behind one mutex, so a queue observed by one thread is in
/// the pool for every other thread at selection time.
pub struct PooledDispatcher {
    max_queues: usize,
    pool: Mutex<(Vec<SerialQueue>, StdRng)>,
}

impl PooledDispatcher {
    /// Creates a pool holding at most `max_queues` queues (clamped to at least one).
    /// The random source is seeded from the wall clock at construction.
    pub fn new(max_queues: usize) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self {
            max_queues: max_queues.max(1),
            pool: Mutex::new((Vec::new(), StdRng::seed_from_u64(seed))),
        }
    }
}

impl Dispatcher for PooledDispatcher {
    fn assign_queue(&self) -> SerialQueue {
        let mut guard = match self.pool.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (pool, rng) = &mut *guard;
        if pool.len() < self.max_queues {
            let queue = SerialQueue::spawn();
            debug!(
                "Pooled dispatcher created queue {} ({}/{}).",
                queue.id(),
                pool.len() + 1,
                self.max_queues
            );
            pool.push(queue.clone());
            queue
        } else {
            let index = rng.gen_range(0..pool.len());
            pool[index].clone()
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex as AsyncMutex;

    #[tokio::test]
    async fn test_serial_queue_runs_fifo_without_overlap() {
        let queue = SerialQueue::spawn();
        let journal = Arc::new(AsyncMutex::new(Vec::new()));
        for i in 0..10usize {
            let journal = journal.clone();
            queue.submit(Box::pin(async move {
                journal.lock().await.push(format!("start {}", i));
                // Yield inside the job so overlapping execution would interleave.
                tokio::time::sleep(Duration::from_millis(2)).await;
                journal.lock().await.push(format!("end {}", i));
            }));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        let journal = journal.lock().await;
        let expected: Vec<String> = (0..10usize)
            .flat_map(|i| [format!("start {}", i), format!("end {}", i)])
            .collect();
        assert_eq!(*journal, expected);
    }

    #[tokio::test]
    async fn test_dedicated_dispatcher_always_creates() {
        let dispatcher = DedicatedDispatcher;
        let first = dispatcher.assign_queue();
        let second = dispatcher.assign_queue();
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_pooled_dispatcher_reuses_after_capacity() {
        let dispatcher = PooledDispatcher::new(2);
        let first = dispatcher.assign_queue();
        let second = dispatcher.assign_queue();
        assert_ne!(first.id(), second.id());
        for _ in 0..20 {
            let reused = dispatcher.assign_queue();
            assert!(
                reused.id() == first.id() || reused.id() == second.id(),
                "assignment beyond capacity must reuse a pooled queue"
            );
        }
    }

    #[tokio::test]
    async fn test_pooled_dispatcher_clamps_zero_capacity() {
        let dispatcher = PooledDispatcher::new(0);
        let first = dispatcher.assign_queue();
        let second = dispatcher.assign_queue();
        assert_eq!(first.id(), second.id());
    }
}
