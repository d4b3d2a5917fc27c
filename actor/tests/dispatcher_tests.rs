// Dispatcher tests: queue sharing under the pooled policy and per-cell delivery order.

use actor::{
    Actor, ActorContext, ActorSystem, Dispatcher, Message, PooledDispatcher,
    SerialQueue,
};

use async_trait::async_trait;

use tokio::sync::Mutex as AsyncMutex;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// A user-supplied dispatcher wrapping the pooled policy and recording every
// assignment it hands out.
struct RecordingDispatcher {
    inner: PooledDispatcher,
    seen: Mutex<Vec<usize>>,
}

impl RecordingDispatcher {
    fn new(max_queues: usize) -> Self {
        Self {
            inner: PooledDispatcher::new(max_queues),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn assign_queue(&self) -> SerialQueue {
        let queue = self.inner.assign_queue();
        self.seen.lock().unwrap().push(queue.id());
        queue
    }
}

struct Collector {
    journal: Arc<AsyncMutex<Vec<usize>>>,
}

#[derive(Clone)]
struct Num(usize);

impl Message for Num {}

#[async_trait]
impl Actor for Collector {
    type Message = Num;

    async fn receive(&mut self, message: Num, _ctx: &ActorContext<Self>) {
        // Yield mid-message so overlapping delivery would scramble the journal.
        tokio::task::yield_now().await;
        self.journal.lock().await.push(message.0);
    }
}

// With a pool of two queues, the root takes the first assignment, the first user actor
// the second, and every further actor lands on one of the two by random choice: among
// three user actors at least two must share a queue.
#[tokio::test]
async fn test_pooled_dispatcher_shares_queues_across_actors() {
    let dispatcher = Arc::new(RecordingDispatcher::new(2));
    let system = ActorSystem::with_dispatcher("pooled", dispatcher.clone());

    for name in ["a", "b", "c"] {
        let journal = Arc::new(AsyncMutex::new(Vec::new()));
        system
            .spawn(name, move |_ctx: &ActorContext<Collector>| Collector {
                journal: journal.clone(),
            })
            .await
            .unwrap();
    }

    let seen = dispatcher.seen();
    // One assignment per cell: the root plus three user actors.
    assert_eq!(seen.len(), 4);
    let pool: HashSet<usize> = seen[..2].iter().copied().collect();
    assert_eq!(pool.len(), 2);
    for id in &seen[2..] {
        assert!(pool.contains(id), "assignment {} not from the pool", id);
    }
    let user: HashSet<usize> = seen[1..].iter().copied().collect();
    assert!(user.len() < 3, "three actors on two queues must share");

    system.shutdown().await;
    system.wait_for(Duration::from_secs(5)).await.unwrap();
}

// Messages sent in program order from one sender are delivered in that order, even
// when every actor in the tree shares a single queue.
#[tokio::test]
async fn test_per_cell_delivery_order_on_a_shared_queue() {
    let system = ActorSystem::with_dispatcher(
        "single-queue",
        Arc::new(PooledDispatcher::new(1)),
    );

    let first_journal = Arc::new(AsyncMutex::new(Vec::new()));
    let second_journal = Arc::new(AsyncMutex::new(Vec::new()));

    let journal = first_journal.clone();
    let first = system
        .spawn("first", move |_ctx: &ActorContext<Collector>| Collector {
            journal: journal.clone(),
        })
        .await
        .unwrap();
    let journal = second_journal.clone();
    let second = system
        .spawn("second", move |_ctx: &ActorContext<Collector>| Collector {
            journal: journal.clone(),
        })
        .await
        .unwrap();

    for i in 0..100 {
        first.tell(Num(i)).await;
        second.tell(Num(i)).await;
    }

    for _ in 0..500 {
        if first_journal.lock().await.len() == 100
            && second_journal.lock().await.len() == 100
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let expected: Vec<usize> = (0..100).collect();
    assert_eq!(*first_journal.lock().await, expected);
    assert_eq!(*second_journal.lock().await, expected);

    system.shutdown().await;
    system.wait_for(Duration::from_secs(5)).await.unwrap();
}
