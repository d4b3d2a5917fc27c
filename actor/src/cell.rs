// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor cell
//!
//! The `cell` module provides the runtime record behind every actor: the [`ActorCell`].
//! A cell owns the actor instance, the table of its children, and its lifecycle state,
//! and interprets the system messages that drive creation, termination and supervision.
//! Everything that touches the actor instance runs as a job on the cell's serial queue,
//! so actor state needs no locking of its own.
//!
//! Ownership runs strictly downward: a parent's children table holds the only strong
//! edges to child cells, references hold weak links, and the system holds the root.
//! A cell's lifetime is its membership in the parent's table.
//!

use crate::{
    ActorPath, Error, SystemMessage,
    actor::{Actor, ActorContext, SupervisorDirective},
    dispatcher::{Dispatcher, SerialQueue},
    reference::{ActorRef, CellLink, TypedActorRef},
};

use async_trait::async_trait;

use rand::{Rng, distributions::Alphanumeric};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use tracing::{debug, warn};

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

/// The untyped face of a concrete actor. The system interpreter calls lifecycle hooks
/// through this interface; user messages cross it as `Any` payloads and are downcast
/// on the typed side.
#[async_trait]
pub(crate) trait Behavior: Send {
    async fn receive_any(
        &mut self,
        cell: &Arc<ActorCell>,
        message: Box<dyn Any + Send>,
    );
    async fn will_stop(&mut self, cell: &Arc<ActorCell>);
    async fn post_stop(&mut self, cell: &Arc<ActorCell>);
    async fn child_terminated(&mut self, cell: &Arc<ActorCell>, child: ActorRef);
    async fn supervisor_strategy(
        &mut self,
        cell: &Arc<ActorCell>,
        error: Error,
    ) -> SupervisorDirective;
    async fn restart(&mut self, cell: &Arc<ActorCell>);
}

/// Typed holder binding a concrete actor to the untyped behaviour interface.
/// The captured constructor is what makes in-place restart possible.
struct ActorHolder<A: Actor> {
    actor: A,
    build: Arc<dyn Fn(&ActorContext<A>) -> A + Send + Sync>,
}

#[async_trait]
impl<A: Actor> Behavior for ActorHolder<A> {
    async fn receive_any(
        &mut self,
        cell: &Arc<ActorCell>,
        message: Box<dyn Any + Send>,
    ) {
        match message.downcast::<A::Message>() {
            Ok(message) => {
                let ctx = ActorContext::new(cell.clone());
                self.actor.receive(*message, &ctx).await;
            }
            Err(_) => {
                warn!(
                    "Actor {} received a message of an unexpected type, dropping.",
                    cell.path()
                );
            }
        }
    }

    async fn will_stop(&mut self, cell: &Arc<ActorCell>) {
        let ctx = ActorContext::new(cell.clone());
        self.actor.will_stop(&ctx).await;
    }

    async fn post_stop(&mut self, cell: &Arc<ActorCell>) {
        let ctx = ActorContext::new(cell.clone());
        self.actor.post_stop(&ctx).await;
    }

    async fn child_terminated(
        &mut self,
        cell: &Arc<ActorCell>,
        child: ActorRef,
    ) {
        let ctx = ActorContext::new(cell.clone());
        self.actor.child_terminated(child, &ctx).await;
    }

    async fn supervisor_strategy(
        &mut self,
        cell: &Arc<ActorCell>,
        error: Error,
    ) -> SupervisorDirective {
        let ctx = ActorContext::new(cell.clone());
        self.actor.supervisor_strategy(error, &ctx).await
    }

    async fn restart(&mut self, cell: &Arc<ActorCell>) {
        let ctx = ActorContext::new(cell.clone());
        let mut fresh = (self.build)(&ctx);
        fresh.pre_start(&ctx).await;
        self.actor = fresh;
    }
}

/// One entry of a cell's children table.
struct ChildRecord {
    reference: ActorRef,
    /// The owning edge. Dropping it is what frees the child cell once its pending
    /// queue jobs finish.
    cell: Arc<ActorCell>,
}

#[derive(Default)]
struct CellState {
    children: HashMap<String, ChildRecord>,
    /// Set once by the first `PoisonPill` and never cleared.
    dying: bool,
    /// Set once the cell has announced its termination. Guards `finish` reentry.
    stopped: bool,
}

/// The runtime record owning an actor, its queue binding and its children.
///
/// Lifecycle: a cell starts when its init job constructs the actor and runs
/// `pre_start`; it is stopping from the first `PoisonPill`; it is stopped once all
/// children are reaped, after which it announces `Terminated` upward, runs
/// `post_stop`, and releases the actor instance.
pub(crate) struct ActorCell {
    path: ActorPath,
    parent: Option<ActorRef>,
    dispatcher: Arc<dyn Dispatcher>,
    queue: SerialQueue,
    link: CellLink,
    state: Mutex<CellState>,
    behavior: Mutex<Option<Box<dyn Behavior>>>,
    gate: CancellationToken,
}

impl ActorCell {
    /// Creates the root cell of a tree. Used once per system; all other cells come
    /// from [`spawn_child`](ActorCell::spawn_child).
    pub(crate) fn create_root<A, F>(
        path: ActorPath,
        dispatcher: Arc<dyn Dispatcher>,
        gate: CancellationToken,
        build: F,
    ) -> (Arc<ActorCell>, ActorRef)
    where
        A: Actor,
        F: Fn(&ActorContext<A>) -> A + Send + Sync + 'static,
    {
        let queue = dispatcher.assign_queue();
        let link: CellLink = Arc::new(RwLock::new(None));
        let cell = Arc::new_cyclic(|weak: &Weak<ActorCell>| {
            if let Ok(mut slot) = link.write() {
                *slot = Some(weak.clone());
            }
            ActorCell {
                path: path.clone(),
                parent: None,
                dispatcher,
                queue,
                link: link.clone(),
                state: Mutex::new(CellState::default()),
                behavior: Mutex::new(None),
                gate,
            }
        });
        cell.clone().submit_init(Arc::new(build));
        let reference = ActorRef::new(path, link);
        (cell, reference)
    }

    pub(crate) fn path(&self) -> &ActorPath {
        &self.path
    }

    /// Returns a fresh untyped reference to this cell.
    pub(crate) fn this(&self) -> ActorRef {
        ActorRef::new(self.path.clone(), self.link.clone())
    }

    pub(crate) fn parent_ref(&self) -> Option<ActorRef> {
        self.parent.clone()
    }

    pub(crate) async fn lookup_child(&self, name: &str) -> Option<ActorRef> {
        let state = self.state.lock().await;
        state
            .children
            .get(name)
            .map(|child| child.reference.clone())
    }

    pub(crate) async fn children(&self) -> Vec<ActorRef> {
        let state = self.state.lock().await;
        state
            .children
            .values()
            .map(|child| child.reference.clone())
            .collect()
    }

    /// Spawns a child cell under this one.
    ///
    /// The requested name is normalized first: an empty name, a name containing `/`,
    /// or the reserved `.`/`..` segments are replaced by a fresh identifier, as is a
    /// name already taken by a live sibling. Name reservation, cell construction and
    /// table insertion happen under one hold of the state lock, and the child's init
    /// job is submitted before its reference escapes, so the init job is always the
    /// first job the child's queue runs for it.
    pub(crate) async fn spawn_child<C, F>(
        self: Arc<Self>,
        name: &str,
        build: F,
    ) -> Result<TypedActorRef<C>, Error>
    where
        C: Actor,
        F: Fn(&ActorContext<C>) -> C + Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        if state.dying || state.stopped {
            warn!(
                "Actor {} is stopping and refused to spawn '{}'.",
                self.path, name
            );
            return Err(Error::Stopped(self.path.clone()));
        }
        let mut name = name.to_owned();
        if !is_valid_name(&name) {
            let substitute = fresh_identifier();
            warn!(
                "Invalid actor name '{}', substituting '{}'.",
                name, substitute
            );
            name = substitute;
        }
        while state.children.contains_key(&name) {
            let substitute = fresh_identifier();
            warn!(
                "Actor {} already has a child named '{}', substituting '{}'.",
                self.path, name, substitute
            );
            name = substitute;
        }
        let path = self.path.clone() / name.as_str();
        let queue = self.dispatcher.assign_queue();
        let link: CellLink = Arc::new(RwLock::new(None));
        let child = Arc::new_cyclic(|weak: &Weak<ActorCell>| {
            if let Ok(mut slot) = link.write() {
                *slot = Some(weak.clone());
            }
            ActorCell {
                path: path.clone(),
                parent: Some(self.this()),
                dispatcher: self.dispatcher.clone(),
                queue,
                link: link.clone(),
                state: Mutex::new(CellState::default()),
                behavior: Mutex::new(None),
                gate: self.gate.clone(),
            }
        });
        child.clone().submit_init(Arc::new(build));
        let reference = ActorRef::new(path, link);
        state.children.insert(
            name,
            ChildRecord {
                reference: reference.clone(),
                cell: child,
            },
        );
        debug!("Actor {} spawned child {}.", self.path, reference.path());
        Ok(TypedActorRef::new(reference))
    }

    /// Submits the init job: construct the actor, run `pre_start`, install the
    /// behaviour. Runs on the cell's own queue ahead of any delivery.
    fn submit_init<A>(
        self: Arc<Self>,
        build: Arc<dyn Fn(&ActorContext<A>) -> A + Send + Sync>,
    ) where
        A: Actor,
    {
        let queue = self.queue.clone();
        queue.submit(Box::pin(async move {
            let ctx = ActorContext::new(self.clone());
            let mut actor = (build)(&ctx);
            actor.pre_start(&ctx).await;
            let mut behavior = self.behavior.lock().await;
            *behavior = Some(Box::new(ActorHolder { actor, build }));
            debug!("Actor {} started.", self.path);
        }));
    }

    /// Enqueues a system message on this cell's queue.
    pub(crate) fn enqueue_system(self: Arc<Self>, message: SystemMessage) {
        let queue = self.queue.clone();
        queue.submit(Box::pin(async move {
            self.handle_system(message).await;
        }));
    }

    /// Enqueues a user message, unless the cell is already stopping.
    ///
    /// The stopping state is checked twice: here, so a dying cell accepts nothing new,
    /// and again at delivery, so messages that were already queued behind a poison
    /// pill are dropped rather than handled.
    pub(crate) async fn deliver_user(
        self: Arc<Self>,
        message: Box<dyn Any + Send>,
    ) {
        {
            let state = self.state.lock().await;
            if state.dying || state.stopped {
                warn!(
                    "Actor {} is stopping, dropping new user message.",
                    self.path
                );
                return;
            }
        }
        let queue = self.queue.clone();
        queue.submit(Box::pin(async move {
            {
                let state = self.state.lock().await;
                if state.dying || state.stopped {
                    debug!(
                        "Actor {} stopped before delivery, dropping queued user message.",
                        self.path
                    );
                    return;
                }
            }
            let mut behavior = self.behavior.lock().await;
            match behavior.as_mut() {
                Some(behavior) => behavior.receive_any(&self, message).await,
                None => {
                    warn!(
                        "Actor {} has no behaviour installed, dropping user message.",
                        self.path
                    );
                }
            }
        }));
    }

    /// The system message interpreter. Always runs on the cell's serial queue, so its
    /// side effects on the children table and lifecycle flags are serialized.
    async fn handle_system(self: Arc<Self>, message: SystemMessage) {
        match message {
            SystemMessage::PoisonPill => self.on_poison_pill().await,
            SystemMessage::Terminated(child) => self.on_terminated(child).await,
            SystemMessage::Error(error) => self.on_error(error).await,
            SystemMessage::DeadLetter(original) => {
                warn!(
                    "Actor {} received a dead letter: {:?}.",
                    self.path, original
                );
            }
        }
    }

    async fn on_poison_pill(self: Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            if state.dying || state.stopped {
                warn!(
                    "Actor {} received a duplicate PoisonPill, dropping.",
                    self.path
                );
                return;
            }
            state.dying = true;
        }
        {
            let mut behavior = self.behavior.lock().await;
            if let Some(behavior) = behavior.as_mut() {
                behavior.will_stop(&self).await;
            }
        }
        let children: Vec<ActorRef> = {
            let state = self.state.lock().await;
            state
                .children
                .values()
                .map(|child| child.reference.clone())
                .collect()
        };
        if children.is_empty() {
            self.finish().await;
        } else {
            debug!(
                "Actor {} is stopping, poisoning {} children.",
                self.path,
                children.len()
            );
            for child in children {
                child.tell_system(SystemMessage::PoisonPill).await;
            }
        }
    }

    async fn on_terminated(self: Arc<Self>, child: ActorRef) {
        {
            let mut behavior = self.behavior.lock().await;
            match behavior.as_mut() {
                Some(behavior) => {
                    behavior.child_terminated(&self, child.clone()).await;
                }
                None => {
                    debug!(
                        "Actor {} reaping child {} after its own stop.",
                        self.path,
                        child.path()
                    );
                }
            }
        }
        let finished = {
            let mut state = self.state.lock().await;
            // Removal is idempotent: a stale or duplicate Terminated misses the table.
            if let Some(record) = state.children.remove(&child.path().key()) {
                record.reference.invalidate();
                drop(record.cell);
            }
            state.dying && state.children.is_empty() && !state.stopped
        };
        if finished {
            self.finish().await;
        }
    }

    async fn on_error(self: Arc<Self>, error: Error) {
        let directive = {
            let mut behavior = self.behavior.lock().await;
            match behavior.as_mut() {
                Some(behavior) => {
                    behavior.supervisor_strategy(&self, error.clone()).await
                }
                None => {
                    warn!(
                        "Actor {} received an error after stopping: {}.",
                        self.path, error
                    );
                    return;
                }
            }
        };
        match directive {
            SupervisorDirective::Ignore => {
                debug!("Actor {} ignored failure: {}.", self.path, error);
            }
            SupervisorDirective::Restart => {
                debug!(
                    "Actor {} restarting after failure: {}.",
                    self.path, error
                );
                let mut behavior = self.behavior.lock().await;
                if let Some(behavior) = behavior.as_mut() {
                    behavior.restart(&self).await;
                }
            }
            SupervisorDirective::Stop => {
                debug!(
                    "Actor {} stopping after failure: {}.",
                    self.path, error
                );
                self.enqueue_system(SystemMessage::PoisonPill);
            }
            SupervisorDirective::Escalate => match &self.parent {
                Some(parent) => {
                    debug!(
                        "Actor {} escalating failure to {}.",
                        self.path,
                        parent.path()
                    );
                    parent.tell_system(SystemMessage::Error(error)).await;
                }
                None => {
                    warn!(
                        "Failure escalated to the root guardian, dropping: {}.",
                        error
                    );
                }
            },
        }
    }

    /// Terminal transition, taken exactly once: announce `Terminated` upward (or, at
    /// the root, release the system's shutdown gate), run `post_stop`, and release
    /// the actor instance. A child's link is nulled by the parent's reaper; the root
    /// nulls its own before opening the gate.
    async fn finish(self: Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            if state.stopped {
                return;
            }
            state.stopped = true;
        }
        debug!("Actor {} is stopped.", self.path);
        match &self.parent {
            Some(parent) => {
                parent
                    .tell_system(SystemMessage::Terminated(self.this()))
                    .await;
                let mut behavior = self.behavior.lock().await;
                if let Some(behavior) = behavior.as_mut() {
                    behavior.post_stop(&self).await;
                }
                *behavior = None;
            }
            None => {
                {
                    let mut behavior = self.behavior.lock().await;
                    if let Some(behavior) = behavior.as_mut() {
                        behavior.post_stop(&self).await;
                    }
                    *behavior = None;
                }
                if let Ok(mut slot) = self.link.write() {
                    slot.take();
                }
                debug!(
                    "Root actor {} terminated, releasing the system.",
                    self.path
                );
                self.gate.cancel();
            }
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}

/// A fresh random identifier for anonymous or conflicting actor names.
fn fresh_identifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_name_validity() {
        assert!(is_valid_name("worker"));
        assert!(is_valid_name("worker-1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name("."));
        assert!(!is_valid_name(".."));
    }

    #[test]
    fn test_fresh_identifiers_differ() {
        let first = fresh_identifier();
        let second = fresh_identifier();
        assert_eq!(first.len(), 10);
        assert_ne!(first, second);
    }
}
