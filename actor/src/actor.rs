// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor
//!
//! The `actor` module provides the [`Actor`] trait, the main trait that actors must
//! implement, and the [`ActorContext`] type, the actor's window onto its own cell.
//! The context is passed into every hook and message handler, and is where `spawn`,
//! `find` and the rest of the tree operations are reached from.
//!

use crate::{
    ActorPath, Error, Message, SystemMessage,
    cell::ActorCell,
    reference::{ActorRef, TypedActorRef},
};

use async_trait::async_trait;

use std::marker::PhantomData;
use std::sync::Arc;

/// What a supervisor decides to do with a failure delivered to its actor.
///
/// Returned by [`Actor::supervisor_strategy`]. The default is `Ignore`.
#[derive(Clone, Debug, PartialEq)]
pub enum SupervisorDirective {
    /// Drop the failure and keep running.
    Ignore,
    /// Rebuild the actor in place from its captured constructor and run `pre_start`
    /// on the fresh instance. The mailbox and children are untouched.
    Restart,
    /// Stop this actor by sending it a `PoisonPill`.
    Stop,
    /// Forward the failure to the parent as an `Error` system message. Escalation
    /// ends at the root guardian, which ignores.
    Escalate,
}

/// The `Actor` trait is the main trait that actors must implement.
///
/// An actor declares its user-message type, a `receive` handler for it, and a set of
/// lifecycle hooks with no-op defaults. All of them run on the cell's serial queue, so
/// the actor may freely mutate itself without additional locking.
#[async_trait]
pub trait Actor: Send + Sync + Sized + 'static {
    /// The type of the user messages that the actor can receive.
    type Message: Message;

    /// Handles one user message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to handle.
    /// * `ctx` - The actor context.
    ///
    async fn receive(
        &mut self,
        message: Self::Message,
        ctx: &ActorContext<Self>,
    );

    /// Called once before the first message, right after construction.
    async fn pre_start(&mut self, _ctx: &ActorContext<Self>) {}

    /// Called when the first `PoisonPill` is interpreted, before any child is asked
    /// to stop.
    async fn will_stop(&mut self, _ctx: &ActorContext<Self>) {}

    /// Called exactly once after the cell has announced its termination. No hook or
    /// handler runs after this.
    async fn post_stop(&mut self, _ctx: &ActorContext<Self>) {}

    /// Called when a child has fully stopped, before the child is removed from the
    /// children table.
    ///
    /// # Arguments
    ///
    /// * `child` - The terminated child's reference. Its cell link is dead or dying.
    /// * `ctx` - The actor context.
    ///
    async fn child_terminated(
        &mut self,
        _child: ActorRef,
        _ctx: &ActorContext<Self>,
    ) {
    }

    /// Decides what to do with a failure delivered to this actor as an `Error`
    /// system message.
    ///
    /// # Returns
    ///
    /// Returns the directive to apply. The default ignores the failure.
    ///
    async fn supervisor_strategy(
        &mut self,
        _error: Error,
        _ctx: &ActorContext<Self>,
    ) -> SupervisorDirective {
        SupervisorDirective::Ignore
    }
}

/// The `ActorContext` is the context of the actor.
///
/// It is handed to every hook and handler invocation and gives the actor read access
/// to its place in the tree: its own reference, its parent, its children, and the
/// operations to grow or shrink the tree underneath it.
pub struct ActorContext<A: Actor> {
    cell: Arc<ActorCell>,
    phantom: PhantomData<A>,
}

impl<A: Actor> ActorContext<A> {
    pub(crate) fn new(cell: Arc<ActorCell>) -> Self {
        Self {
            cell,
            phantom: PhantomData,
        }
    }

    /// Returns the path of this actor.
    pub fn path(&self) -> &ActorPath {
        self.cell.path()
    }

    /// Returns the typed reference to this actor.
    pub fn this(&self) -> TypedActorRef<A> {
        TypedActorRef::new(self.cell.this())
    }

    /// Returns the reference to the parent actor, absent only at the root.
    pub fn parent(&self) -> Option<ActorRef> {
        self.cell.parent_ref()
    }

    /// Returns the references of the currently live children.
    pub async fn children(&self) -> Vec<ActorRef> {
        self.cell.children().await
    }

    /// Create a child actor under this actor.
    ///
    /// # Arguments
    ///
    /// * `name` - The requested short name. An empty or malformed name, or one already
    ///   taken by a sibling, is replaced by a fresh identifier with a warning.
    /// * `build` - The constructor invoked with the child's context. It is captured by
    ///   the cell so the supervisor can rebuild the actor on restart.
    ///
    /// # Returns
    ///
    /// Returns the typed reference of the child actor.
    ///
    /// # Errors
    ///
    /// Returns an error if this actor is already stopping.
    ///
    pub async fn spawn<C, F>(
        &self,
        name: &str,
        build: F,
    ) -> Result<TypedActorRef<C>, Error>
    where
        C: Actor,
        F: Fn(&ActorContext<C>) -> C + Send + Sync + 'static,
    {
        self.cell.clone().spawn_child(name, build).await
    }

    /// Resolves a path string from this actor. See [`ActorRef::find`].
    pub async fn find(&self, path: &str) -> Option<ActorRef> {
        self.cell.this().find(path).await
    }

    /// Resolves path segments from this actor. See [`ActorRef::resolve`].
    pub async fn resolve(&self, segments: &[&str]) -> Option<ActorRef> {
        self.cell.this().resolve(segments).await
    }

    /// Stops this actor by enqueueing a `PoisonPill` on its own mailbox.
    pub async fn stop(&self) {
        self.cell.clone().enqueue_system(SystemMessage::PoisonPill);
    }

    /// Signals a failure of this actor to itself. The failure is judged by
    /// [`Actor::supervisor_strategy`] on a later mailbox turn.
    pub async fn fail(&self, error: Error) {
        self.cell.clone().enqueue_system(SystemMessage::Error(error));
    }
}
