// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor system
//!
//! The `system` module provides the `ActorSystem` type. The `ActorSystem` type is the
//! root of a supervision tree: it owns the dispatcher and the `/user` root cell, spawns
//! the top-level actors, resolves absolute paths, and offers the shutdown wait.
//!

use crate::{
    ActorPath, Error, Message,
    actor::{Actor, ActorContext},
    cell::ActorCell,
    dispatcher::{DedicatedDispatcher, Dispatcher},
    reference::{ActorRef, TypedActorRef},
};

use async_trait::async_trait;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use tracing::debug;

use std::sync::Arc;
use std::time::Duration;

/// The root guardian's message type. It has no values, so the guardian can never
/// receive a user message.
#[derive(Clone, Debug)]
pub enum GuardianMessage {}

impl Message for GuardianMessage {}

/// The trivial actor installed at `/user`. Its default `supervisor_strategy` is the
/// final stopping point of escalation: failures that reach it are ignored.
struct Guardian;

#[async_trait]
impl Actor for Guardian {
    type Message = GuardianMessage;

    async fn receive(
        &mut self,
        message: GuardianMessage,
        _ctx: &ActorContext<Self>,
    ) {
        match message {}
    }
}

/// Actor system.
///
/// Owns the dispatcher and the root of the supervision tree. Cloning the system is
/// cheap and yields another handle onto the same tree.
///
/// A system must be created inside a tokio runtime: every cell's serial queue runs as
/// a spawned task.
pub struct ActorSystem {
    name: String,
    dispatcher: Arc<dyn Dispatcher>,
    root: ActorRef,
    root_cell: Arc<ActorCell>,
    gate: CancellationToken,
}

impl ActorSystem {
    /// Creates an actor system with the default per-cell dispatcher.
    pub fn new(name: &str) -> Self {
        Self::with_dispatcher(name, Arc::new(DedicatedDispatcher))
    }

    /// Creates an actor system over a caller-supplied dispatcher.
    ///
    /// # Arguments
    ///
    /// * `name` - The system name, used for logging only.
    /// * `dispatcher` - The queue assignment policy for every cell in the tree.
    ///
    pub fn with_dispatcher(
        name: &str,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let gate = CancellationToken::new();
        let (root_cell, root) = ActorCell::create_root(
            ActorPath::from("/user"),
            dispatcher.clone(),
            gate.clone(),
            |_ctx: &ActorContext<Guardian>| Guardian,
        );
        debug!("Actor system '{}' created.", name);
        Self {
            name: name.to_owned(),
            dispatcher,
            root,
            root_cell,
            gate,
        }
    }

    /// Returns the system name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the reference of the `/user` root.
    pub fn root(&self) -> ActorRef {
        self.root.clone()
    }

    /// Spawns a top-level actor under `/user`.
    ///
    /// # Arguments
    ///
    /// * `name` - The requested short name; normalized like any child name.
    /// * `build` - The constructor invoked with the actor's context.
    ///
    /// # Returns
    ///
    /// Returns the typed reference of the new actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the system is already shutting down.
    ///
    pub async fn spawn<A, F>(
        &self,
        name: &str,
        build: F,
    ) -> Result<TypedActorRef<A>, Error>
    where
        A: Actor,
        F: Fn(&ActorContext<A>) -> A + Send + Sync + 'static,
    {
        self.root_cell.clone().spawn_child(name, build).await
    }

    /// Resolves a path string against the tree. Absolute and relative forms are both
    /// accepted; relative paths resolve from the root, so `"a"` and `"/user/a"` name
    /// the same actor.
    pub async fn find(&self, path: &str) -> Option<ActorRef> {
        self.root.find(path).await
    }

    /// Resolves absolute path segments. The first segment must be `user`; the
    /// `system` and `deadLetter` roots are reserved but not implemented.
    pub async fn resolve(&self, segments: &[&str]) -> Option<ActorRef> {
        match segments.split_first() {
            Some((&"user", rest)) => self.root.resolve(rest).await,
            _ => None,
        }
    }

    /// Starts the shutdown cascade by poisoning the root cell. The call returns
    /// immediately; use [`wait`](ActorSystem::wait) to observe completion.
    pub async fn shutdown(&self) {
        debug!("Shutting down actor system '{}'.", self.name);
        self.root.stop().await;
    }

    /// Waits until the shutdown cascade has fully completed, that is, until every
    /// cell in the tree has been reaped and the root has terminated.
    pub async fn wait(&self) {
        self.gate.cancelled().await;
    }

    /// Bounded variant of [`wait`](ActorSystem::wait).
    ///
    /// # Errors
    ///
    /// Returns `Error::Timeout` if the system did not terminate in time.
    ///
    pub async fn wait_for(&self, limit: Duration) -> Result<(), Error> {
        timeout(limit, self.gate.cancelled())
            .await
            .map_err(|_| Error::Timeout)
    }
}

impl Clone for ActorSystem {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dispatcher: self.dispatcher.clone(),
            root: self.root.clone(),
            root_cell: self.root_cell.clone(),
            gate: self.gate.clone(),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[derive(Debug, Clone)]
    struct NoopActor;

    #[derive(Debug, Clone)]
    struct Ping;

    impl Message for Ping {}

    #[async_trait]
    impl Actor for NoopActor {
        type Message = Ping;

        async fn receive(&mut self, _message: Ping, _ctx: &ActorContext<Self>) {
        }
    }

    #[tokio::test]
    async fn test_shutdown_releases_wait() {
        let system = ActorSystem::new("test");
        system
            .spawn("worker", |_ctx: &ActorContext<NoopActor>| NoopActor)
            .await
            .expect("spawn failed");
        system.shutdown().await;
        system
            .wait_for(Duration::from_secs(5))
            .await
            .expect("system did not terminate");
    }

    #[tokio::test]
    async fn test_wait_for_times_out_while_running() {
        let system = ActorSystem::new("test");
        let result = system.wait_for(Duration::from_millis(50)).await;
        assert_eq!(result, Err(Error::Timeout));
    }

    #[tokio::test]
    async fn test_find_requires_user_root() {
        let system = ActorSystem::new("test");
        system
            .spawn("worker", |_ctx: &ActorContext<NoopActor>| NoopActor)
            .await
            .expect("spawn failed");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(system.find("/user/worker").await.is_some());
        assert!(system.find("worker").await.is_some());
        assert!(system.find("/system/worker").await.is_none());
        assert!(system.find("/deadLetter").await.is_none());
        assert!(system.find("/").await.is_none());
        assert!(system.find("").await.is_none());
        assert!(system.resolve(&["user", "worker"]).await.is_some());
        assert!(system.resolve(&["system"]).await.is_none());
    }
}
