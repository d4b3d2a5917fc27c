// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor references
//!
//! The `reference` module provides the handles used to address actors. [`ActorRef`] is the
//! untyped core: it carries the actor's path and a weak link to its cell, and accepts
//! system messages. [`TypedActorRef`] wraps it with a statically typed user-message entry
//! point for one concrete actor type.
//!
//! A reference may outlive its cell. When the cell is reaped the link is nulled, and every
//! clone of the reference observes the dead link; sends through a dead reference are
//! dropped with a log line rather than surfaced as errors.
//!

use crate::{
    ActorPath, SystemMessage,
    actor::Actor,
    cell::ActorCell,
};

use tracing::debug;

use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, Weak};

/// The shared slot behind every reference to one cell. Reaping nulls the slot, which
/// kills the link for all clones at once.
pub(crate) type CellLink = Arc<RwLock<Option<Weak<ActorCell>>>>;

/// Untyped actor reference.
///
/// This is a shareable lookup handle addressing a cell by path. It does not own the cell;
/// ownership lives in the parent's children table. All operations are safe to call from
/// any thread and ultimately hand work to the cell's serial queue.
pub struct ActorRef {
    path: ActorPath,
    link: CellLink,
}

impl ActorRef {
    /// Creates a reference over an existing link slot.
    pub(crate) fn new(path: ActorPath, link: CellLink) -> Self {
        Self { path, link }
    }

    /// Returns the path this reference addresses.
    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    /// Returns the live cell behind this reference, if it has not been reaped.
    pub(crate) fn upgrade(&self) -> Option<Arc<ActorCell>> {
        match self.link.read() {
            Ok(slot) => slot.as_ref().and_then(Weak::upgrade),
            Err(_) => None,
        }
    }

    /// Marks the link dead for every clone of this reference.
    pub(crate) fn invalidate(&self) {
        if let Ok(mut slot) = self.link.write() {
            slot.take();
        }
    }

    /// Returns true if the cell behind this reference is gone.
    pub fn is_closed(&self) -> bool {
        self.upgrade().is_none()
    }

    /// Sends a system message to the cell's mailbox.
    ///
    /// If the cell has already been reaped the message is dropped.
    pub async fn tell_system(&self, message: SystemMessage) {
        match self.upgrade() {
            Some(cell) => cell.enqueue_system(message),
            None => {
                debug!(
                    "Dropping system message for stopped actor {}.",
                    self.path
                );
            }
        }
    }

    /// Sends a `PoisonPill`, starting the cooperative stop cascade.
    pub async fn stop(&self) {
        self.tell_system(SystemMessage::PoisonPill).await;
    }

    /// Resolves a sequence of path segments relative to this reference.
    ///
    /// `.` stays on the current actor, `..` climbs to the parent (and fails at the
    /// root), and any other segment selects a child by short name.
    pub async fn resolve(&self, segments: &[&str]) -> Option<ActorRef> {
        let mut current = self.clone();
        for segment in segments {
            match *segment {
                "." => {}
                ".." => {
                    let cell = current.upgrade()?;
                    current = cell.parent_ref()?;
                }
                name => {
                    let cell = current.upgrade()?;
                    current = cell.lookup_child(name).await?;
                }
            }
        }
        Some(current)
    }

    /// Resolves a path string relative to this reference.
    ///
    /// A leading `/` makes the path absolute: resolution restarts from the tree root,
    /// whose short name must match the first real segment (only the `user` root exists).
    /// A single trailing `/` is tolerated. Malformed or unknown paths yield `None`.
    pub async fn find(&self, path: &str) -> Option<ActorRef> {
        let mut parts: Vec<&str> = path.split('/').collect();
        if parts.last().is_some_and(|last| last.is_empty()) {
            parts.pop();
        }
        if parts.is_empty() {
            return None;
        }
        if parts[0].is_empty() {
            let rest = &parts[1..];
            if rest.is_empty() {
                return None;
            }
            let mut root = self.clone();
            loop {
                let cell = root.upgrade()?;
                match cell.parent_ref() {
                    Some(parent) => root = parent,
                    None => break,
                }
            }
            if rest[0] != root.path().key() {
                return None;
            }
            root.resolve(&rest[1..]).await
        } else {
            self.resolve(&parts).await
        }
    }
}

impl Clone for ActorRef {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            link: self.link.clone(),
        }
    }
}

impl Display for ActorRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Ref: {}>", self.path)
    }
}

impl Debug for ActorRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Ref: {}>", self.path)
    }
}

/// Typed actor reference.
///
/// Narrows the accepted user-message type to the target actor's declared message type.
/// Everything else delegates to the untyped core, which remains reachable through
/// [`untyped`](TypedActorRef::untyped).
pub struct TypedActorRef<A>
where
    A: Actor,
{
    inner: ActorRef,
    phantom: PhantomData<A>,
}

impl<A> TypedActorRef<A>
where
    A: Actor,
{
    pub(crate) fn new(inner: ActorRef) -> Self {
        Self {
            inner,
            phantom: PhantomData,
        }
    }

    /// Returns the path this reference addresses.
    pub fn path(&self) -> &ActorPath {
        self.inner.path()
    }

    /// Returns the untyped core of this reference.
    pub fn untyped(&self) -> ActorRef {
        self.inner.clone()
    }

    /// Returns true if the cell behind this reference is gone.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Sends a user message to the actor's mailbox.
    ///
    /// The message is dropped with a log line if the cell is gone or already stopping:
    /// a stopping cell accepts no new user messages.
    pub async fn tell(&self, message: A::Message) {
        match self.inner.upgrade() {
            Some(cell) => cell.deliver_user(Box::new(message)).await,
            None => {
                debug!(
                    "Dropping user message for stopped actor {}.",
                    self.inner.path()
                );
            }
        }
    }

    /// Sends a `PoisonPill`, starting the cooperative stop cascade.
    pub async fn stop(&self) {
        self.inner.stop().await;
    }

    /// Resolves a path string relative to this reference. See [`ActorRef::find`].
    pub async fn find(&self, path: &str) -> Option<ActorRef> {
        self.inner.find(path).await
    }
}

impl<A> Clone for TypedActorRef<A>
where
    A: Actor,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            phantom: PhantomData,
        }
    }
}

impl<A> Display for TypedActorRef<A>
where
    A: Actor,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<A> Debug for TypedActorRef<A>
where
    A: Actor,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.inner, f)
    }
}
