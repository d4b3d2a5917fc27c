// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Message taxonomy
//!
//! The `message` module defines what travels through a mailbox: opaque user payloads,
//! declared per actor through the [`Message`] marker trait, and the small set of
//! [`SystemMessage`] variants that drive the cell lifecycle.
//!

use crate::{ActorRef, Error};

/// Defines what an actor can receive as its user message.
pub trait Message: Clone + Send + Sync + 'static {}

/// System-level control messages interpreted by the cell itself.
///
/// User code normally only ever sends `PoisonPill`, through [`ActorRef::stop`] or
/// directly; the remaining variants are emitted by the runtime as part of the stop
/// cascade and failure handling.
#[derive(Clone, Debug)]
pub enum SystemMessage {
    /// Cooperative termination. The first pill puts the cell into its stopping state;
    /// any further pill is dropped with a warning.
    PoisonPill,

    /// Sent by a fully stopped child to its parent, exactly once per cell lifetime,
    /// carrying the child's own reference.
    Terminated(ActorRef),

    /// An application failure to be judged by the receiving actor's supervisor hook.
    Error(Error),

    /// A message that could not be delivered. The interpreter logs it and drops it;
    /// a dedicated dead-letter subtree is reserved but not implemented.
    DeadLetter(Box<SystemMessage>),
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_system_message_is_cloneable() {
        let msg = SystemMessage::Error(Error::Failure("x".to_owned()));
        let copy = msg.clone();
        match copy {
            SystemMessage::Error(Error::Failure(cause)) => {
                assert_eq!(cause, "x")
            }
            _ => panic!("unexpected variant"),
        }
    }
}
