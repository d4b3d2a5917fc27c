// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Hierarchical actor runtime
//!
//! This crate provides a lightweight, hierarchical actor runtime. It is based on the
//! [actor model](https://en.wikipedia.org/wiki/Actor_model) as described by Carl Hewitt in 1973.
//!
//! Actors are message-processing entities with private state, arranged in a supervision
//! tree rooted at `/user`. In response to a message that it receives, an actor can:
//!
//! - make local decisions
//! - update its private state
//! - create more actors
//! - send more messages
//! - determine how to respond to the next message received
//!
//! Each actor is bound for life to a serial queue handed out by a [`Dispatcher`]: its
//! mailbox. Queues run one message at a time in FIFO order, so actors mutate their own
//! state without locks, and a bounded pool of queues can carry many actors. Termination
//! is cooperative: a poison pill cascades down the tree, children report `Terminated`
//! upward as they finish, and the system's shutdown wait releases once the root is gone.
//!

mod actor;
mod cell;
mod dispatcher;
mod error;
mod message;
mod path;
mod reference;
mod system;

pub use actor::{Actor, ActorContext, SupervisorDirective};
pub use dispatcher::{
    DedicatedDispatcher, Dispatcher, PooledDispatcher, SerialQueue,
};
pub use error::Error;
pub use message::{Message, SystemMessage};
pub use path::ActorPath;
pub use reference::{ActorRef, TypedActorRef};
pub use system::{ActorSystem, GuardianMessage};
