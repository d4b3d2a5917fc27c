// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! Core library for the Arbor framework.
//! Provides the foundational components for building actor-based applications.
//! This library includes the hierarchical actor model, serial mailboxes, dispatchers
//! and cooperative shutdown. It is designed to be modular and extensible, allowing
//! developers to build custom actors and message types.

pub use actor::{
    Actor, ActorContext, ActorPath, ActorRef, ActorSystem,
    DedicatedDispatcher, Dispatcher, Error as ActorError, Message,
    PooledDispatcher, SerialQueue, SupervisorDirective, SystemMessage,
    TypedActorRef,
};
