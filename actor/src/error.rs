// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor runtime errors
//!
//! The `error` module defines the error conditions surfaced by the runtime. Most anomalies
//! in the actor model are local and non-fatal (undeliverable sends are dropped, malformed
//! names are substituted); the conditions below are the ones a caller can actually observe.
//!

use crate::ActorPath;

use thiserror::Error;

/// Errors surfaced by the actor runtime.
///
/// The runtime deliberately keeps this surface small. Sends to dead references and
/// duplicate poison pills are logged and dropped rather than reported, and name
/// misconfiguration is repaired with a substitute identifier. What remains is what
/// callers must handle.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// The target cell is stopping or stopped and refuses to create new children.
    #[error("Actor {0} is stopping and cannot spawn children.")]
    Stopped(ActorPath),

    /// An application-level failure signalled by or on behalf of an actor. This is the
    /// cause carried by the `Error` system message and handed to the supervisor hook.
    #[error("Actor failure: {0}.")]
    Failure(String),

    /// A bounded shutdown wait elapsed before the system terminated.
    #[error("Timed out waiting for the actor system to shut down.")]
    Timeout,
}
