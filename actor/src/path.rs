// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor path
//!
//! The `path` module provides the `ActorPath` type. The `ActorPath` type is the hierarchical
//! name of an actor within the actor system, mirroring the parent/child tree.
//!

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::fmt::{Error, Formatter};

/// Hierarchical actor path providing unique addressing for actors within the actor system.
///
/// An `ActorPath` is an immutable sequence of string segments, rendered as a slash-separated
/// string starting with `/`. For example, `/user/manager/worker` addresses an actor named
/// "worker" supervised by "manager", which is in turn supervised by the "user" root.
///
/// Every segment is non-empty and contains no `/`; the parsing constructors enforce this by
/// filtering out empty segments, so the invariant holds by construction.
///
/// `ActorPath` is `Send + Sync`; all operations are immutable and return new instances.
#[derive(
    Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActorPath(Vec<String>);

impl ActorPath {
    /// Returns the root segment of this actor path as a path.
    ///
    /// # Returns
    ///
    /// Returns a new `ActorPath` containing only the first segment. For empty paths,
    /// returns an empty path.
    ///
    pub fn root(&self) -> Self {
        if self.0.len() == 1 {
            self.clone()
        } else if !self.0.is_empty() {
            ActorPath(self.0.iter().take(1).cloned().collect())
        } else {
            ActorPath(Vec::new())
        }
    }

    /// Returns the parent path, with the last segment removed.
    ///
    /// # Returns
    ///
    /// Returns a new `ActorPath` without the last segment. A top-level or empty path
    /// yields the empty path.
    ///
    pub fn parent(&self) -> Self {
        if self.0.len() > 1 {
            let mut tokens = self.0.clone();
            tokens.truncate(tokens.len() - 1);
            ActorPath(tokens)
        } else {
            ActorPath(Vec::new())
        }
    }

    /// Returns the segments of this path, in order from root to leaf.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the last segment of this path, the actor's short name within its parent.
    ///
    /// # Panics
    ///
    /// Panics when called on the empty path. Asking for the short name of a path without
    /// segments is a programming error, never an expected runtime condition.
    ///
    pub fn key(&self) -> String {
        match self.0.last() {
            Some(key) => key.clone(),
            None => panic!("key() called on the empty actor path"),
        }
    }

    /// Returns the depth of this path: `0` for the empty path, `1` for a top-level actor.
    pub fn level(&self) -> usize {
        self.0.len()
    }

    /// Returns the ancestor of this path at the given 1-based level.
    ///
    /// Levels below `1` or at/beyond the current depth return the path unchanged.
    ///
    pub fn at_level(&self, level: usize) -> Self {
        if level < 1 || level >= self.level() {
            self.clone()
        } else if self.is_top_level() {
            self.root()
        } else if level == self.level() - 1 {
            self.parent()
        } else {
            let mut tokens = self.0.clone();
            tokens.truncate(level);
            ActorPath(tokens)
        }
    }

    /// Returns true if the path contains no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this path is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &ActorPath) -> bool {
        let me = format!("{}/", self);
        other.to_string().as_str().starts_with(me.as_str())
    }

    /// Returns true if this path is a proper descendant of `other`.
    pub fn is_descendant_of(&self, other: &ActorPath) -> bool {
        let me = self.to_string();
        me.as_str().starts_with(format!("{}/", other).as_str())
    }

    /// Returns true if this path is the direct parent of `other`.
    pub fn is_parent_of(&self, other: &ActorPath) -> bool {
        *self == other.parent()
    }

    /// Returns true if this path is a direct child of `other`.
    pub fn is_child_of(&self, other: &ActorPath) -> bool {
        self.parent() == *other
    }

    /// Returns true if this path has exactly one segment.
    pub fn is_top_level(&self) -> bool {
        self.0.len() == 1
    }
}

/// Parses a path from its string form.
///
/// Segments are split on `/`; empty and whitespace-only segments are filtered out, so
/// `"/user"`, `"user"` and `"/user/"` all parse to the same single-segment path, and
/// `"/"` or `""` parse to the empty path.
///
impl From<&str> for ActorPath {
    fn from(str: &str) -> Self {
        let tokens: Vec<String> = str
            .split('/')
            .filter(|x| !x.trim().is_empty())
            .map(|s| s.to_string())
            .collect();
        ActorPath(tokens)
    }
}

impl From<String> for ActorPath {
    fn from(string: String) -> Self {
        ActorPath::from(string.as_str())
    }
}

impl From<&String> for ActorPath {
    fn from(string: &String) -> Self {
        ActorPath::from(string.as_str())
    }
}

/// Appends segments with the `/` operator, mimicking filesystem paths.
///
/// ```ignore
/// use actor::ActorPath;
///
/// let manager = ActorPath::from("/user") / "manager";
/// assert_eq!(manager.to_string(), "/user/manager");
/// ```
///
impl std::ops::Div<&str> for ActorPath {
    type Output = ActorPath;

    fn div(self, rhs: &str) -> Self::Output {
        let mut keys = self.0;
        let mut tokens: Vec<String> = rhs
            .split('/')
            .filter(|x| !x.trim().is_empty())
            .map(|s| s.to_string())
            .collect();

        keys.append(&mut tokens);
        ActorPath(keys)
    }
}

/// Renders the canonical string form. The empty path renders as `/`; the output of a
/// non-empty path parses back to an equal path.
impl std::fmt::Display for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.level().cmp(&1) {
            Ordering::Less => write!(f, "/"),
            Ordering::Equal => write!(f, "/{}", self.0[0]),
            Ordering::Greater => write!(f, "/{}", self.0.join("/")),
        }
    }
}

impl std::fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.level().cmp(&1) {
            Ordering::Less => write!(f, "/"),
            Ordering::Equal => write!(f, "/{}", self.0[0]),
            Ordering::Greater => write!(f, "/{}", self.0.join("/")),
        }
    }
}
