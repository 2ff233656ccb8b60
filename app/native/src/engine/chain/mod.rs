//! Chord chain recognition.
//!
//! Grab chains are stored in a prefix tree ([`ChainTrie`]) keyed by chord.
//! A [`ChainMachine`] walks the tree one chord at a time:
//!
//! - A chord with a matching child edge advances the walk
//! - A chord without one discards the partial chain and is evaluated again
//!   from the root in the same step
//! - A node with a grab and no children fires and returns to the root
//! - A node with a grab that is also a prefix of longer chains is ambiguous:
//!   the grab is deferred until the timeout (shorter grab fires) or the next
//!   chord (an extending chord continues toward the longer grab, any other
//!   chord fires the deferred grab and is then evaluated from the root)
//! - A plain prefix that times out returns to the root without firing
//!
//! Time is passed in by the caller so the machine stays deterministic; the
//! machine only records when the current deadline was armed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use smallvec::SmallVec;

use crate::engine::model::{Chord, GrabId, format_chain};

/// Index of the root node.
const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    children: HashMap<Chord, usize>,
    grab: Option<GrabId>,
}

/// Prefix tree of grab chains.
#[derive(Debug, Clone)]
pub struct ChainTrie {
    nodes: Vec<Node>,
}

impl Default for ChainTrie {
    fn default() -> Self { Self { nodes: vec![Node::default()] } }
}

impl ChainTrie {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Inserts a chain and returns the grab it replaced, if any.
    pub fn insert(&mut self, chain: &[Chord], grab: GrabId) -> Option<GrabId> {
        let mut node = ROOT;

        for chord in chain {
            node = match self.nodes[node].children.get(chord) {
                Some(child) => *child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(chord.clone(), child);
                    child
                }
            };
        }

        self.nodes[node].grab.replace(grab)
    }

    /// Looks up the grab bound to exactly `chain`.
    #[must_use]
    pub fn lookup(&self, chain: &[Chord]) -> Option<GrabId> {
        let mut node = ROOT;
        for chord in chain {
            node = *self.nodes[node].children.get(chord)?;
        }
        self.nodes[node].grab
    }

    /// Returns the number of bound chains.
    #[must_use]
    pub fn len(&self) -> usize { self.nodes.iter().filter(|node| node.grab.is_some()).count() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn child(&self, node: usize, chord: &Chord) -> Option<usize> {
        self.nodes[node].children.get(chord).copied()
    }
}

/// Where the machine stands after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainState {
    /// No partial chain.
    Idle,
    /// Inside a chain prefix without a bound grab.
    Pending,
    /// On a grab that is also a prefix; it fires on timeout.
    Ambiguous,
}

/// Result of feeding one chord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    /// Grabs to dispatch, in firing order.
    pub fired: SmallVec<[GrabId; 2]>,
    pub state: ChainState,
}

/// Walks a [`ChainTrie`] chord by chord.
#[derive(Debug, Clone)]
pub struct ChainMachine {
    node: usize,
    deferred: Option<GrabId>,
    path: SmallVec<[Chord; 4]>,
    armed_at: Option<Instant>,
    timeout: Duration,
}

impl ChainMachine {
    /// Creates an idle machine.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { node: ROOT, deferred: None, path: SmallVec::new(), armed_at: None, timeout }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration { self.timeout }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ChainState {
        if self.node == ROOT {
            ChainState::Idle
        } else if self.deferred.is_some() {
            ChainState::Ambiguous
        } else {
            ChainState::Pending
        }
    }

    /// Returns the instant at which the partial chain expires.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> { self.armed_at.map(|armed| armed + self.timeout) }

    /// Returns the partial chain as written in configuration, empty when idle.
    #[must_use]
    pub fn keychain(&self) -> String { format_chain(&self.path) }

    /// Drops any partial chain without firing.
    pub fn reset(&mut self) {
        self.node = ROOT;
        self.deferred = None;
        self.path.clear();
        self.armed_at = None;
    }

    /// Feeds one chord.
    pub fn feed(&mut self, trie: &ChainTrie, chord: &Chord, now: Instant) -> ChainStep {
        let mut fired = SmallVec::new();

        if let Some(next) = trie.child(self.node, chord) {
            self.advance(trie, next, chord, now, &mut fired);
        } else if self.node != ROOT {
            if let Some(grab) = self.deferred {
                fired.push(grab);
            }
            self.reset();

            if let Some(next) = trie.child(ROOT, chord) {
                self.advance(trie, next, chord, now, &mut fired);
            }
        }

        ChainStep { fired, state: self.state() }
    }

    /// Fires or drops the partial chain if its deadline has passed.
    pub fn expire(&mut self, now: Instant) -> Option<GrabId> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.force_timeout(),
            _ => None,
        }
    }

    /// Resolves the partial chain as if its deadline had passed.
    pub fn force_timeout(&mut self) -> Option<GrabId> {
        let grab = self.deferred;
        self.reset();
        grab
    }

    fn advance(
        &mut self,
        trie: &ChainTrie,
        next: usize,
        chord: &Chord,
        now: Instant,
        fired: &mut SmallVec<[GrabId; 2]>,
    ) {
        let node = &trie.nodes[next];

        match (node.grab, node.children.is_empty()) {
            (Some(grab), true) => {
                fired.push(grab);
                self.reset();
            }
            (grab, false) => {
                self.node = next;
                self.deferred = grab;
                self.path.push(chord.clone());
                self.armed_at = Some(now);
            }
            (None, true) => self.reset(),
        }
    }
}
