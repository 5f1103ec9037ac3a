//! Point-to-point tagged messages between the ranks of a process group, and
//! the collectives built on them.
//!
//! # Core Components
//!
//! * [`Transport`] - rank, size, `send` and matching `recv`.
//! * [`LocalTransport`] - every rank is a thread of this process.
//! * [`TcpTransport`] - every rank is a process; peers connect to the leader.
//! * [`ProcessGroup`] - barrier, max-with-location reduction and broadcast,
//!   written once against [`Transport`].
//!
//! Messages between one (source, destination) pair are delivered in send
//! order. `recv` picks the oldest queued message matching the requested
//! source and tags, leaving the rest queued.

mod group;
mod local;
mod tcp;

pub use group::{max_loc, ProcessGroup};
pub use local::LocalTransport;
pub use tcp::TcpTransport;

use crate::libs::error::GroupError;
use crate::libs::sched::lock;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, PoisonError};

/// Message kinds. The first four carry round traffic, the rest belong to
/// the collectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Work,
    WorkRequest,
    Terminate,
    Pairscores,
    Barrier,
    Release,
    Reduce,
    Broadcast,
}

impl Tag {
    pub fn to_u8(self) -> u8 {
        match self {
            Tag::Work => 1,
            Tag::WorkRequest => 2,
            Tag::Terminate => 3,
            Tag::Pairscores => 4,
            Tag::Barrier => 5,
            Tag::Release => 6,
            Tag::Reduce => 7,
            Tag::Broadcast => 8,
        }
    }

    pub fn from_u8(value: u8) -> Option<Tag> {
        let tag = match value {
            1 => Tag::Work,
            2 => Tag::WorkRequest,
            3 => Tag::Terminate,
            4 => Tag::Pairscores,
            5 => Tag::Barrier,
            6 => Tag::Release,
            7 => Tag::Reduce,
            8 => Tag::Broadcast,
            _ => return None,
        };
        Some(tag)
    }
}

/// A received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub source: usize,
    pub tag: Tag,
    pub payload: Vec<u8>,
}

pub trait Transport: Send + Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<(), GroupError>;

    /// Block for the oldest message from `source` (any rank if `None`) whose
    /// tag is one of `tags`.
    fn recv(&self, source: Option<usize>, tags: &[Tag]) -> Result<Envelope, GroupError>;

    /// Tear the group down after a failure; blocked receivers on every
    /// reachable rank return an error.
    fn abort(&self, reason: &str);
}

struct MailboxState {
    queue: VecDeque<Envelope>,
    closed: Option<String>,
}

/// Incoming message queue of one rank.
pub struct Mailbox {
    state: Mutex<MailboxState>,
    arrived: Condvar,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MailboxState {
                queue: VecDeque::new(),
                closed: None,
            }),
            arrived: Condvar::new(),
        }
    }

    pub fn deliver(&self, envelope: Envelope) {
        lock(&self.state).queue.push_back(envelope);
        self.arrived.notify_all();
    }

    /// Wake every receiver. Messages already queued can still be taken.
    pub fn close(&self, reason: &str) {
        let mut state = lock(&self.state);
        if state.closed.is_none() {
            state.closed = Some(reason.to_string());
        }
        drop(state);
        self.arrived.notify_all();
    }

    /// Blocking matched receive; `Err` carries the close reason.
    pub fn take(&self, source: Option<usize>, tags: &[Tag]) -> Result<Envelope, String> {
        let matches =
            |e: &Envelope| source.map_or(true, |s| s == e.source) && tags.contains(&e.tag);

        let mut state = lock(&self.state);
        loop {
            if let Some(pos) = state.queue.iter().position(|e| matches(e)) {
                if let Some(envelope) = state.queue.remove(pos) {
                    return Ok(envelope);
                }
            }
            if let Some(reason) = &state.closed {
                return Err(reason.clone());
            }
            state = self
                .arrived
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

}
