//! Gates and mailboxes.
//!
//! A gate is anything implementing RTIC's [`Mutex`]: on the target that is
//! the resource proxy RTIC hands to each task, on the host an
//! [`Exclusive`] borrow. Nothing in this crate ever holds two gates at
//! once.

pub use rtic_core::{Exclusive, Mutex};

use crate::config::CHANNELS;
use crate::state::Channel;

/// Single-slot handoff. Posting over an unconsumed value replaces it:
/// commands describe a desired state, so only the latest one matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mailbox<T> {
    slot: Option<T>,
}

impl<T> Mailbox<T> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Stores `value`, returning the value it displaced, if any.
    pub fn post(&mut self, value: T) -> Option<T> {
        self.slot.replace(value)
    }

    /// Consumes the pending value. A second `take` without a new `post`
    /// returns `None`.
    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One output mailbox per channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingOutputs {
    slots: [Mailbox<bool>; CHANNELS],
}

impl PendingOutputs {
    pub const fn new() -> Self {
        Self {
            slots: [Mailbox::new(); CHANNELS],
        }
    }

    pub fn post(&mut self, channel: Channel, level: bool) -> Option<bool> {
        self.slots[channel.index()].post(level)
    }

    pub fn take(&mut self, channel: Channel) -> Option<bool> {
        self.slots[channel.index()].take()
    }

    pub fn is_pending(&self, channel: Channel) -> bool {
        self.slots[channel.index()].is_pending()
    }
}
