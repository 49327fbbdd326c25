//! Confirmation dialogs
//!
//! A pending confirmation is a single-slot waiter keyed by (channel, author).
//! It resolves when a qualifying reply from that author arrives in that
//! channel, or ends when its timeout fires, whichever comes first.

use crate::types::{ChannelId, MemberId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

/// Answer to the probation demotion prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    /// Replace the member's roles with the guest role
    DowngradeToGuest,
    /// Remove the member from the server
    Remove,
}

impl Choice {
    /// Parse a reply body; only exact `"1"` or `"2"` qualify
    #[inline]
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        match content {
            "1" => Some(Self::DowngradeToGuest),
            "2" => Some(Self::Remove),
            _ => None,
        }
    }
}

/// Correlation key for a pending confirmation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingKey {
    /// Channel the prompt was posted in
    pub channel: ChannelId,
    /// Member who must answer
    pub author: MemberId,
}

impl PendingKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(channel: ChannelId, author: MemberId) -> Self {
        Self { channel, author }
    }
}

#[derive(Debug)]
struct Waiter {
    ticket: u64,
    sender: oneshot::Sender<Choice>,
}

/// Table of pending confirmations
#[derive(Debug, Default)]
pub struct ConfirmationRegistry {
    pending: DashMap<PendingKey, Waiter>,
    next_ticket: AtomicU64,
}

/// Handle to one registered confirmation
#[derive(Debug)]
pub struct PendingConfirmation {
    key: PendingKey,
    ticket: u64,
    receiver: oneshot::Receiver<Choice>,
}

impl ConfirmationRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `key`
    ///
    /// An older waiter under the same key is dropped and ends as abandoned.
    pub fn register(&self, key: PendingKey) -> PendingConfirmation {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        if self
            .pending
            .insert(key.clone(), Waiter { ticket, sender })
            .is_some()
        {
            tracing::debug!(channel = %key.channel, author = %key.author, "replaced pending confirmation");
        }
        PendingConfirmation {
            key,
            ticket,
            receiver,
        }
    }

    /// Offer an inbound message to the pending waiters
    ///
    /// Returns `true` if the message answered a pending confirmation and was
    /// consumed by it.
    pub fn offer(&self, channel: &ChannelId, author: &MemberId, content: &str) -> bool {
        let Some(choice) = Choice::parse(content) else {
            return false;
        };
        let key = PendingKey::new(channel.clone(), author.clone());
        match self.pending.remove(&key) {
            Some((_, waiter)) => waiter.sender.send(choice).is_ok(),
            None => false,
        }
    }

    /// Wait for the answer to `pending`, at most `timeout`
    ///
    /// Returns `None` when the wait elapsed or the waiter was replaced.
    pub async fn wait(&self, pending: PendingConfirmation, timeout: Duration) -> Option<Choice> {
        let PendingConfirmation {
            key,
            ticket,
            receiver,
        } = pending;

        let outcome = tokio::time::timeout(timeout, receiver).await;
        // only clear our own slot; a newer dialog may own the key now
        self.pending.remove_if(&key, |_, waiter| waiter.ticket == ticket);

        match outcome {
            Ok(Ok(choice)) => Some(choice),
            Ok(Err(_)) => {
                tracing::debug!(channel = %key.channel, author = %key.author, "confirmation superseded");
                None
            }
            Err(_) => {
                tracing::debug!(channel = %key.channel, author = %key.author, "confirmation timed out");
                None
            }
        }
    }

    /// Drop a registered confirmation without waiting
    pub fn cancel(&self, pending: PendingConfirmation) {
        self.pending
            .remove_if(&pending.key, |_, waiter| waiter.ticket == pending.ticket);
    }

    /// Check if a confirmation is pending for `key`
    #[inline]
    #[must_use]
    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of pending confirmations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
