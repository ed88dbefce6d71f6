//! Neighbor-to-neighbor messages and the double-buffered delivery bus

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// An objective was spotted at the payload position
    TargetFound,
    /// Escalate: attack the objective at the payload position now
    AttackNow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub sender: AgentId,
    pub sender_position: Vec2,
    /// Objective location the message refers to
    pub payload: Vec2,
    /// Relays travelled so far; the originator sends hop 0
    pub hops: u8,
}

impl Message {
    pub fn new(kind: MessageKind, sender: AgentId, sender_position: Vec2, payload: Vec2) -> Self {
        Self {
            kind,
            sender,
            sender_position,
            payload,
            hops: 0,
        }
    }

    /// Copy of this message re-sent by `relay` one hop further
    pub fn relayed_by(&self, relay: AgentId, relay_position: Vec2) -> Self {
        Self {
            kind: self.kind,
            sender: relay,
            sender_position: relay_position,
            payload: self.payload,
            hops: self.hops.saturating_add(1),
        }
    }
}

/// Per-agent FIFO of messages delivered this tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mailbox {
    queue: VecDeque<Message>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every queued message in arrival order
    pub fn drain(&mut self) -> Vec<Message> {
        self.queue.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Next-tick inboxes
///
/// Messages broadcast during tick k sit here until `deliver` moves them into
/// the recipients' mailboxes at the start of tick k+1, so a message advances
/// at most one hop per tick.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    next_tick: AHashMap<AgentId, Vec<Message>>,
    queued: usize,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `message` for every recipient except its sender
    pub fn broadcast(&mut self, recipients: &[AgentId], message: &Message) {
        for &recipient in recipients {
            if recipient == message.sender {
                continue;
            }
            self.next_tick
                .entry(recipient)
                .or_default()
                .push(message.clone());
            self.queued += 1;
        }
    }

    /// Messages waiting for the next delivery
    pub fn pending(&self) -> usize {
        self.queued
    }

    /// Hand every queued message to `deliver_to`
    ///
    /// Recipients are visited in id order. `deliver_to` returns false when
    /// the recipient no longer exists; those messages are dropped. Returns
    /// the number of messages delivered.
    pub fn deliver<F>(&mut self, mut deliver_to: F) -> usize
    where
        F: FnMut(AgentId, Message) -> bool,
    {
        let mut batches: Vec<(AgentId, Vec<Message>)> = self.next_tick.drain().collect();
        batches.sort_by_key(|(id, _)| *id);
        self.queued = 0;

        let mut delivered = 0;
        for (recipient, messages) in batches {
            for message in messages {
                if deliver_to(recipient, message) {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    pub fn clear(&mut self) {
        self.next_tick.clear();
        self.queued = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(sender: u32) -> Message {
        Message::new(
            MessageKind::TargetFound,
            AgentId(sender),
            Vec2::ZERO,
            Vec2::new(100.0, 100.0),
        )
    }

    #[test]
    fn test_relay_increments_hops() {
        let relayed = found(1).relayed_by(AgentId(2), Vec2::new(5.0, 5.0));
        assert_eq!(relayed.hops, 1);
        assert_eq!(relayed.sender, AgentId(2));
        assert_eq!(relayed.payload, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let mut bus = MessageBus::new();
        bus.broadcast(&[AgentId(1), AgentId(2), AgentId(3)], &found(1));
        assert_eq!(bus.pending(), 2);
    }

    #[test]
    fn test_deliver_is_deferred_and_drops_unknown() {
        let mut bus = MessageBus::new();
        bus.broadcast(&[AgentId(2), AgentId(9)], &found(1));

        let mut inbox: Vec<AgentId> = Vec::new();
        let delivered = bus.deliver(|id, _| {
            if id == AgentId(9) {
                return false;
            }
            inbox.push(id);
            true
        });
        assert_eq!(delivered, 1);
        assert_eq!(inbox, vec![AgentId(2)]);
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.deliver(|_, _| true), 0);
    }

    #[test]
    fn test_mailbox_fifo() {
        let mut mailbox = Mailbox::new();
        mailbox.receive(found(1));
        mailbox.receive(found(2));
        let drained = mailbox.drain();
        assert_eq!(drained[0].sender, AgentId(1));
        assert_eq!(drained[1].sender, AgentId(2));
        assert!(mailbox.is_empty());
    }
}
