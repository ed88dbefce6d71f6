//! Agent communication: neighbor messages and swimmer voting

pub mod message;
pub mod voting;

pub use message::{Mailbox, Message, MessageBus, MessageKind};
pub use voting::{meets_quorum, VoteTally, VotingProtocol};
