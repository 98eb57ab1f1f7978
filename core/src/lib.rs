//! Reservation flow core for the dungeon passage bot.
//!
//! Everything here is platform independent: the chat platform is reached only
//! through the traits in [`validation`], and the bot binary supplies the
//! implementation.

pub mod assignment;
pub mod catalog;
pub mod channel;
pub mod controls;
pub mod error;
pub mod feedback;
pub mod flow;
pub mod identity;
pub mod message;
pub mod record;
pub mod session;
pub mod validation;

pub use identity::{ChannelRef, MemberId, MessageRef};
