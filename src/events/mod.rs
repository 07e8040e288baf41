//! # Events Module
//!
//! Event-driven progress reporting for any UI layer.
//!
//! ## Design
//! The core library emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe and display progress. Every file the
//! run moves produces a [`FileEvent::Placed`] with the path before,
//! the path after, and the placement decision.

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
