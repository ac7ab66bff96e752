//! A lightweight actor framework.
//!
//! An actor owns its state and handles one message at a time, so
//! everything that mutates the state is serialized without locks.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod scheduler;

pub use error::ActorDeadError;
pub use handle::Actor;
pub use mailbox::Message;
