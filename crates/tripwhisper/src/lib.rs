//! Host-side pieces of the TripWhisper terminal app.

#![deny(missing_docs)]

pub mod command;
pub mod config;
