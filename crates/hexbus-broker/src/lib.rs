//! Per-index handler registry and dispatch for hex-framed messages.
//!
//! This is the "just works" layer. Register one handler per message index,
//! optionally a fallback for everything else, and feed raw buffers from any
//! transport into [`Broker::process`].
//!
//! # Threading contract
//!
//! Dispatch is synchronous and single-threaded: handlers run inline on the
//! caller's thread, and a handler that never returns blocks the broker
//! indefinitely. Multi-threaded embedders must wrap the broker in their own
//! mutual exclusion and keep handler bodies outside that lock if a handler
//! may itself mutate the registry.

pub mod broker;
pub mod handler;

pub use broker::{Broker, Dispatch};
pub use handler::Handler;
