//! Tiny hex-framed message dispatch for constrained programs.
//!
//! hexbus moves short messages over any byte transport — serial line, I2C,
//! MQTT payload, in-process queue. Each message is a loggable ASCII frame:
//! a single index byte naming the message type, the literal separator `-`,
//! and the hex encoding of the payload. Register one handler per index
//! (plus an optional fallback) and feed received buffers to the broker.
//!
//! # Crate Structure
//!
//! - [`frame`] — Wire codec: `Frame`, encode/decode, frame errors
//! - [`broker`] — Handler registry and dispatch engine
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use bytes::BytesMut;
//! use hexbus::broker::{Broker, Dispatch};
//! use hexbus::frame::encode_frame;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//!
//! let mut broker = Broker::new();
//! broker.set(b'A', move |payload: &[u8]| {
//!     sink.lock().unwrap().extend_from_slice(payload);
//! });
//!
//! let mut wire = BytesMut::new();
//! encode_frame(b'A', b"hi", &mut wire).unwrap();
//! assert_eq!(&wire[..], b"A-6869");
//!
//! assert_eq!(broker.process(&wire), Dispatch::Handler(b'A'));
//! assert_eq!(seen.lock().unwrap().as_slice(), b"hi");
//! ```

/// Re-export frame types.
pub mod frame {
    pub use hexbus_frame::*;
}

/// Re-export broker types.
pub mod broker {
    pub use hexbus_broker::*;
}
