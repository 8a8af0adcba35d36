use std::fmt;

use hexbus_frame::{decode_frame, derived_frame_len, HEADER_SIZE, SEPARATOR};
use tracing::{debug, trace};

use crate::handler::Handler;

struct HandlerEntry {
    index: u8,
    handler: Box<dyn Handler>,
}

/// What a [`Broker::process`] call did with the buffer.
///
/// Dispatch never fails; malformed or unmatched input degrades to the
/// fallback handler or to a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler registered for this index ran with the decoded payload.
    Handler(u8),
    /// No handler matched the index; the fallback ran with the decoded
    /// payload.
    FallbackDecoded,
    /// The buffer was not dispatchable (too short, missing separator, empty
    /// registry, or undecodable payload); the fallback ran with the
    /// original bytes, un-decoded.
    FallbackRaw,
    /// Nothing matched and no fallback is registered.
    Ignored,
}

/// Associates single-byte message indices with handlers and routes incoming
/// buffers to them.
///
/// Each broker instance owns its registry outright, so independent brokers
/// (and tests) never share state. At most one handler is registered per
/// index; re-registering replaces the previous handler in place.
#[derive(Default)]
pub struct Broker {
    handlers: Vec<HandlerEntry>,
    fallback: Option<Box<dyn Handler>>,
}

impl Broker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `index`, replacing any previous registration
    /// for the same index (last writer wins).
    pub fn set(&mut self, index: u8, handler: impl Handler + 'static) {
        let handler = Box::new(handler);
        if let Some(entry) = self.handlers.iter_mut().find(|e| e.index == index) {
            entry.handler = handler;
            debug!(index, "replaced handler");
        } else {
            self.handlers.push(HandlerEntry { index, handler });
            debug!(index, "registered handler");
        }
    }

    /// Unregister the handler for `index`. Returns whether one was
    /// registered.
    pub fn remove(&mut self, index: u8) -> bool {
        match self.handlers.iter().position(|e| e.index == index) {
            Some(pos) => {
                self.handlers.remove(pos);
                debug!(index, "removed handler");
                true
            }
            None => false,
        }
    }

    /// Register the fallback handler, replacing any previous one. The
    /// fallback receives unmatched and malformed buffers (see [`Dispatch`]).
    pub fn set_fallback(&mut self, handler: impl Handler + 'static) {
        self.fallback = Some(Box::new(handler));
    }

    /// Clear the fallback handler.
    pub fn remove_fallback(&mut self) {
        self.fallback = None;
    }

    /// Whether a handler is registered for `index`.
    pub fn is_registered(&self, index: u8) -> bool {
        self.handlers.iter().any(|e| e.index == index)
    }

    /// Whether a fallback handler is registered.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Number of registered index handlers (the fallback is not counted).
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no index handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route an incoming buffer to its handler.
    ///
    /// The slice length is the frame's logical size. A well-formed frame
    /// (`len > 2`, separator at byte 1) whose index is registered is decoded
    /// and dispatched to exactly that handler; an unmatched well-formed
    /// frame goes decoded to the fallback. Everything else — short buffers,
    /// missing separator, an empty registry, or a payload the hex codec
    /// rejects — goes to the fallback as the original bytes, or is silently
    /// ignored when no fallback is set.
    pub fn process(&mut self, buffer: &[u8]) -> Dispatch {
        if buffer.len() > HEADER_SIZE && buffer[1] == SEPARATOR && !self.handlers.is_empty() {
            let index = buffer[0];
            if let Some(pos) = self.handlers.iter().position(|e| e.index == index) {
                match decode_frame(buffer) {
                    Ok(frame) => {
                        trace!(index, payload_len = frame.payload.len(), "dispatching");
                        self.handlers[pos].handler.handle(&frame.payload);
                        return Dispatch::Handler(index);
                    }
                    Err(err) => trace!(index, %err, "payload decode failed, treating as raw"),
                }
            } else if self.fallback.is_some() {
                match decode_frame(buffer) {
                    Ok(frame) => {
                        trace!(index, "no handler matched, dispatching to fallback");
                        if let Some(fallback) = self.fallback.as_mut() {
                            fallback.handle(&frame.payload);
                        }
                        return Dispatch::FallbackDecoded;
                    }
                    Err(err) => trace!(index, %err, "payload decode failed, treating as raw"),
                }
            }
        }
        if let Some(fallback) = self.fallback.as_mut() {
            trace!(len = buffer.len(), "passing raw buffer to fallback");
            fallback.handle(buffer);
            return Dispatch::FallbackRaw;
        }
        trace!(len = buffer.len(), "no handler matched and no fallback set");
        Dispatch::Ignored
    }

    /// Route a buffer whose logical size must be derived from its length
    /// via the legacy `floor(len / 2) - 1` approximation.
    ///
    /// Compatibility fallback for callers that cannot supply a size; see
    /// [`hexbus_frame::derived_frame_len`] for why the arithmetic is
    /// best-effort. Prefer [`Broker::process`].
    pub fn process_derived(&mut self, buffer: &[u8]) -> Dispatch {
        let len = derived_frame_len(buffer).min(buffer.len());
        self.process(&buffer[..len])
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("handlers", &self.handlers.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use bytes::BytesMut;
    use hexbus_frame::encode_frame;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<Vec<u8>>>>, impl FnMut(&[u8])) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let record = move |payload: &[u8]| {
            sink.lock()
                .expect("recorder lock should not be poisoned")
                .push(payload.to_vec());
        };
        (seen, record)
    }

    fn frame(index: u8, payload: &[u8]) -> BytesMut {
        let mut wire = BytesMut::new();
        encode_frame(index, payload, &mut wire).expect("test frame should encode");
        wire
    }

    #[test]
    fn last_writer_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut broker = Broker::new();
        let counter = Arc::clone(&first);
        broker.set(b'A', move |_: &[u8]| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&second);
        broker.set(b'A', move |_: &[u8]| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(broker.len(), 1);
        assert_eq!(broker.process(&frame(b'A', b"x")), Dispatch::Handler(b'A'));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_first_of_many_keeps_rest() {
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', |_: &[u8]| {});
        broker.set(b'B', record);
        broker.set(b'C', |_: &[u8]| {});

        assert!(broker.remove(b'A'));
        assert!(!broker.is_registered(b'A'));
        assert!(broker.is_registered(b'B'));
        assert!(broker.is_registered(b'C'));
        assert_eq!(broker.len(), 2);

        assert_eq!(broker.process(&frame(b'B', b"ok")), Dispatch::Handler(b'B'));
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"ok".to_vec()]);
    }

    #[test]
    fn remove_unknown_returns_false() {
        let mut broker = Broker::new();
        broker.set(b'A', |_: &[u8]| {});

        assert!(!broker.remove(b'Z'));
        assert_eq!(broker.len(), 1);
        assert!(broker.is_registered(b'A'));
    }

    #[test]
    fn registered_handler_wins_over_fallback() {
        let (seen, record) = recorder();
        let fallback_hits = Arc::new(AtomicUsize::new(0));

        let mut broker = Broker::new();
        broker.set(b'A', record);
        let counter = Arc::clone(&fallback_hits);
        broker.set_fallback(move |_: &[u8]| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(broker.process(&frame(b'A', b"hi")), Dispatch::Handler(b'A'));
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"hi".to_vec()]);
        assert_eq!(fallback_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unmatched_index_goes_decoded_to_fallback() {
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', |_: &[u8]| {});
        broker.set_fallback(record);

        assert_eq!(
            broker.process(&frame(b'Z', b"hi")),
            Dispatch::FallbackDecoded
        );
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"hi".to_vec()]);
    }

    #[test]
    fn short_buffer_goes_raw_to_fallback() {
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', |_: &[u8]| {});
        broker.set_fallback(record);

        assert_eq!(broker.process(b"A"), Dispatch::FallbackRaw);
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"A".to_vec()]);
    }

    #[test]
    fn missing_separator_goes_raw_to_fallback() {
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', |_: &[u8]| {});
        broker.set_fallback(record);

        assert_eq!(broker.process(b"AB6869"), Dispatch::FallbackRaw);
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"AB6869".to_vec()]);
    }

    #[test]
    fn empty_registry_sends_valid_frame_raw_to_fallback() {
        // With no index handlers at all the frame is never decoded, even if
        // well-formed. The fallback sees exactly what the transport
        // delivered.
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set_fallback(record);

        assert_eq!(broker.process(b"A-6869"), Dispatch::FallbackRaw);
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"A-6869".to_vec()]);
    }

    #[test]
    fn undecodable_payload_goes_raw_to_fallback() {
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', |_: &[u8]| panic!("handler must not see a bad payload"));
        broker.set_fallback(record);

        assert_eq!(broker.process(b"A-6z"), Dispatch::FallbackRaw);
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"A-6z".to_vec()]);
    }

    #[test]
    fn no_match_no_fallback_is_silent() {
        let mut broker = Broker::new();
        assert_eq!(broker.process(b"Z-00"), Dispatch::Ignored);

        broker.set(b'A', |_: &[u8]| panic!("wrong index must not dispatch"));
        assert_eq!(broker.process(b"Z-00"), Dispatch::Ignored);
    }

    #[test]
    fn fallback_can_be_cleared() {
        let mut broker = Broker::new();
        broker.set_fallback(|_: &[u8]| {});
        assert!(broker.has_fallback());

        broker.remove_fallback();
        assert!(!broker.has_fallback());
        assert_eq!(broker.process(b"junk"), Dispatch::Ignored);
    }

    #[test]
    fn encode_then_process_scenario() {
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', record);

        let wire = frame(b'A', b"hi");
        assert_eq!(&wire[..], b"A-6869");
        assert_eq!(broker.process(&wire), Dispatch::Handler(b'A'));
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"hi".to_vec()]);
    }

    #[test]
    fn set_remove_churn_stays_consistent() {
        let mut broker = Broker::new();
        for round in 0..100u32 {
            for index in [b'A', b'B', b'C', b'D'] {
                broker.set(index, |_: &[u8]| {});
            }
            assert_eq!(broker.len(), 4);
            assert!(broker.remove(b'A'));
            assert!(broker.remove(b'C'));
            assert_eq!(broker.len(), 2, "round {round}");
            assert!(broker.is_registered(b'B'));
            assert!(broker.is_registered(b'D'));
            assert!(broker.remove(b'B'));
            assert!(broker.remove(b'D'));
            assert!(broker.is_empty());
        }
    }

    #[test]
    fn derived_size_path_truncates_payload() {
        // Pins the legacy size derivation: a 10-byte frame derives a
        // logical size of 4, so the handler sees a single payload byte.
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', record);

        let wire = frame(b'A', b"hijk");
        assert_eq!(broker.process_derived(&wire), Dispatch::Handler(b'A'));
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"h".to_vec()]);
    }

    #[test]
    fn handler_reregistered_after_remove() {
        let (seen, record) = recorder();

        let mut broker = Broker::new();
        broker.set(b'A', |_: &[u8]| {});
        assert!(broker.remove(b'A'));
        broker.set(b'A', record);

        assert_eq!(broker.process(&frame(b'A', b"x")), Dispatch::Handler(b'A'));
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"x".to_vec()]);
    }
}
