//! Loopback example — frames a few messages and dispatches them back
//! through a broker, as a transport would on receive.
//!
//! Run with:
//!   cargo run --example loopback

use bytes::BytesMut;

use hexbus::broker::Broker;
use hexbus::frame::encode_frame;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut broker = Broker::new();

    broker.set(b'T', |payload: &[u8]| {
        eprintln!("[temperature] {}", String::from_utf8_lossy(payload));
    });
    broker.set(b'L', |payload: &[u8]| {
        eprintln!("[log] {}", String::from_utf8_lossy(payload));
    });
    broker.set_fallback(|payload: &[u8]| {
        eprintln!("[fallback] {} bytes: {payload:?}", payload.len());
    });

    // Outgoing side: frame payloads for the transport.
    let mut wire = BytesMut::new();
    encode_frame(b'T', b"21.5C", &mut wire)?;
    eprintln!("wire: {}", String::from_utf8_lossy(&wire));

    // Incoming side: hand received buffers to the broker.
    broker.process(&wire);

    wire.clear();
    encode_frame(b'L', b"boot ok", &mut wire)?;
    broker.process(&wire);

    // Unknown index and unframed noise both land in the fallback.
    wire.clear();
    encode_frame(b'Z', b"???", &mut wire)?;
    broker.process(&wire);
    broker.process(b"line noise");

    Ok(())
}
