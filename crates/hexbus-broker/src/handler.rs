/// A registered message callback.
///
/// Blanket-implemented for every `FnMut(&[u8])`, so plain functions,
/// capturing closures, and hand-written handler types all register directly.
pub trait Handler {
    /// Invoked with the decoded payload of a matched frame, or with the raw
    /// buffer when the broker falls back on malformed input.
    fn handle(&mut self, payload: &[u8]);
}

impl<F: FnMut(&[u8])> Handler for F {
    fn handle(&mut self, payload: &[u8]) {
        self(payload)
    }
}
