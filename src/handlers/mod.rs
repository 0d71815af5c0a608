// handlers/mod.rs - endpoints the edge answers itself
//
// Only /health is served locally. Everything else falls through to the
// forwarder, which relays it (rewritten or not) to the origin.

pub mod forward;
pub mod health;

pub use forward::forward;
pub use health::health;
