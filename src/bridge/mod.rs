//! Bridges between the two execution models.
//!
//! - [`QueueToSignal`]: software producer, hardware consumer.
//! - [`SignalToQueue`]: hardware producer, software consumer.
//! - [`FlagBridge`]: mirrors the boolean clock or reset onto a 1-bit wire.

mod adaptor;
mod clock;

pub use adaptor::{QueueToSignal, SignalToQueue};
pub use clock::FlagBridge;
