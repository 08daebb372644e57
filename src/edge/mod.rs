//! # Edge capture: from input interrupts to the dispatcher.
//!
//! ```text
//!   InputPins (HAL)                 EdgeCapture                     Dispatcher
//!   ───────────────                 ───────────                     ──────────
//!   interrupt on pin N ──► EdgeIsr::fire() ──push + wake──► [edge ring, 32] ──► recv()
//!                                   │ full                                      │
//!                                   └──► dropped += 1 ───────── take_dropped() ─┘
//! ```
//!
//! - [`InputPins`] is the hardware collaborator: it installs per-input interrupt
//!   handlers and answers instantaneous level reads.
//! - [`EdgeCapture`] owns the registration bitmask and the producer side of the
//!   edge channel; [`EdgeReceiver`] is the consumer side.
//! - [`EdgeIsr`] is what the HAL calls from interrupt context. It never blocks,
//!   never allocates and never logs.

mod capture;
mod pins;

pub use capture::{EdgeCapture, EdgeIsr, EdgeReceiver};
pub use pins::InputPins;
