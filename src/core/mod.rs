//! Core types for subtitle playback.
//!
//! This module provides the logical clock, the callback registries every
//! component subscribes through, and the millisecond time representation.

pub mod clock;
pub mod events;
pub mod time;

// Re-export core types for easier access.
pub use clock::{Clock, ClockEvent, ManualTimeSource, SystemTimeSource, TimeSource};
pub use events::{Callbacks, Subscription};
pub use time::{Time, ZERO};
