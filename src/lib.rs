//! Subtitle player core: keeps a subtitle timeline in step with a video that
//! may live in the same context, a pop-out window, an embedded frame or a
//! browser tab reached through an extension.

pub mod channel;
pub mod core;
pub mod logging;
pub mod media;
pub mod playback;
pub mod protocol;
pub mod settings;
pub mod subtitle;

#[cfg(test)]
mod testing;

pub use playback::{Player, PlayerCommand, PlayerConfig, PlayerError, PlayerEvent};
