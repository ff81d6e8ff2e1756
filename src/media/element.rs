//! Playable element contract.
//!
//! Implemented by local players and by [`VideoChannel`](crate::channel::VideoChannel),
//! which proxies a video living in another context.

/// Enough data is buffered to play the current position
pub const HAVE_FUTURE_DATA: u8 = 3;
/// Playback can run to the end without stalling
pub const HAVE_ENOUGH_DATA: u8 = 4;

/// One-shot "can play" handler, taken by the element when it fires
pub type CanPlayHandler = Box<dyn FnOnce()>;

/// A media element that can be played, paused and seeked.
///
/// Times are in seconds, matching the element's own units.
pub trait MediaElement {
    fn current_time(&self) -> f64;

    /// Start seeking to `seconds`
    fn set_current_time(&self, seconds: f64);

    fn duration(&self) -> f64;

    fn ready_state(&self) -> u8;

    fn play(&self);

    fn pause(&self);

    fn set_playback_rate(&self, rate: f64);

    fn has_on_can_play(&self) -> bool;

    /// Install (or with `None`, remove) the handler fired the next time the
    /// element reaches [`HAVE_ENOUGH_DATA`]
    fn set_on_can_play(&self, handler: Option<CanPlayHandler>);
}
