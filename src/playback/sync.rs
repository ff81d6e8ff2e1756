//! Keeps the logical clock and the media in step.
//!
//! Every play, pause and seek lands on the clock. Whether it also reaches the
//! media depends on who caused it: a change the remote video already applied
//! (`echo == false`) must not be sent back to it.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use crate::core::clock::Clock;
use crate::core::events::{Callbacks, Subscription};
use crate::core::time::{self, Time};
use crate::media::MediaAdapter;

/// Play/pause/seek controller over a clock and the session's media
pub struct SyncController {
    clock: Rc<Clock>,
    media: RefCell<Rc<MediaAdapter>>,
    playing: Cell<bool>,
    seeked: Callbacks<Time>,
}

impl SyncController {
    pub fn new(clock: Rc<Clock>) -> Self {
        Self {
            clock,
            media: RefCell::new(Rc::new(MediaAdapter::detached())),
            playing: Cell::new(false),
            seeked: Callbacks::new(),
        }
    }

    pub fn clock(&self) -> &Rc<Clock> {
        &self.clock
    }

    pub fn media(&self) -> Rc<MediaAdapter> {
        Rc::clone(&self.media.borrow())
    }

    /// Swap the media for a new session
    pub fn set_media(&self, media: MediaAdapter) {
        *self.media.borrow_mut() = Rc::new(media);
    }

    pub fn playing(&self) -> bool {
        self.playing.get()
    }

    pub fn play(&self, forward_to_media: bool) {
        self.playing.set(true);
        self.clock.start();

        if forward_to_media {
            self.media().play();
        }
    }

    pub fn pause(&self, forward_to_media: bool) {
        self.playing.set(false);
        self.clock.stop();

        if forward_to_media {
            self.media().pause();
        }
    }

    /// Move the clock to `time` (ms). With `forward_to_media` the media seeks
    /// too and the returned future resolves once it can play again.
    pub fn seek(&self, time: Time, forward_to_media: bool) -> impl Future<Output = ()> + 'static {
        self.clock.set_time(time as f64);

        let pending = forward_to_media.then(|| self.media().seek(time::to_seconds(time)));
        self.seeked.emit(&time);

        async move {
            if let Some(pending) = pending {
                pending.await;
            }
        }
    }

    pub fn set_playback_rate(&self, rate: f64, forward_to_media: bool) {
        self.clock.set_rate(rate);

        if forward_to_media {
            self.media().playback_rate(rate);
        }
    }

    /// Called with the target time after every seek
    pub fn on_seeked(&self, callback: impl Fn(Time) + 'static) -> Subscription {
        self.seeked.subscribe(move |time| callback(*time))
    }

    /// Back to a stopped clock at zero with no media
    pub fn reset(&self) {
        self.playing.set(false);
        self.clock.stop();
        self.clock.set_time(0.0);
        self.set_media(MediaAdapter::detached());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualTimeSource;
    use crate::media::adapter::tests::FakeElement;
    use crate::media::HAVE_ENOUGH_DATA;

    fn controller() -> (SyncController, ManualTimeSource, Rc<FakeElement>) {
        let source = ManualTimeSource::new();
        let clock = Rc::new(Clock::new(Rc::new(source.clone())));
        let sync = SyncController::new(clock);
        let element = FakeElement::new(HAVE_ENOUGH_DATA);
        sync.set_media(MediaAdapter::new(element.clone()));
        (sync, source, element)
    }

    #[test]
    fn test_play_pause_respect_forwarding() {
        let (sync, source, element) = controller();

        sync.play(false);
        assert!(sync.playing());
        assert!(sync.clock().running());
        assert!(!element.playing.get());

        source.advance(1_000.0);
        sync.pause(true);
        assert!(!sync.playing());
        assert_eq!(sync.clock().time(10_000.0), 1_000.0);

        sync.play(true);
        assert!(element.playing.get());
    }

    #[test]
    fn test_seek_moves_clock_and_optionally_media() {
        let (sync, _source, element) = controller();
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        sync.on_seeked(move |time| sink.set(Some(time))).detach();

        let local_only = sync.seek(2_500, false);
        assert_eq!(sync.clock().time(10_000.0), 2_500.0);
        assert_eq!(element.time.get(), 0.0);
        assert_eq!(seen.get(), Some(2_500));
        drop(local_only);

        let forwarded = sync.seek(4_000, true);
        assert_eq!(element.time.get(), 4.0);
        element.can_play();
        pollster::block_on(forwarded);
    }

    #[test]
    fn test_rate_reaches_clock_and_media() {
        let (sync, _source, element) = controller();

        sync.set_playback_rate(1.5, true);
        assert_eq!(sync.clock().rate(), 1.5);
        assert_eq!(element.rate.get(), 1.5);

        sync.set_playback_rate(2.0, false);
        assert_eq!(element.rate.get(), 1.5);
    }

    #[test]
    fn test_reset_detaches_media() {
        let (sync, source, element) = controller();
        sync.play(true);
        source.advance(500.0);

        sync.reset();
        assert!(!sync.playing());
        assert!(!sync.clock().running());
        assert_eq!(sync.clock().time(10_000.0), 0.0);

        element.playing.set(false);
        sync.play(true);
        assert!(!element.playing.get());
    }
}
