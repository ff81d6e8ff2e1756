//! Async wrapper over an optional [`MediaElement`].
//!
//! Every readiness waiter shares one pending list, drained by a single
//! "can play" handler installed at most once per element.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::media::element::{MediaElement, HAVE_ENOUGH_DATA};

type Waiters = Rc<RefCell<Vec<oneshot::Sender<()>>>>;

/// Resolves every waiter when dropped, whether the element fired the
/// handler or discarded it.
struct DrainWaiters(Waiters);

impl Drop for DrainWaiters {
    fn drop(&mut self) {
        let waiters: Vec<_> = self.0.borrow_mut().drain(..).collect();
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }
}

/// Seek/play/pause over an element that may be absent
pub struct MediaAdapter {
    element: Option<Rc<dyn MediaElement>>,
    waiters: Waiters,
}

impl MediaAdapter {
    pub fn new(element: Rc<dyn MediaElement>) -> Self {
        Self {
            element: Some(element),
            waiters: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Adapter for a session without media; every operation succeeds trivially
    pub fn detached() -> Self {
        Self {
            element: None,
            waiters: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn element(&self) -> Option<&Rc<dyn MediaElement>> {
        self.element.as_ref()
    }

    /// Seek to `seconds`; resolves once the element can play again.
    ///
    /// The seek itself is issued before this returns.
    pub fn seek(&self, seconds: f64) -> impl Future<Output = ()> + 'static {
        let pending = self.element.as_ref().and_then(|element| {
            element.set_current_time(seconds);
            self.wait_can_play(element)
        });

        Self::wait(pending)
    }

    /// Resolves once the element can play through
    pub fn on_ready(&self) -> impl Future<Output = ()> + 'static {
        let pending = self
            .element
            .as_ref()
            .and_then(|element| self.wait_can_play(element));

        Self::wait(pending)
    }

    async fn wait(pending: Option<oneshot::Receiver<()>>) {
        if let Some(receiver) = pending {
            let _ = receiver.await;
        }
    }

    fn wait_can_play(&self, element: &Rc<dyn MediaElement>) -> Option<oneshot::Receiver<()>> {
        if element.ready_state() == HAVE_ENOUGH_DATA {
            return None;
        }

        let (sender, receiver) = oneshot::channel();
        self.waiters.borrow_mut().push(sender);

        if !element.has_on_can_play() {
            let guard = DrainWaiters(Rc::clone(&self.waiters));
            element.set_on_can_play(Some(Box::new(move || drop(guard))));
        }

        Some(receiver)
    }

    pub fn play(&self) {
        if let Some(element) = &self.element {
            element.play();
        }
    }

    pub fn pause(&self) {
        if let Some(element) = &self.element {
            element.pause();
        }
    }

    pub fn playback_rate(&self, rate: f64) {
        if let Some(element) = &self.element {
            element.set_playback_rate(rate);
        }
    }

    /// Element position in seconds, zero without an element
    pub fn current_time(&self) -> f64 {
        self.element
            .as_ref()
            .map(|element| element.current_time())
            .unwrap_or(0.0)
    }

    /// Number of callers currently waiting for readiness
    pub fn pending(&self) -> usize {
        self.waiters.borrow().len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::media::element::{CanPlayHandler, HAVE_FUTURE_DATA};
    use std::cell::Cell;

    /// In-memory element driven by the test
    #[derive(Default)]
    pub(crate) struct FakeElement {
        pub time: Cell<f64>,
        pub ready: Cell<u8>,
        pub playing: Cell<bool>,
        pub rate: Cell<f64>,
        pub handler: RefCell<Option<CanPlayHandler>>,
        pub installs: Cell<usize>,
    }

    impl FakeElement {
        pub fn new(ready: u8) -> Rc<Self> {
            let element = Self::default();
            element.ready.set(ready);
            element.rate.set(1.0);
            Rc::new(element)
        }

        /// Reach full readiness and fire the pending handler
        pub fn can_play(&self) {
            self.ready.set(HAVE_ENOUGH_DATA);
            let handler = self.handler.borrow_mut().take();
            if let Some(handler) = handler {
                handler();
            }
        }
    }

    impl MediaElement for FakeElement {
        fn current_time(&self) -> f64 {
            self.time.get()
        }

        fn set_current_time(&self, seconds: f64) {
            self.time.set(seconds);
            self.ready.set(HAVE_FUTURE_DATA);
        }

        fn duration(&self) -> f64 {
            60.0
        }

        fn ready_state(&self) -> u8 {
            self.ready.get()
        }

        fn play(&self) {
            self.playing.set(true);
        }

        fn pause(&self) {
            self.playing.set(false);
        }

        fn set_playback_rate(&self, rate: f64) {
            self.rate.set(rate);
        }

        fn has_on_can_play(&self) -> bool {
            self.handler.borrow().is_some()
        }

        fn set_on_can_play(&self, handler: Option<CanPlayHandler>) {
            if handler.is_some() {
                self.installs.set(self.installs.get() + 1);
            }
            *self.handler.borrow_mut() = handler;
        }
    }

    #[test]
    fn test_detached_adapter_resolves_immediately() {
        let adapter = MediaAdapter::detached();
        pollster::block_on(adapter.seek(12.0));
        pollster::block_on(adapter.on_ready());
        adapter.play();
        adapter.pause();
        assert_eq!(adapter.current_time(), 0.0);
    }

    #[test]
    fn test_ready_element_resolves_without_handler() {
        let element = FakeElement::new(HAVE_ENOUGH_DATA);
        let adapter = MediaAdapter::new(element.clone());

        pollster::block_on(adapter.on_ready());
        assert_eq!(element.installs.get(), 0);
    }

    #[tokio::test]
    async fn test_single_handler_drains_all_waiters() {
        let element = FakeElement::new(0);
        let adapter = MediaAdapter::new(element.clone());

        let first = adapter.seek(5.0);
        let second = adapter.on_ready();
        let third = adapter.on_ready();

        assert_eq!(element.time.get(), 5.0);
        assert_eq!(element.installs.get(), 1);
        assert_eq!(adapter.pending(), 3);

        element.can_play();
        assert_eq!(adapter.pending(), 0);

        first.await;
        second.await;
        third.await;
    }

    #[tokio::test]
    async fn test_discarded_handler_releases_waiters() {
        let element = FakeElement::new(0);
        let adapter = MediaAdapter::new(element.clone());

        let waiting = adapter.on_ready();
        element.set_on_can_play(None);

        waiting.await;
        assert_eq!(adapter.pending(), 0);
    }

    #[test]
    fn test_forwards_play_pause_rate() {
        let element = FakeElement::new(HAVE_ENOUGH_DATA);
        let adapter = MediaAdapter::new(element.clone());

        adapter.play();
        assert!(element.playing.get());
        adapter.playback_rate(1.5);
        assert_eq!(element.rate.get(), 1.5);
        adapter.pause();
        assert!(!element.playing.get());
    }
}
