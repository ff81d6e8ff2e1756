//! Logical playback clock.
//!
//! Tracks elapsed playback time independent of any media element. Elapsed wall
//! time is scaled by the playback rate and folded into an accumulator whenever
//! the clock stops or the rate changes, so a rate change never rewrites progress
//! that already happened.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::core::events::{Callbacks, Subscription};

/// Source of wall-clock milliseconds
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Monotonic wall clock backed by `Instant`
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven time source for tests and simulations
#[derive(Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<f64>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, millis: f64) {
        self.now.set(self.now.get() + millis);
    }

    pub fn set(&self, millis: f64) {
        self.now.set(millis);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Clock state transitions observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Start,
    Stop,
    SetTime,
}

/// Logical playback clock (milliseconds)
pub struct Clock {
    accumulated: Cell<f64>,
    started: Cell<bool>,
    start_time: Cell<f64>,
    rate: Cell<f64>,
    source: Rc<dyn TimeSource>,
    start_callbacks: Callbacks<()>,
    stop_callbacks: Callbacks<()>,
    set_time_callbacks: Callbacks<()>,
}

impl Clock {
    pub fn new(source: Rc<dyn TimeSource>) -> Self {
        Self {
            accumulated: Cell::new(0.0),
            started: Cell::new(false),
            start_time: Cell::new(0.0),
            rate: Cell::new(1.0),
            source,
            start_callbacks: Callbacks::new(),
            stop_callbacks: Callbacks::new(),
            set_time_callbacks: Callbacks::new(),
        }
    }

    /// Clock driven by the system monotonic clock
    pub fn system() -> Self {
        Self::new(Rc::new(SystemTimeSource::new()))
    }

    pub fn running(&self) -> bool {
        self.started.get()
    }

    pub fn rate(&self) -> f64 {
        self.rate.get()
    }

    /// Wall-clock milliseconds from the underlying time source
    pub fn now_ms(&self) -> f64 {
        self.source.now_ms()
    }

    fn elapsed(&self) -> f64 {
        (self.source.now_ms() - self.start_time.get()) * self.rate.get()
    }

    /// Change the playback rate.
    ///
    /// Elapsed time is folded in at the old rate first.
    pub fn set_rate(&self, rate: f64) {
        if !rate.is_finite() || rate < 0.0 {
            log::warn!("Ignoring invalid clock rate {}", rate);
            return;
        }

        if self.started.get() {
            self.accumulated.set(self.accumulated.get() + self.elapsed());
            self.start_time.set(self.source.now_ms());
        }

        self.rate.set(rate);
    }

    /// Current logical time clamped to `[0, max]`
    pub fn time(&self, max: f64) -> f64 {
        let time = if self.started.get() {
            self.accumulated.get() + self.elapsed()
        } else {
            self.accumulated.get()
        };

        time.min(max).max(0.0)
    }

    /// `time(max) / max` clamped to `[0, 1]`; zero when `max` is zero
    pub fn progress(&self, max: f64) -> f64 {
        if max == 0.0 {
            return 0.0;
        }

        (self.time(max) / max).clamp(0.0, 1.0)
    }

    /// Start counting. No-op while already running.
    pub fn start(&self) {
        if self.started.get() {
            return;
        }

        self.start_time.set(self.source.now_ms());
        self.started.set(true);
        self.start_callbacks.emit(&());
    }

    /// Stop counting, folding elapsed time into the accumulator. No-op while stopped.
    pub fn stop(&self) {
        if !self.started.get() {
            return;
        }

        self.accumulated.set(self.accumulated.get() + self.elapsed());
        self.started.set(false);
        self.stop_callbacks.emit(&());
    }

    pub fn set_time(&self, time: f64) {
        if self.started.get() {
            self.start_time.set(self.source.now_ms());
        }

        self.accumulated.set(time);
        self.set_time_callbacks.emit(&());
    }

    /// Observe a clock transition; fires after the state has changed
    pub fn on_event(&self, event: ClockEvent, callback: impl Fn() + 'static) -> Subscription {
        let callbacks = match event {
            ClockEvent::Start => &self.start_callbacks,
            ClockEvent::Stop => &self.stop_callbacks,
            ClockEvent::SetTime => &self.set_time_callbacks,
        };
        callbacks.subscribe(move |_| callback())
    }

    #[cfg(test)]
    pub(crate) fn accumulated(&self) -> f64 {
        self.accumulated.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_clock() -> (Clock, ManualTimeSource) {
        let source = ManualTimeSource::new();
        (Clock::new(Rc::new(source.clone())), source)
    }

    #[test]
    fn test_clock_accumulates_only_while_running() {
        let (clock, source) = manual_clock();

        source.advance(500.0);
        assert_eq!(clock.time(10_000.0), 0.0);

        clock.start();
        source.advance(1_000.0);
        assert_eq!(clock.time(10_000.0), 1_000.0);

        clock.stop();
        source.advance(1_000.0);
        assert_eq!(clock.time(10_000.0), 1_000.0);
        assert_eq!(clock.accumulated(), 1_000.0);
    }

    #[test]
    fn test_time_is_clamped_to_max() {
        let (clock, source) = manual_clock();
        clock.start();
        source.advance(5_000.0);

        assert_eq!(clock.time(2_000.0), 2_000.0);
        clock.stop();
        assert_eq!(clock.time(2_000.0), clock.accumulated().min(2_000.0));
    }

    #[test]
    fn test_start_is_not_reentrant() {
        let (clock, source) = manual_clock();
        clock.start();
        source.advance(300.0);
        clock.start();
        source.advance(200.0);

        assert_eq!(clock.time(10_000.0), 500.0);
    }

    #[test]
    fn test_rate_change_is_not_retroactive() {
        let (clock, source) = manual_clock();
        let delta = 1_000.0;

        clock.start();
        source.advance(delta);
        clock.set_rate(2.0);
        source.advance(delta);
        clock.stop();

        // first delta at rate 1, second at rate 2
        assert_eq!(clock.accumulated(), 3.0 * delta);
    }

    #[test]
    fn test_rate_doubles_elapsed_time() {
        let (clock, source) = manual_clock();
        clock.set_rate(2.0);
        clock.start();
        source.advance(1_000.0);
        clock.stop();

        assert_eq!(clock.accumulated(), 2_000.0);
    }

    #[test]
    fn test_set_time_while_running_rebases() {
        let (clock, source) = manual_clock();
        clock.start();
        source.advance(4_000.0);
        clock.set_time(1_000.0);
        source.advance(250.0);

        assert_eq!(clock.time(10_000.0), 1_250.0);
    }

    #[test]
    fn test_time_never_decreases_while_running() {
        let (clock, source) = manual_clock();
        clock.start();
        let mut last = clock.time(60_000.0);

        for step in 0..20 {
            source.advance(37.0);
            if step == 10 {
                clock.set_rate(0.5);
            }
            let now = clock.time(60_000.0);
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_progress() {
        let (clock, _source) = manual_clock();
        assert_eq!(clock.progress(0.0), 0.0);

        clock.set_time(500.0);
        assert_eq!(clock.progress(1_000.0), 0.5);

        clock.set_time(5_000.0);
        assert_eq!(clock.progress(1_000.0), 1.0);
    }

    #[test]
    fn test_events_fire_on_transitions() {
        let (clock, _source) = manual_clock();
        let starts = Rc::new(Cell::new(0));
        let stops = Rc::new(Cell::new(0));

        let s = Rc::clone(&starts);
        let start_subscription = clock.on_event(ClockEvent::Start, move || s.set(s.get() + 1));
        let t = Rc::clone(&stops);
        clock.on_event(ClockEvent::Stop, move || t.set(t.get() + 1)).detach();

        clock.start();
        clock.start();
        clock.stop();
        clock.stop();
        assert_eq!(starts.get(), 1);
        assert_eq!(stops.get(), 1);

        start_subscription.cancel();
        clock.start();
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn test_invalid_rate_is_ignored() {
        let (clock, _source) = manual_clock();
        clock.set_rate(-1.0);
        clock.set_rate(f64::NAN);
        assert_eq!(clock.rate(), 1.0);
    }
}
