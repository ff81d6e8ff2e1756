//! Condensed playback: skip the gaps between subtitles.
//!
//! A poll runs every [`CondensedConfig::interval`]. When the clock sits in a
//! gap that is long enough to be worth it, the scheduler seeks to the start of
//! the next subtitle. Seek latency is measured and fed back into the threshold.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::time::Time;
use crate::playback::sync::SyncController;
use crate::subtitle::model::Timed;

/// Condensed playback tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CondensedConfig {
    /// Poll period
    pub interval: Duration,
    /// Seek latency assumed before the first measurement (ms)
    pub initial_expected_seek_time: f64,
    /// Extra room a gap must leave on top of the expected seek time (ms)
    pub safety_margin: Time,
}

impl Default for CondensedConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            initial_expected_seek_time: 1_000.0,
            safety_margin: 500,
        }
    }
}

pub struct CondensedScheduler {
    sync: Rc<SyncController>,
    spans: Vec<(Time, Time)>,
    length: Time,
    config: CondensedConfig,
    expected_seek_time: Cell<f64>,
    seeking: Cell<bool>,
    cancelled: Cell<bool>,
    session_closed: Rc<Cell<bool>>,
}

impl CondensedScheduler {
    /// Scheduler over `subtitles` for a track `length` milliseconds long
    pub fn new<T: Timed>(
        sync: Rc<SyncController>,
        subtitles: &[T],
        length: Time,
        config: CondensedConfig,
    ) -> Rc<Self> {
        Self::for_session(sync, subtitles, length, config, Rc::new(Cell::new(false)))
    }

    /// Like [`new`](Self::new), tied to a session: once `session_closed` is
    /// set, a seek still in flight does not restart the clock.
    pub fn for_session<T: Timed>(
        sync: Rc<SyncController>,
        subtitles: &[T],
        length: Time,
        config: CondensedConfig,
        session_closed: Rc<Cell<bool>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            sync,
            spans: subtitles.iter().map(|s| (s.start(), s.end())).collect(),
            length,
            config,
            expected_seek_time: Cell::new(config.initial_expected_seek_time),
            seeking: Cell::new(false),
            cancelled: Cell::new(false),
            session_closed,
        })
    }

    /// Latest measured seek duration (ms)
    pub fn expected_seek_time(&self) -> f64 {
        self.expected_seek_time.get()
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking.get()
    }

    /// Start polling on the current `LocalSet`.
    ///
    /// Returns `None` when there is nothing to skip between. Polling stops
    /// when the handle is dropped.
    pub fn start(self: &Rc<Self>) -> Option<SchedulerHandle> {
        if self.spans.is_empty() {
            return None;
        }

        let period = self.config.interval.max(Duration::from_millis(1));
        let scheduler = Rc::clone(self);
        let task = tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let tick = Rc::clone(&scheduler);
                tokio::task::spawn_local(async move { tick.tick().await });
            }
        });

        log::debug!("Condensed playback started over {} subtitles", self.spans.len());
        Some(SchedulerHandle {
            scheduler: Rc::clone(self),
            task,
        })
    }

    /// Index of the subtitle containing the clock, and of the subtitle that
    /// is current or comes next.
    ///
    /// Scans from the end; the last subtitle starting at or before the clock wins.
    fn locate(&self, progress: f64) -> (Option<usize>, usize) {
        let length = self.length as f64;
        let last = self.spans.len() - 1;

        for (i, (start, end)) in self.spans.iter().enumerate().rev() {
            if progress >= *start as f64 / length {
                if progress < *end as f64 / length {
                    return (Some(i), i);
                }
                return (None, (i + 1).min(last));
            }
        }

        (None, 0)
    }

    /// One poll
    pub async fn tick(&self) {
        if self.length <= 0 || self.spans.is_empty() || self.cancelled.get() {
            return;
        }

        let clock = Rc::clone(self.sync.clock());
        let length = self.length as f64;
        let progress = clock.progress(length);
        let (current, current_or_next) = self.locate(progress);

        if current == Some(current_or_next) {
            return;
        }

        let next_start = self.spans[current_or_next].0;
        let remaining = next_start as f64 - progress * length;
        if remaining < self.expected_seek_time.get() + self.config.safety_margin as f64 {
            return;
        }

        if self.seeking.get() {
            return;
        }

        let playing = self.sync.playing();
        if playing {
            clock.stop();
        }

        self.seeking.set(true);
        let started = clock.now_ms();
        log::debug!("Skipping gap to {}ms", next_start);
        self.sync.seek(next_start, true).await;
        self.expected_seek_time.set(clock.now_ms() - started);
        self.seeking.set(false);

        // The handle may be gone by now; the session and play state decide.
        if playing && self.sync.playing() && !self.session_closed.get() {
            clock.start();
        }
    }
}

/// Running condensed poll; dropping it stops the poll
pub struct SchedulerHandle {
    scheduler: Rc<CondensedScheduler>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn scheduler(&self) -> &Rc<CondensedScheduler> {
        &self.scheduler
    }

    /// Stop polling now
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.scheduler.cancelled.set(true);
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, ManualTimeSource};
    use crate::media::adapter::tests::FakeElement;
    use crate::media::{MediaAdapter, HAVE_ENOUGH_DATA};
    use crate::subtitle::model::{from_cues, DisplaySubtitle, RawCue};
    use crate::testing::settle;
    use tokio::task::LocalSet;

    fn subtitles(spans: &[(Time, Time)]) -> Vec<DisplaySubtitle> {
        from_cues(
            spans
                .iter()
                .map(|(start, end)| RawCue {
                    start: *start,
                    end: *end,
                    text: String::new(),
                    track: 0,
                })
                .collect(),
            0,
        )
    }

    fn sync() -> (Rc<SyncController>, ManualTimeSource) {
        let source = ManualTimeSource::new();
        let clock = Rc::new(Clock::new(Rc::new(source.clone())));
        (Rc::new(SyncController::new(clock)), source)
    }

    fn config(expected: f64) -> CondensedConfig {
        CondensedConfig {
            initial_expected_seek_time: expected,
            ..CondensedConfig::default()
        }
    }

    #[test]
    fn test_skips_long_gap_only() {
        let (sync, _source) = sync();
        let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
        let scheduler = CondensedScheduler::new(Rc::clone(&sync), &subs, 10_000, config(500.0));

        sync.clock().set_time(4_700.0);
        pollster::block_on(scheduler.tick());
        assert_eq!(sync.clock().time(10_000.0), 4_700.0);

        sync.clock().set_time(1_200.0);
        pollster::block_on(scheduler.tick());
        assert_eq!(sync.clock().time(10_000.0), 5_000.0);
    }

    #[test]
    fn test_inside_subtitle_or_after_last_is_left_alone() {
        let (sync, _source) = sync();
        let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
        let scheduler = CondensedScheduler::new(Rc::clone(&sync), &subs, 10_000, config(0.0));

        sync.clock().set_time(500.0);
        pollster::block_on(scheduler.tick());
        assert_eq!(sync.clock().time(10_000.0), 500.0);

        sync.clock().set_time(8_000.0);
        pollster::block_on(scheduler.tick());
        assert_eq!(sync.clock().time(10_000.0), 8_000.0);
    }

    #[test]
    fn test_leading_gap_skips_to_first_subtitle() {
        let (sync, _source) = sync();
        let subs = subtitles(&[(4_000, 5_000)]);
        let scheduler = CondensedScheduler::new(Rc::clone(&sync), &subs, 10_000, config(0.0));

        pollster::block_on(scheduler.tick());
        assert_eq!(sync.clock().time(10_000.0), 4_000.0);
    }

    #[test]
    fn test_unknown_length_is_a_no_op() {
        let (sync, _source) = sync();
        let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
        let scheduler = CondensedScheduler::new(Rc::clone(&sync), &subs, 0, config(0.0));

        sync.clock().set_time(1_200.0);
        pollster::block_on(scheduler.tick());
        assert_eq!(sync.clock().time(10_000.0), 1_200.0);
    }

    #[test]
    fn test_seek_preserves_play_state() {
        let (sync, _source) = sync();
        let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
        let scheduler = CondensedScheduler::new(Rc::clone(&sync), &subs, 10_000, config(0.0));

        sync.clock().set_time(1_200.0);
        sync.play(false);
        pollster::block_on(scheduler.tick());
        assert!(sync.clock().running());

        sync.pause(false);
        sync.clock().set_time(1_200.0);
        pollster::block_on(scheduler.tick());
        assert!(!sync.clock().running());
    }

    #[tokio::test]
    async fn test_measures_seek_latency_and_skips_reentrant_ticks() {
        LocalSet::new()
            .run_until(async {
                let (sync, source) = sync();
                let element = FakeElement::new(0);
                sync.set_media(MediaAdapter::new(element.clone()));
                let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
                let scheduler =
                    CondensedScheduler::new(Rc::clone(&sync), &subs, 10_000, config(0.0));

                sync.clock().set_time(1_200.0);
                let first = Rc::clone(&scheduler);
                tokio::task::spawn_local(async move { first.tick().await });
                settle().await;
                assert!(scheduler.is_seeking());
                assert_eq!(element.time.get(), 5.0);

                element.time.set(0.0);
                sync.clock().set_time(1_200.0);
                scheduler.tick().await;
                assert_eq!(element.time.get(), 0.0);

                source.advance(300.0);
                element.can_play();
                settle().await;
                assert!(!scheduler.is_seeking());
                assert_eq!(scheduler.expected_seek_time(), 300.0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_runs_until_handle_dropped() {
        LocalSet::new()
            .run_until(async {
                let (sync, _source) = sync();
                let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
                let scheduler =
                    CondensedScheduler::new(Rc::clone(&sync), &subs, 10_000, config(0.0));

                sync.clock().set_time(1_200.0);
                let handle = scheduler.start();
                assert!(handle.is_some());
                tokio::time::sleep(Duration::from_millis(150)).await;
                assert_eq!(sync.clock().time(10_000.0), 5_000.0);

                drop(handle);
                sync.clock().set_time(1_200.0);
                tokio::time::sleep(Duration::from_millis(300)).await;
                assert_eq!(sync.clock().time(10_000.0), 1_200.0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_seek_in_flight_resumes_after_cancel() {
        LocalSet::new()
            .run_until(async {
                let (sync, _source) = sync();
                let element = FakeElement::new(HAVE_ENOUGH_DATA);
                sync.set_media(MediaAdapter::new(element.clone()));
                let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
                let scheduler =
                    CondensedScheduler::new(Rc::clone(&sync), &subs, 10_000, config(0.0));
                let handle = scheduler.start();

                sync.clock().set_time(1_200.0);
                sync.play(false);
                let tick = Rc::clone(&scheduler);
                tokio::task::spawn_local(async move { tick.tick().await });
                settle().await;
                assert!(!sync.clock().running());

                if let Some(handle) = handle {
                    handle.cancel();
                }
                element.can_play();
                settle().await;

                assert!(sync.clock().running());
                assert_eq!(sync.clock().time(10_000.0), 5_000.0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_closed_session_or_pause_keeps_clock_stopped() {
        LocalSet::new()
            .run_until(async {
                let (sync, _source) = sync();
                let element = FakeElement::new(HAVE_ENOUGH_DATA);
                sync.set_media(MediaAdapter::new(element.clone()));
                let subs = subtitles(&[(0, 1_000), (5_000, 6_000)]);
                let closed = Rc::new(Cell::new(false));
                let scheduler = CondensedScheduler::for_session(
                    Rc::clone(&sync),
                    &subs,
                    10_000,
                    config(0.0),
                    Rc::clone(&closed),
                );

                sync.clock().set_time(1_200.0);
                sync.play(false);
                let tick = Rc::clone(&scheduler);
                tokio::task::spawn_local(async move { tick.tick().await });
                settle().await;
                closed.set(true);
                element.can_play();
                settle().await;
                assert!(!sync.clock().running());

                closed.set(false);
                sync.clock().set_time(1_200.0);
                let tick = Rc::clone(&scheduler);
                tokio::task::spawn_local(async move { tick.tick().await });
                settle().await;
                sync.pause(false);
                element.can_play();
                settle().await;
                assert!(!sync.clock().running());
            })
            .await;
    }

    #[test]
    fn test_no_subtitles_means_no_poll() {
        let (sync, _source) = sync();
        let subs: Vec<DisplaySubtitle> = Vec::new();
        let scheduler = CondensedScheduler::new(sync, &subs, 10_000, CondensedConfig::default());

        assert!(scheduler.start().is_none());
    }
}
