//! Subtitle edge detection for auto-pause.
//!
//! Subtitle queries run on every refresh, so the same edge is observed many
//! times. The context reports each subtitle's start and imminent end once,
//! until a seek clears it.

use std::cell::Cell;

use crate::core::events::{Callbacks, Subscription};
use crate::subtitle::model::DisplaySubtitle;

#[derive(Default)]
pub struct AutoPauseContext {
    last_started_showing: Cell<Option<usize>>,
    last_will_stop_showing: Cell<Option<usize>>,
    started_showing: Callbacks<DisplaySubtitle>,
    will_stop_showing: Callbacks<DisplaySubtitle>,
}

impl AutoPauseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_showing(&self, subtitle: &DisplaySubtitle) {
        if self.last_started_showing.get() == Some(subtitle.index) {
            return;
        }

        self.last_started_showing.set(Some(subtitle.index));
        self.started_showing.emit(subtitle);
    }

    pub fn will_stop_showing(&self, subtitle: &DisplaySubtitle) {
        if self.last_will_stop_showing.get() == Some(subtitle.index) {
            return;
        }

        self.last_will_stop_showing.set(Some(subtitle.index));
        self.will_stop_showing.emit(subtitle);
    }

    /// Forget reported edges so they can fire again
    pub fn clear(&self) {
        self.last_started_showing.set(None);
        self.last_will_stop_showing.set(None);
    }

    pub fn on_started_showing(
        &self,
        callback: impl Fn(&DisplaySubtitle) + 'static,
    ) -> Subscription {
        self.started_showing.subscribe(callback)
    }

    pub fn on_will_stop_showing(
        &self,
        callback: impl Fn(&DisplaySubtitle) + 'static,
    ) -> Subscription {
        self.will_stop_showing.subscribe(callback)
    }
}
