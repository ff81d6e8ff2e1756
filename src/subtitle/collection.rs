//! Point-in-time subtitle lookup.
//!
//! Intervals are held in a sorted array with a running maximum of interval
//! ends, so a point query is a binary search followed by a backward scan that
//! stops as soon as no earlier interval can reach the timestamp. A second index
//! over the gaps between subtitles answers "what was shown last" during silence.
//!
//! A collection is immutable once built. Changing subtitles or offset means
//! building a new collection and swapping it in.

use crate::core::time::Time;
use crate::subtitle::model::Timed;

#[derive(Debug, Clone, Copy)]
struct Entry {
    low: Time,
    // inclusive
    high: Time,
    item: usize,
    order: usize,
}

#[derive(Debug, Default)]
struct IntervalIndex {
    entries: Vec<Entry>,
    max_high: Vec<Time>,
}

impl IntervalIndex {
    fn build(mut entries: Vec<Entry>) -> Self {
        entries.sort_by_key(|e| e.low);

        let mut max_high = Vec::with_capacity(entries.len());
        let mut running = Time::MIN;
        for entry in &entries {
            running = running.max(entry.high);
            max_high.push(running);
        }

        Self { entries, max_high }
    }

    /// Entries containing `point`, in insertion order
    fn query(&self, point: Time) -> Vec<Entry> {
        let candidates = self.entries.partition_point(|e| e.low <= point);
        let mut found = Vec::new();

        for i in (0..candidates).rev() {
            if self.max_high[i] < point {
                break;
            }
            if self.entries[i].high >= point {
                found.push(self.entries[i]);
            }
        }

        found.sort_by_key(|e| e.order);
        found
    }
}

/// Lookup options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Report the subtitle shown before the current gap
    pub return_last_shown: bool,
    /// Report the subtitle shown after the current gap
    pub return_next_to_show: bool,
    /// Detect subtitles that started or will stop within this many milliseconds
    pub showing_check_radius_ms: Option<Time>,
}

/// Result of a point query
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleSlice<T> {
    pub showing: Vec<T>,
    pub last_shown: Option<Vec<T>>,
    pub next_to_show: Option<Vec<T>>,
    pub started_showing: Option<T>,
    pub will_stop_showing: Option<T>,
}

impl<T> Default for SubtitleSlice<T> {
    fn default() -> Self {
        Self {
            showing: Vec::new(),
            last_shown: None,
            next_to_show: None,
            started_showing: None,
            will_stop_showing: None,
        }
    }
}

/// Interval index over a subtitle list
#[derive(Debug)]
pub struct SubtitleCollection<T> {
    subtitles: Vec<T>,
    tree: IntervalIndex,
    gaps: Option<IntervalIndex>,
    options: CollectionOptions,
}

impl<T: Timed + Clone> SubtitleCollection<T> {
    pub fn new(subtitles: Vec<T>, options: CollectionOptions) -> Self {
        let mut tree = Vec::new();
        let mut gaps = Vec::new();
        let mut last: Option<usize> = None;

        let mut live = subtitles
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_sentinel())
            .peekable();

        if let Some((first, s)) = live.peek() {
            if s.start() > 0 {
                gaps.push(Entry {
                    low: 0,
                    high: s.start() - 1,
                    item: *first,
                    order: 0,
                });
            }
        }

        for (i, s) in live {
            if s.start() < s.end() {
                tree.push(Entry {
                    low: s.start(),
                    high: s.end() - 1,
                    item: i,
                    order: i,
                });
            }

            if let Some(previous) = last {
                let previous_end = subtitles[previous].end();
                if previous_end < s.start() {
                    gaps.push(Entry {
                        low: previous_end,
                        high: s.start() - 1,
                        item: previous,
                        order: gaps.len(),
                    });
                }
            }

            last = Some(i);
        }

        let gaps = if options.return_last_shown || options.return_next_to_show {
            Some(IntervalIndex::build(gaps))
        } else {
            None
        };

        Self {
            subtitles,
            tree: IntervalIndex::build(tree),
            gaps,
            options,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), CollectionOptions::default())
    }

    pub fn subtitles(&self) -> &[T] {
        &self.subtitles
    }

    pub fn len(&self) -> usize {
        self.subtitles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtitles.is_empty()
    }

    fn items(&self, entries: &[Entry]) -> Vec<T> {
        entries.iter().map(|e| self.subtitles[e.item].clone()).collect()
    }

    /// Subtitles around `timestamp`
    pub fn subtitles_at(&self, timestamp: Time) -> SubtitleSlice<T> {
        let showing = self.tree.query(timestamp);
        let mut slice = SubtitleSlice {
            showing: self.items(&showing),
            ..SubtitleSlice::default()
        };

        if showing.is_empty() {
            let Some(gaps) = &self.gaps else {
                return slice;
            };

            let gap = gaps.query(timestamp);
            if let (Some(first), true) = (gap.first(), self.options.return_next_to_show) {
                let next = self.tree.query(first.high + 1);
                slice.next_to_show = Some(self.items(&next));
            }
            slice.last_shown = Some(self.items(&gap));
            return slice;
        }

        if let Some(radius) = self.options.showing_check_radius_ms {
            for s in &slice.showing {
                if slice.will_stop_showing.is_none() && s.end() <= timestamp + radius {
                    slice.will_stop_showing = Some(s.clone());
                }

                if slice.started_showing.is_none() && timestamp - radius < s.start() {
                    slice.started_showing = Some(s.clone());
                }

                if slice.started_showing.is_some() && slice.will_stop_showing.is_some() {
                    break;
                }
            }
        }

        slice
    }
}
