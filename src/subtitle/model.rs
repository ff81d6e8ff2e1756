//! Subtitle records as they move through the system.
//!
//! Offsets are applied by deriving a fresh list from the immutable original
//! times, never by editing a list in place.

use serde::{Deserialize, Serialize};

use crate::core::time::{self, Time};

/// Anything occupying an interval on the subtitle timeline
pub trait Timed {
    fn start(&self) -> Time;
    fn end(&self) -> Time;

    /// Placeholders carry negative times and are never selected as current
    fn is_sentinel(&self) -> bool {
        self.start() < 0 || self.end() < 0
    }
}

/// A cue as produced by a subtitle reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCue {
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub start: Time,
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub end: Time,
    pub text: String,
    #[serde(default)]
    pub track: usize,
}

/// A subtitle with its offset-adjusted and original times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtitle {
    pub text: String,
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub start: Time,
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub end: Time,
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub original_start: Time,
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub original_end: Time,
    pub track: usize,
}

impl Subtitle {
    /// Copy shifted by `offset` from the original times
    pub fn with_offset(&self, offset: Time) -> Self {
        Self {
            start: self.original_start + offset,
            end: self.original_end + offset,
            ..self.clone()
        }
    }
}

impl From<RawCue> for Subtitle {
    fn from(cue: RawCue) -> Self {
        Self {
            text: cue.text,
            start: cue.start,
            end: cue.end,
            original_start: cue.start,
            original_end: cue.end,
            track: cue.track,
        }
    }
}

impl Timed for Subtitle {
    fn start(&self) -> Time {
        self.start
    }

    fn end(&self) -> Time {
        self.end
    }
}

/// Subtitle as shown in the player's list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySubtitle {
    #[serde(flatten)]
    pub subtitle: Subtitle,
    pub display_time: String,
    pub index: usize,
}

impl Timed for DisplaySubtitle {
    fn start(&self) -> Time {
        self.subtitle.start
    }

    fn end(&self) -> Time {
        self.subtitle.end
    }
}

/// Wrap reader output for display, applying `offset` on top of the cue times
pub fn from_cues(cues: Vec<RawCue>, offset: Time) -> Vec<DisplaySubtitle> {
    let subtitles: Vec<Subtitle> = cues.into_iter().map(Subtitle::from).collect();
    let length = subtitles.last().map(|s| s.original_end).unwrap_or(0);

    subtitles
        .into_iter()
        .enumerate()
        .map(|(index, subtitle)| display(subtitle.with_offset(offset), index, length))
        .collect()
}

/// Derive a new list shifted by `offset` relative to the original times.
///
/// Applying the same offset twice yields identical times.
pub fn apply_offset(subtitles: &[DisplaySubtitle], offset: Time) -> Vec<DisplaySubtitle> {
    let length = subtitles.last().map(|s| s.subtitle.original_end).unwrap_or(0);

    subtitles
        .iter()
        .map(|s| display(s.subtitle.with_offset(offset), s.index, length))
        .collect()
}

/// Current offset of a list, read back from its first subtitle
pub fn current_offset(subtitles: &[DisplaySubtitle]) -> Time {
    subtitles
        .first()
        .map(|s| s.subtitle.start - s.subtitle.original_start)
        .unwrap_or(0)
}

fn display(subtitle: Subtitle, index: usize, length: Time) -> DisplaySubtitle {
    DisplaySubtitle {
        display_time: time::format_duration(subtitle.start, length),
        subtitle,
        index,
    }
}

/// Length of the playable track: the longer of the media and the subtitles
pub fn track_length(duration_seconds: Option<f64>, subtitles: &[DisplaySubtitle]) -> Time {
    let media = duration_seconds
        .filter(|d| d.is_finite())
        .map(time::from_seconds)
        .unwrap_or(0);
    let subs = subtitles.last().map(|s| s.subtitle.original_end).unwrap_or(0);

    media.max(subs)
}
