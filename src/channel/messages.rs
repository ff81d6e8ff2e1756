//! Wire messages exchanged between the subtitle player and a video surface.
//!
//! Every message is a JSON object discriminated by its `command` field.
//! Decoding never fails hard: commands this build does not know are reported
//! as [`Inbound::Unknown`] so both peers keep running when the other side is
//! newer.
//!
//! Times: `currentTime` values and the video's `duration` are in seconds,
//! matching media element units. Offsets, subtitle times and the player's
//! `ready` duration are in milliseconds.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::time::{self, Time};
use crate::settings::{AnkiSettings, MiscSettings, SubtitleSettings};
use crate::subtitle::model::Subtitle;

/// Messages that can originate from either peer carry an echo flag.
///
/// `true` asks the receiver to apply the change to its media as well;
/// `false` reports a change the sender has already applied.
pub trait Echoed {
    fn echo(&self) -> bool;
}

fn echo_requested() -> bool {
    true
}

fn normal_rate() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoMessage {
    #[serde(default = "echo_requested")]
    pub echo: bool,
}

impl Echoed for EchoMessage {
    fn echo(&self) -> bool {
        self.echo
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTimeMessage {
    /// Seconds
    pub value: f64,
    #[serde(default = "echo_requested")]
    pub echo: bool,
}

impl Echoed for CurrentTimeMessage {
    fn echo(&self) -> bool {
        self.echo
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrackSelectedMessage {
    pub id: String,
    #[serde(default)]
    pub echo: bool,
}

impl Echoed for AudioTrackSelectedMessage {
    fn echo(&self) -> bool {
        self.echo
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRateMessage {
    pub value: f64,
    #[serde(default)]
    pub echo: bool,
}

impl Echoed for PlaybackRateMessage {
    fn echo(&self) -> bool {
        self.echo
    }
}

/// Single-value payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMessage<T> {
    pub value: T,
}

impl<T> ValueMessage<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

/// Subtitle offset in milliseconds; senders may produce fractional values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetMessage {
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub value: Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub language: String,
}

/// Video surface announcing it has loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyFromVideoMessage {
    /// Seconds
    pub duration: f64,
    #[serde(default)]
    pub current_time: f64,
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_tracks: Option<Vec<AudioTrack>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_audio_track: Option<String>,
    #[serde(default = "normal_rate")]
    pub playback_rate: f64,
}

/// Mining request raised on the video surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub subtitle: Option<Subtitle>,
    #[serde(default)]
    pub surrounding_subtitles: Vec<Subtitle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Value>,
    #[serde(default)]
    pub prevent_duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnkiDialogRequestMessage {
    #[serde(default)]
    pub forward_to_video: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleSubtitleTrackMessage {
    pub track: usize,
}

/// Messages sent by the video surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum FromVideoMessage {
    Ready(ReadyFromVideoMessage),
    ReadyState(ValueMessage<u8>),
    Play(EchoMessage),
    Pause(EchoMessage),
    AudioTrackSelected(AudioTrackSelectedMessage),
    CurrentTime(CurrentTimeMessage),
    Exit,
    Offset(OffsetMessage),
    PopOutToggle,
    Copy(CopyMessage),
    CondensedModeToggle,
    HideSubtitlePlayerToggle,
    Sync,
    Syncv2,
    AnkiDialogRequest(AnkiDialogRequestMessage),
    ToggleSubtitleTrackInList(ToggleSubtitleTrackMessage),
    PlaybackRate(PlaybackRateMessage),
}

/// Player announcing the session to the video surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyToVideoMessage {
    /// Milliseconds
    pub duration: Time,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitlesMessage {
    pub value: Vec<Subtitle>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedAnkiDialogRequestMessage {
    pub resume: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub message: String,
    pub severity: String,
}

/// Messages sent by the subtitle player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum ToVideoMessage {
    Ready(ReadyToVideoMessage),
    Init,
    Play(EchoMessage),
    Pause(EchoMessage),
    AudioTrackSelected(AudioTrackSelectedMessage),
    CurrentTime(CurrentTimeMessage),
    Subtitles(SubtitlesMessage),
    Offset(OffsetMessage),
    SubtitleSettings(ValueMessage<SubtitleSettings>),
    AnkiSettings(ValueMessage<AnkiSettings>),
    MiscSettings(ValueMessage<MiscSettings>),
    CondensedModeToggle(ValueMessage<bool>),
    HideSubtitlePlayerToggle(ValueMessage<bool>),
    AnkiDialogRequest,
    FinishedAnkiDialogRequest(FinishedAnkiDialogRequestMessage),
    PlaybackRate(PlaybackRateMessage),
    Alert(AlertMessage),
    Close,
}

/// A message family decodable from the wire
pub trait Command: Serialize + DeserializeOwned {
    /// Every `command` value this family understands
    const COMMANDS: &'static [&'static str];
}

impl Command for FromVideoMessage {
    const COMMANDS: &'static [&'static str] = &[
        "ready",
        "readyState",
        "play",
        "pause",
        "audioTrackSelected",
        "currentTime",
        "exit",
        "offset",
        "popOutToggle",
        "copy",
        "condensedModeToggle",
        "hideSubtitlePlayerToggle",
        "sync",
        "syncv2",
        "ankiDialogRequest",
        "toggleSubtitleTrackInList",
        "playbackRate",
    ];
}

impl Command for ToVideoMessage {
    const COMMANDS: &'static [&'static str] = &[
        "ready",
        "init",
        "play",
        "pause",
        "audioTrackSelected",
        "currentTime",
        "subtitles",
        "offset",
        "subtitleSettings",
        "ankiSettings",
        "miscSettings",
        "condensedModeToggle",
        "hideSubtitlePlayerToggle",
        "ankiDialogRequest",
        "finishedAnkiDialogRequest",
        "playbackRate",
        "alert",
        "close",
    ];
}

/// Outcome of decoding one inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<M> {
    Known(M),
    /// A command this build does not handle
    Unknown(String),
    /// A known command whose payload did not match, or no command at all
    Malformed(String),
}

pub fn decode<M: Command>(value: Value) -> Inbound<M> {
    let command = match value.get("command").and_then(Value::as_str) {
        Some(command) => command.to_string(),
        None => return Inbound::Malformed("missing command".to_string()),
    };

    if !M::COMMANDS.contains(&command.as_str()) {
        return Inbound::Unknown(command);
    }

    match serde_json::from_value(value) {
        Ok(message) => Inbound::Known(message),
        Err(e) => Inbound::Malformed(format!("{}: {}", command, e)),
    }
}

/// Serialise a message for the transport
pub fn encode<M: Command>(message: &M) -> Option<Value> {
    match serde_json::to_value(message) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Failed to encode message: {}", e);
            None
        }
    }
}
