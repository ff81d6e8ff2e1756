//! The subtitle player's proxy for a video living in another context.
//!
//! [`VideoChannel`] mirrors the remote video's state from inbound messages and
//! turns local commands into outbound ones. It also implements
//! [`MediaElement`], so a [`MediaAdapter`](crate::media::MediaAdapter) can seek
//! and await readiness on a remote video exactly as on a local one.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::channel::messages::{
    decode, AlertMessage, AnkiDialogRequestMessage, AudioTrack, AudioTrackSelectedMessage,
    CopyMessage, CurrentTimeMessage, EchoMessage, Echoed, FinishedAnkiDialogRequestMessage,
    FromVideoMessage, Inbound, OffsetMessage, PlaybackRateMessage, ReadyToVideoMessage,
    SubtitlesMessage, ToVideoMessage, ValueMessage,
};
use crate::channel::Outbox;
use crate::core::events::{Callbacks, Subscription};
use crate::core::time::Time;
use crate::media::element::{CanPlayHandler, MediaElement, HAVE_ENOUGH_DATA, HAVE_FUTURE_DATA};
use crate::protocol::VideoProtocol;
use crate::settings::{AnkiSettings, MiscSettings, SubtitleSettings};
use crate::subtitle::model::Subtitle;

/// Local cache of the remote video's state
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredState {
    /// Seconds
    pub current_time: f64,
    /// Seconds
    pub duration: f64,
    pub is_ready: bool,
    pub ready_state: u8,
    pub audio_tracks: Option<Vec<AudioTrack>>,
    pub selected_audio_track: Option<String>,
    pub playing: bool,
    pub playback_rate: f64,
}

impl Default for MirroredState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_ready: false,
            ready_state: 0,
            audio_tracks: None,
            selected_audio_track: None,
            playing: false,
            playback_rate: 1.0,
        }
    }
}

#[derive(Default)]
struct Handlers {
    ready: Callbacks<bool>,
    play: Callbacks<bool>,
    pause: Callbacks<bool>,
    current_time: Callbacks<(f64, bool)>,
    audio_track_selected: Callbacks<String>,
    exit: Callbacks<()>,
    offset: Callbacks<Time>,
    pop_out_toggle: Callbacks<()>,
    copy: Callbacks<CopyMessage>,
    condensed_mode_toggle: Callbacks<()>,
    hide_subtitle_player_toggle: Callbacks<()>,
    anki_dialog_request: Callbacks<bool>,
    toggle_subtitle_track_in_list: Callbacks<usize>,
}

impl Handlers {
    fn clear(&self) {
        self.ready.clear();
        self.play.clear();
        self.pause.clear();
        self.current_time.clear();
        self.audio_track_selected.clear();
        self.exit.clear();
        self.offset.clear();
        self.pop_out_toggle.clear();
        self.copy.clear();
        self.condensed_mode_toggle.clear();
        self.hide_subtitle_player_toggle.clear();
        self.anki_dialog_request.clear();
        self.toggle_subtitle_track_in_list.clear();
    }
}

struct Inner {
    outbox: Outbox,
    state: RefCell<MirroredState>,
    handlers: Handlers,
    can_play: RefCell<Option<CanPlayHandler>>,
}

impl Inner {
    fn handle(&self, value: Value) {
        let message = match decode::<FromVideoMessage>(value) {
            Inbound::Known(message) => message,
            Inbound::Unknown(command) => {
                log::error!("Unrecognized event {}", command);
                return;
            }
            Inbound::Malformed(reason) => {
                log::warn!("Malformed message from video: {}", reason);
                return;
            }
        };

        match message {
            FromVideoMessage::Ready(ready) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.duration = ready.duration;
                    state.is_ready = true;
                    state.audio_tracks = ready.audio_tracks;
                    state.selected_audio_track = ready.selected_audio_track;
                    state.ready_state = HAVE_ENOUGH_DATA;
                    state.current_time = ready.current_time;
                    state.playing = !ready.paused;
                    state.playback_rate = ready.playback_rate;
                }
                log::debug!("Video ready, duration {}s", ready.duration);
                self.handlers.ready.emit(&ready.paused);
                self.fire_can_play();
            }
            FromVideoMessage::ReadyState(ready_state) => {
                self.state.borrow_mut().ready_state = ready_state.value;
                if ready_state.value == HAVE_ENOUGH_DATA {
                    self.fire_can_play();
                }
            }
            FromVideoMessage::Play(play) => {
                self.state.borrow_mut().playing = true;
                self.handlers.play.emit(&play.echo());
            }
            FromVideoMessage::Pause(pause) => {
                self.state.borrow_mut().playing = false;
                self.handlers.pause.emit(&pause.echo());
            }
            FromVideoMessage::AudioTrackSelected(selected) => {
                self.state.borrow_mut().selected_audio_track = Some(selected.id.clone());
                self.handlers.audio_track_selected.emit(&selected.id);
            }
            FromVideoMessage::CurrentTime(current_time) => {
                self.state.borrow_mut().current_time = current_time.value;
                self.handlers
                    .current_time
                    .emit(&(current_time.value, current_time.echo()));
            }
            FromVideoMessage::Exit => self.handlers.exit.emit(&()),
            FromVideoMessage::Offset(offset) => self.handlers.offset.emit(&offset.value),
            FromVideoMessage::PopOutToggle => self.handlers.pop_out_toggle.emit(&()),
            FromVideoMessage::Copy(copy) => self.handlers.copy.emit(&copy),
            FromVideoMessage::CondensedModeToggle => self.handlers.condensed_mode_toggle.emit(&()),
            FromVideoMessage::HideSubtitlePlayerToggle => {
                self.handlers.hide_subtitle_player_toggle.emit(&())
            }
            FromVideoMessage::Sync | FromVideoMessage::Syncv2 => {}
            FromVideoMessage::AnkiDialogRequest(request) => {
                self.handlers.anki_dialog_request.emit(&request.forward_to_video)
            }
            FromVideoMessage::ToggleSubtitleTrackInList(toggle) => {
                self.handlers.toggle_subtitle_track_in_list.emit(&toggle.track)
            }
            FromVideoMessage::PlaybackRate(rate) => {
                log::debug!("Ignoring playback rate {} reported by video", rate.value);
            }
        }
    }

    fn fire_can_play(&self) {
        let handler = self.can_play.borrow_mut().take();
        if let Some(handler) = handler {
            handler();
        }
    }
}

/// Player-side end of a video connection
#[derive(Clone)]
pub struct VideoChannel {
    inner: Rc<Inner>,
}

/// Non-owning handle, for callbacks registered on the channel itself
#[derive(Clone)]
pub struct WeakVideoChannel {
    inner: Weak<Inner>,
}

impl WeakVideoChannel {
    pub fn upgrade(&self) -> Option<VideoChannel> {
        self.inner.upgrade().map(|inner| VideoChannel { inner })
    }
}

impl VideoChannel {
    pub fn new(protocol: Box<dyn VideoProtocol>) -> Self {
        let inner = Rc::new(Inner {
            outbox: Outbox::new(protocol),
            state: RefCell::new(MirroredState::default()),
            handlers: Handlers::default(),
            can_play: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        inner
            .outbox
            .protocol()
            .set_on_message(Some(Box::new(move |value| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle(value);
                }
            })));

        Self { inner }
    }

    pub fn downgrade(&self) -> WeakVideoChannel {
        WeakVideoChannel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Snapshot of the mirrored remote state
    pub fn state(&self) -> MirroredState {
        self.inner.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().is_ready
    }

    pub fn playing(&self) -> bool {
        self.inner.state.borrow().playing
    }

    pub fn playback_rate(&self) -> f64 {
        self.inner.state.borrow().playback_rate
    }

    pub fn audio_tracks(&self) -> Option<Vec<AudioTrack>> {
        self.inner.state.borrow().audio_tracks.clone()
    }

    pub fn selected_audio_track(&self) -> Option<String> {
        self.inner.state.borrow().selected_audio_track.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.outbox.is_closed()
    }

    /// Called with the remote's paused flag on every ready message.
    ///
    /// If the video is already ready the callback also runs immediately,
    /// with `false`.
    pub fn on_ready(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        if self.is_ready() {
            callback(false);
        }
        self.inner.handlers.ready.subscribe(move |paused| callback(*paused))
    }

    /// Called with the echo flag
    pub fn on_play(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        self.inner.handlers.play.subscribe(move |echo| callback(*echo))
    }

    /// Called with the echo flag
    pub fn on_pause(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        self.inner.handlers.pause.subscribe(move |echo| callback(*echo))
    }

    /// Called with the reported position in seconds and the echo flag
    pub fn on_current_time(&self, callback: impl Fn(f64, bool) + 'static) -> Subscription {
        self.inner
            .handlers
            .current_time
            .subscribe(move |(seconds, echo)| callback(*seconds, *echo))
    }

    pub fn on_audio_track_selected(&self, callback: impl Fn(&str) + 'static) -> Subscription {
        self.inner
            .handlers
            .audio_track_selected
            .subscribe(move |id| callback(id))
    }

    pub fn on_exit(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.handlers.exit.subscribe(move |_| callback())
    }

    pub fn on_offset(&self, callback: impl Fn(Time) + 'static) -> Subscription {
        self.inner.handlers.offset.subscribe(move |offset| callback(*offset))
    }

    pub fn on_pop_out_toggle(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.handlers.pop_out_toggle.subscribe(move |_| callback())
    }

    pub fn on_copy(&self, callback: impl Fn(&CopyMessage) + 'static) -> Subscription {
        self.inner.handlers.copy.subscribe(callback)
    }

    pub fn on_condensed_mode_toggle(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner
            .handlers
            .condensed_mode_toggle
            .subscribe(move |_| callback())
    }

    pub fn on_hide_subtitle_player_toggle(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner
            .handlers
            .hide_subtitle_player_toggle
            .subscribe(move |_| callback())
    }

    /// Called with the `forwardToVideo` flag
    pub fn on_anki_dialog_request(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        self.inner
            .handlers
            .anki_dialog_request
            .subscribe(move |forward| callback(*forward))
    }

    pub fn on_toggle_subtitle_track_in_list(
        &self,
        callback: impl Fn(usize) + 'static,
    ) -> Subscription {
        self.inner
            .handlers
            .toggle_subtitle_track_in_list
            .subscribe(move |track| callback(*track))
    }

    fn post(&self, message: ToVideoMessage) {
        self.inner.outbox.post(&message);
    }

    /// Announce the session; `duration` is the track length in milliseconds
    pub fn ready(&self, duration: Time, video_file_name: Option<&str>) {
        self.post(ToVideoMessage::Ready(ReadyToVideoMessage {
            duration,
            video_file_name: video_file_name.map(str::to_string),
        }));
    }

    /// Ask an extension-hosted video to announce itself
    pub fn init(&self) {
        self.post(ToVideoMessage::Init);
    }

    pub fn play(&self) {
        self.post(ToVideoMessage::Play(EchoMessage { echo: true }));
    }

    pub fn pause(&self) {
        self.post(ToVideoMessage::Pause(EchoMessage { echo: true }));
    }

    pub fn audio_track_selected(&self, id: &str) {
        self.post(ToVideoMessage::AudioTrackSelected(AudioTrackSelectedMessage {
            id: id.to_string(),
            echo: true,
        }));
    }

    /// Seek the remote video. The mirrored ready state drops to
    /// [`HAVE_FUTURE_DATA`] until the video reports it can play again.
    pub fn set_current_time(&self, seconds: f64) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.current_time = seconds;
            state.ready_state = HAVE_FUTURE_DATA;
        }
        self.post(ToVideoMessage::CurrentTime(CurrentTimeMessage {
            value: seconds,
            echo: true,
        }));
    }

    /// Send the subtitle list; the first file name doubles as the display name
    pub fn subtitles(&self, subtitles: &[Subtitle], file_names: &[String]) {
        self.post(ToVideoMessage::Subtitles(SubtitlesMessage {
            value: subtitles.to_vec(),
            name: file_names.first().cloned(),
            names: file_names.to_vec(),
        }));
    }

    pub fn offset(&self, offset: Time) {
        self.post(ToVideoMessage::Offset(OffsetMessage { value: offset }));
    }

    pub fn subtitle_settings(&self, settings: &SubtitleSettings) {
        self.post(ToVideoMessage::SubtitleSettings(ValueMessage::new(settings.clone())));
    }

    pub fn anki_settings(&self, settings: &AnkiSettings) {
        self.post(ToVideoMessage::AnkiSettings(ValueMessage::new(settings.clone())));
    }

    pub fn misc_settings(&self, settings: &MiscSettings) {
        self.post(ToVideoMessage::MiscSettings(ValueMessage::new(settings.clone())));
    }

    pub fn condensed_mode_toggle(&self, enabled: bool) {
        self.post(ToVideoMessage::CondensedModeToggle(ValueMessage::new(enabled)));
    }

    pub fn hide_subtitle_player_toggle(&self, hidden: bool) {
        self.post(ToVideoMessage::HideSubtitlePlayerToggle(ValueMessage::new(hidden)));
    }

    pub fn anki_dialog_request(&self) {
        self.post(ToVideoMessage::AnkiDialogRequest);
    }

    pub fn finished_anki_dialog_request(&self, resume: bool) {
        self.post(ToVideoMessage::FinishedAnkiDialogRequest(
            FinishedAnkiDialogRequestMessage { resume },
        ));
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.post(ToVideoMessage::PlaybackRate(PlaybackRateMessage {
            value: rate,
            echo: true,
        }));
    }

    pub fn alert(&self, message: &str, severity: &str) {
        self.post(ToVideoMessage::Alert(AlertMessage {
            message: message.to_string(),
            severity: severity.to_string(),
        }));
    }

    /// Say goodbye, close the transport and drop every callback
    pub fn close(&self) {
        if !self.inner.outbox.close_with(&ToVideoMessage::Close) {
            return;
        }

        self.inner.handlers.clear();
        let pending = self.inner.can_play.borrow_mut().take();
        drop(pending);
        log::debug!("Video channel closed");
    }
}

impl MediaElement for VideoChannel {
    fn current_time(&self) -> f64 {
        self.inner.state.borrow().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        VideoChannel::set_current_time(self, seconds);
    }

    fn duration(&self) -> f64 {
        self.inner.state.borrow().duration
    }

    fn ready_state(&self) -> u8 {
        self.inner.state.borrow().ready_state
    }

    fn play(&self) {
        VideoChannel::play(self);
    }

    fn pause(&self) {
        VideoChannel::pause(self);
    }

    fn set_playback_rate(&self, rate: f64) {
        VideoChannel::set_playback_rate(self, rate);
    }

    fn has_on_can_play(&self) -> bool {
        self.inner.can_play.borrow().is_some()
    }

    fn set_on_can_play(&self, handler: Option<CanPlayHandler>) {
        if self.is_closed() && handler.is_some() {
            return;
        }
        let previous = self.inner.can_play.replace(handler);
        drop(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaAdapter;
    use crate::protocol::{BroadcastChannelProtocol, ChannelRegistry};
    use crate::testing::{commands, record, settle};
    use serde_json::json;
    use std::cell::Cell;
    use tokio::task::LocalSet;

    fn connect(registry: &ChannelRegistry) -> (VideoChannel, BroadcastChannelProtocol) {
        let player_side = BroadcastChannelProtocol::open_session(registry);
        let video_side = BroadcastChannelProtocol::open(registry, player_side.name());
        (VideoChannel::new(Box::new(player_side)), video_side)
    }

    fn ready_message(paused: bool) -> Value {
        json!({
            "command": "ready",
            "duration": 90.0,
            "currentTime": 12.5,
            "paused": paused,
            "audioTracks": [{"id": "a"}, {"id": "b"}],
            "selectedAudioTrack": "b",
            "playbackRate": 1.25
        })
    }

    #[tokio::test]
    async fn test_ready_mirrors_state_and_notifies() {
        LocalSet::new()
            .run_until(async {
                let registry = ChannelRegistry::new();
                let (channel, video) = connect(&registry);
                let seen = Rc::new(RefCell::new(Vec::new()));

                let sink = Rc::clone(&seen);
                channel.on_ready(move |paused| sink.borrow_mut().push(paused)).detach();
                assert!(seen.borrow().is_empty());

                video.post_message(ready_message(true));
                settle().await;

                let state = channel.state();
                assert!(state.is_ready);
                assert_eq!(state.ready_state, HAVE_ENOUGH_DATA);
                assert_eq!(state.duration, 90.0);
                assert_eq!(state.current_time, 12.5);
                assert_eq!(state.selected_audio_track.as_deref(), Some("b"));
                assert_eq!(state.playback_rate, 1.25);
                assert!(!state.playing);
                assert_eq!(*seen.borrow(), vec![true]);

                let late = Rc::new(Cell::new(None));
                let late_sink = Rc::clone(&late);
                channel.on_ready(move |paused| late_sink.set(Some(paused))).detach();
                assert_eq!(late.get(), Some(false));
            })
            .await;
    }

    #[tokio::test]
    async fn test_seek_waits_for_remote_ready_state() {
        LocalSet::new()
            .run_until(async {
                let registry = ChannelRegistry::new();
                let (channel, video) = connect(&registry);
                let outbound = record(&video);
                video.post_message(ready_message(false));
                settle().await;

                let adapter = MediaAdapter::new(Rc::new(channel.clone()));
                let done = Rc::new(Cell::new(false));
                let flag = Rc::clone(&done);
                let seek = adapter.seek(30.0);
                tokio::task::spawn_local(async move {
                    seek.await;
                    flag.set(true);
                });

                settle().await;
                assert_eq!(channel.state().ready_state, HAVE_FUTURE_DATA);
                assert!(!done.get());
                assert_eq!(
                    outbound.borrow().last(),
                    Some(&json!({"command": "currentTime", "value": 30.0, "echo": true}))
                );

                video.post_message(json!({"command": "readyState", "value": 4}));
                settle().await;
                assert!(done.get());
            })
            .await;
    }

    #[tokio::test]
    async fn test_inbound_echo_reaches_callbacks() {
        LocalSet::new()
            .run_until(async {
                let registry = ChannelRegistry::new();
                let (channel, video) = connect(&registry);
                let events = Rc::new(RefCell::new(Vec::new()));

                let sink = Rc::clone(&events);
                channel
                    .on_play(move |echo| sink.borrow_mut().push(format!("play {}", echo)))
                    .detach();
                let sink = Rc::clone(&events);
                channel
                    .on_current_time(move |t, echo| sink.borrow_mut().push(format!("time {} {}", t, echo)))
                    .detach();
                let sink = Rc::clone(&events);
                channel
                    .on_toggle_subtitle_track_in_list(move |track| {
                        sink.borrow_mut().push(format!("track {}", track))
                    })
                    .detach();

                video.post_message(json!({"command": "play", "echo": false}));
                video.post_message(json!({"command": "teleport"}));
                video.post_message(json!({"command": "sync"}));
                video.post_message(json!({"command": "currentTime", "value": 4.5, "echo": true}));
                video.post_message(json!({"command": "toggleSubtitleTrackInList", "track": 1}));
                settle().await;

                assert_eq!(
                    *events.borrow(),
                    vec!["play false", "time 4.5 true", "track 1"]
                );
                assert!(channel.playing());
            })
            .await;
    }

    #[tokio::test]
    async fn test_outbound_commands() {
        LocalSet::new()
            .run_until(async {
                let registry = ChannelRegistry::new();
                let (channel, video) = connect(&registry);
                let outbound = record(&video);

                channel.ready(90_000, Some("movie.mkv"));
                channel.play();
                channel.condensed_mode_toggle(true);
                channel.finished_anki_dialog_request(false);
                settle().await;

                assert_eq!(
                    commands(&outbound),
                    vec!["ready", "play", "condensedModeToggle", "finishedAnkiDialogRequest"]
                );
                assert_eq!(outbound.borrow()[0]["videoFileName"], "movie.mkv");
                assert_eq!(outbound.borrow()[1]["echo"], true);
            })
            .await;
    }

    #[tokio::test]
    async fn test_close_says_goodbye_and_goes_quiet() {
        LocalSet::new()
            .run_until(async {
                let registry = ChannelRegistry::new();
                let (channel, video) = connect(&registry);
                let outbound = record(&video);
                let plays = Rc::new(Cell::new(0));

                let counter = Rc::clone(&plays);
                channel.on_play(move |_| counter.set(counter.get() + 1)).detach();

                let adapter = MediaAdapter::new(Rc::new(channel.clone()));
                let waiting = adapter.on_ready();

                channel.close();
                channel.close();
                channel.play();
                video.post_message(json!({"command": "play", "echo": true}));
                settle().await;

                waiting.await;
                assert_eq!(commands(&outbound), vec!["close"]);
                assert_eq!(plays.get(), 0);
                assert!(channel.is_closed());
            })
            .await;
    }
}
