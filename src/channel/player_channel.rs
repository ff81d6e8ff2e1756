//! The video surface's end of the connection to the subtitle player.

use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::channel::messages::{
    decode, AlertMessage, AnkiDialogRequestMessage, AudioTrackSelectedMessage, CopyMessage,
    CurrentTimeMessage, EchoMessage, Echoed, FromVideoMessage, Inbound, OffsetMessage,
    PlaybackRateMessage, ReadyFromVideoMessage, ReadyToVideoMessage, SubtitlesMessage,
    ToVideoMessage, ToggleSubtitleTrackMessage, ValueMessage,
};
use crate::channel::Outbox;
use crate::core::events::{Callbacks, Subscription};
use crate::core::time::Time;
use crate::protocol::VideoProtocol;
use crate::settings::{AnkiSettings, MiscSettings, SubtitleSettings};

#[derive(Default)]
struct Handlers {
    ready: Callbacks<ReadyToVideoMessage>,
    play: Callbacks<bool>,
    pause: Callbacks<bool>,
    current_time: Callbacks<(f64, bool)>,
    audio_track_selected: Callbacks<String>,
    close: Callbacks<()>,
    subtitles: Callbacks<SubtitlesMessage>,
    offset: Callbacks<Time>,
    condensed_mode_toggle: Callbacks<bool>,
    hide_subtitle_player_toggle: Callbacks<bool>,
    subtitle_settings: Callbacks<SubtitleSettings>,
    anki_settings: Callbacks<AnkiSettings>,
    misc_settings: Callbacks<MiscSettings>,
    anki_dialog_request: Callbacks<()>,
    finished_anki_dialog_request: Callbacks<bool>,
    playback_rate: Callbacks<f64>,
    alert: Callbacks<AlertMessage>,
}

impl Handlers {
    fn clear(&self) {
        self.ready.clear();
        self.play.clear();
        self.pause.clear();
        self.current_time.clear();
        self.audio_track_selected.clear();
        self.close.clear();
        self.subtitles.clear();
        self.offset.clear();
        self.condensed_mode_toggle.clear();
        self.hide_subtitle_player_toggle.clear();
        self.subtitle_settings.clear();
        self.anki_settings.clear();
        self.misc_settings.clear();
        self.anki_dialog_request.clear();
        self.finished_anki_dialog_request.clear();
        self.playback_rate.clear();
        self.alert.clear();
    }

    fn dispatch(&self, value: Value) {
        let message = match decode::<ToVideoMessage>(value) {
            Inbound::Known(message) => message,
            Inbound::Unknown(command) => {
                log::error!("Unrecognized event {}", command);
                return;
            }
            Inbound::Malformed(reason) => {
                log::warn!("Malformed message from player: {}", reason);
                return;
            }
        };

        match message {
            ToVideoMessage::Init => {}
            ToVideoMessage::Ready(ready) => self.ready.emit(&ready),
            ToVideoMessage::Play(play) => self.play.emit(&play.echo()),
            ToVideoMessage::Pause(pause) => self.pause.emit(&pause.echo()),
            ToVideoMessage::AudioTrackSelected(selected) => {
                self.audio_track_selected.emit(&selected.id)
            }
            ToVideoMessage::CurrentTime(current_time) => self
                .current_time
                .emit(&(current_time.value, current_time.echo())),
            ToVideoMessage::Subtitles(subtitles) => self.subtitles.emit(&subtitles),
            ToVideoMessage::Offset(offset) => self.offset.emit(&offset.value),
            ToVideoMessage::SubtitleSettings(settings) => self.subtitle_settings.emit(&settings.value),
            ToVideoMessage::AnkiSettings(settings) => self.anki_settings.emit(&settings.value),
            ToVideoMessage::MiscSettings(settings) => self.misc_settings.emit(&settings.value),
            ToVideoMessage::CondensedModeToggle(toggle) => {
                self.condensed_mode_toggle.emit(&toggle.value)
            }
            ToVideoMessage::HideSubtitlePlayerToggle(toggle) => {
                self.hide_subtitle_player_toggle.emit(&toggle.value)
            }
            ToVideoMessage::AnkiDialogRequest => self.anki_dialog_request.emit(&()),
            ToVideoMessage::FinishedAnkiDialogRequest(finished) => {
                self.finished_anki_dialog_request.emit(&finished.resume)
            }
            ToVideoMessage::PlaybackRate(rate) => self.playback_rate.emit(&rate.value),
            ToVideoMessage::Alert(alert) => self.alert.emit(&alert),
            ToVideoMessage::Close => self.close.emit(&()),
        }
    }
}

struct Inner {
    outbox: Outbox,
    handlers: Handlers,
}

/// Video-side channel; the mirror image of [`VideoChannel`](super::VideoChannel)
#[derive(Clone)]
pub struct PlayerChannel {
    inner: Rc<Inner>,
}

impl PlayerChannel {
    pub fn new(protocol: Box<dyn VideoProtocol>) -> Self {
        let inner = Rc::new(Inner {
            outbox: Outbox::new(protocol),
            handlers: Handlers::default(),
        });

        let weak: Weak<Inner> = Rc::downgrade(&inner);
        inner
            .outbox
            .protocol()
            .set_on_message(Some(Box::new(move |value| {
                if let Some(inner) = weak.upgrade() {
                    inner.handlers.dispatch(value);
                }
            })));

        Self { inner }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.outbox.is_closed()
    }

    pub fn on_ready(&self, callback: impl Fn(&ReadyToVideoMessage) + 'static) -> Subscription {
        self.inner.handlers.ready.subscribe(callback)
    }

    pub fn on_play(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        self.inner.handlers.play.subscribe(move |echo| callback(*echo))
    }

    pub fn on_pause(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        self.inner.handlers.pause.subscribe(move |echo| callback(*echo))
    }

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

    pub fn on_close(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.handlers.close.subscribe(move |_| callback())
    }

    pub fn on_subtitles(&self, callback: impl Fn(&SubtitlesMessage) + 'static) -> Subscription {
        self.inner.handlers.subtitles.subscribe(callback)
    }

    pub fn on_offset(&self, callback: impl Fn(Time) + 'static) -> Subscription {
        self.inner.handlers.offset.subscribe(move |offset| callback(*offset))
    }

    pub fn on_condensed_mode_toggle(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        self.inner
            .handlers
            .condensed_mode_toggle
            .subscribe(move |enabled| callback(*enabled))
    }

    pub fn on_hide_subtitle_player_toggle(
        &self,
        callback: impl Fn(bool) + 'static,
    ) -> Subscription {
        self.inner
            .handlers
            .hide_subtitle_player_toggle
            .subscribe(move |hidden| callback(*hidden))
    }

    pub fn on_subtitle_settings(
        &self,
        callback: impl Fn(&SubtitleSettings) + 'static,
    ) -> Subscription {
        self.inner.handlers.subtitle_settings.subscribe(callback)
    }

    pub fn on_anki_settings(&self, callback: impl Fn(&AnkiSettings) + 'static) -> Subscription {
        self.inner.handlers.anki_settings.subscribe(callback)
    }

    pub fn on_misc_settings(&self, callback: impl Fn(&MiscSettings) + 'static) -> Subscription {
        self.inner.handlers.misc_settings.subscribe(callback)
    }

    pub fn on_anki_dialog_request(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner
            .handlers
            .anki_dialog_request
            .subscribe(move |_| callback())
    }

    /// Called with the resume flag
    pub fn on_finished_anki_dialog_request(
        &self,
        callback: impl Fn(bool) + 'static,
    ) -> Subscription {
        self.inner
            .handlers
            .finished_anki_dialog_request
            .subscribe(move |resume| callback(*resume))
    }

    pub fn on_playback_rate(&self, callback: impl Fn(f64) + 'static) -> Subscription {
        self.inner
            .handlers
            .playback_rate
            .subscribe(move |rate| callback(*rate))
    }

    pub fn on_alert(&self, callback: impl Fn(&AlertMessage) + 'static) -> Subscription {
        self.inner.handlers.alert.subscribe(callback)
    }

    fn post(&self, message: FromVideoMessage) {
        self.inner.outbox.post(&message);
    }

    pub fn ready(&self, ready: ReadyFromVideoMessage) {
        self.post(FromVideoMessage::Ready(ready));
    }

    pub fn ready_state(&self, ready_state: u8) {
        self.post(FromVideoMessage::ReadyState(ValueMessage::new(ready_state)));
    }

    /// `echo` is false when reporting a change the video already applied
    pub fn play(&self, echo: bool) {
        self.post(FromVideoMessage::Play(EchoMessage { echo }));
    }

    pub fn pause(&self, echo: bool) {
        self.post(FromVideoMessage::Pause(EchoMessage { echo }));
    }

    /// Report or request a position, in seconds
    pub fn current_time(&self, seconds: f64, echo: bool) {
        self.post(FromVideoMessage::CurrentTime(CurrentTimeMessage {
            value: seconds,
            echo,
        }));
    }

    pub fn audio_track_selected(&self, id: &str) {
        self.post(FromVideoMessage::AudioTrackSelected(AudioTrackSelectedMessage {
            id: id.to_string(),
            echo: false,
        }));
    }

    pub fn offset(&self, offset: Time) {
        self.post(FromVideoMessage::Offset(OffsetMessage { value: offset }));
    }

    pub fn pop_out_toggle(&self) {
        self.post(FromVideoMessage::PopOutToggle);
    }

    pub fn copy(&self, copy: CopyMessage) {
        self.post(FromVideoMessage::Copy(copy));
    }

    pub fn condensed_mode_toggle(&self) {
        self.post(FromVideoMessage::CondensedModeToggle);
    }

    pub fn hide_subtitle_player_toggle(&self) {
        self.post(FromVideoMessage::HideSubtitlePlayerToggle);
    }

    pub fn anki_dialog_request(&self, forward_to_video: bool) {
        self.post(FromVideoMessage::AnkiDialogRequest(AnkiDialogRequestMessage {
            forward_to_video,
        }));
    }

    pub fn toggle_subtitle_track_in_list(&self, track: usize) {
        self.post(FromVideoMessage::ToggleSubtitleTrackInList(
            ToggleSubtitleTrackMessage { track },
        ));
    }

    pub fn playback_rate(&self, rate: f64, echo: bool) {
        self.post(FromVideoMessage::PlaybackRate(PlaybackRateMessage { value: rate, echo }));
    }

    /// Tell the player the video is going away, then close
    pub fn close(&self) {
        if self.inner.outbox.close_with(&FromVideoMessage::Exit) {
            self.inner.handlers.clear();
        }
    }
}
