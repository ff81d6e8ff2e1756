//! Player orchestrator.
//!
//! Owns the clock, the subtitle index and the connection to the video for one
//! loaded session. Loading a new source tears the previous session down
//! synchronously before anything of the new one is built.
//!
//! The player runs on a single thread and spawns its background work with
//! `tokio::task::spawn_local`, so it must be driven from inside a
//! [`LocalSet`](tokio::task::LocalSet).

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use crossbeam::channel;

use crate::channel::messages::{AudioTrack, CopyMessage};
use crate::channel::VideoChannel;
use crate::core::clock::{Clock, TimeSource};
use crate::core::time::{self, Time};
use crate::media::{MediaAdapter, MediaElement};
use crate::playback::auto_pause::AutoPauseContext;
use crate::playback::condensed::{CondensedConfig, CondensedScheduler, SchedulerHandle};
use crate::playback::state::{AutoPausePreference, PlayModes};
use crate::playback::sync::SyncController;
use crate::protocol::{
    session_id, BroadcastChannelProtocol, ChannelRegistry, ExtensionBus, ExtensionRelayProtocol,
    VideoProtocol, WindowBus, WindowMessageProtocol, PLAYER, VIDEO,
};
use crate::settings::{SettingsError, SettingsProvider};
use crate::subtitle::collection::{CollectionOptions, SubtitleCollection, SubtitleSlice};
use crate::subtitle::model::{self, DisplaySubtitle, Subtitle};
use crate::subtitle::reader::{SubtitleError, SubtitleFile, SubtitleReader};

/// Player tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerConfig {
    pub condensed: CondensedConfig,
    /// Window for detecting subtitles that just started or are about to end (ms)
    pub showing_check_radius: Time,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            condensed: CondensedConfig::default(),
            showing_check_radius: 100,
        }
    }
}

/// Where the video of a session lives
#[derive(Clone, Default)]
pub enum MediaSource {
    /// Subtitles only
    #[default]
    None,
    /// A media element in this context
    Local(Rc<dyn MediaElement>),
    /// A pop-out window reached over a fresh broadcast channel
    PopOut { registry: ChannelRegistry },
    /// An embedded frame reached over window messaging
    Frame { bus: WindowBus },
    /// A tab controlled through the extension relay
    ExtensionTab {
        bus: ExtensionBus,
        tab_id: u32,
        src: String,
    },
}

/// Everything a session is built from
#[derive(Clone, Default)]
pub struct Sources {
    pub subtitle_files: Vec<SubtitleFile>,
    pub media: MediaSource,
    pub video_file_name: Option<String>,
}

/// Commands sent to the player by its UI
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Seek(Time),
    ApplyOffset(Time),
    SetCondensed(bool),
    SetAutoPause(bool),
    SetPlaybackRate(f64),
    SelectAudioTrack(String),
    SetHideSubtitlePlayer(bool),
    ToggleSubtitleTrack(usize),
}

/// Notifications for the UI
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Alert { message: String, severity: String },
    SubtitlesLoaded { count: usize, file_names: Vec<String> },
    Ready { length: Time, paused: bool },
    AudioTracks {
        tracks: Vec<AudioTrack>,
        selected: Option<String>,
    },
    PlayingChanged(bool),
    Seeked(Time),
    OffsetChanged(Time),
    PlayModesChanged(PlayModes),
    HideSubtitlePlayerChanged(bool),
    SubtitleTrackToggled { track: usize, disabled: bool },
    AudioTrackSelected(String),
    PlaybackRateChanged(f64),
    Copy(CopyMessage),
    AnkiDialogRequested,
    PopOutToggled,
    Exit,
}

/// Error type for the player
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

#[derive(Default)]
struct Session {
    closed: Rc<Cell<bool>>,
    channel: Option<VideoChannel>,
    channel_id: Option<String>,
    subscribed: bool,
}

struct Inner {
    config: PlayerConfig,
    settings: SettingsProvider,
    reader: Rc<dyn SubtitleReader>,
    sync: Rc<SyncController>,
    events: channel::Sender<PlayerEvent>,
    collection: RefCell<Rc<SubtitleCollection<DisplaySubtitle>>>,
    file_names: RefCell<Vec<String>>,
    video_file_name: RefCell<Option<String>>,
    duration: Cell<Option<f64>>,
    modes: Cell<PlayModes>,
    hide_subtitle_player: Cell<bool>,
    disabled_tracks: RefCell<BTreeSet<usize>>,
    auto_pause: AutoPauseContext,
    scheduler: RefCell<Option<SchedulerHandle>>,
    session: RefCell<Session>,
    resume_after_anki: Cell<bool>,
}

/// Wrap `handler` so it only runs while the player is alive
fn bind<A>(inner: &Rc<Inner>, handler: impl Fn(&Rc<Inner>, A) + 'static) -> impl Fn(A) + 'static {
    let weak: Weak<Inner> = Rc::downgrade(inner);
    move |arg| {
        if let Some(inner) = weak.upgrade() {
            handler(&inner, arg);
        }
    }
}

impl Inner {
    fn emit(&self, event: PlayerEvent) {
        if self.events.send(event).is_err() {
            log::trace!("Player event dropped, receiver gone");
        }
    }

    fn collection_options(&self) -> CollectionOptions {
        CollectionOptions {
            return_last_shown: true,
            return_next_to_show: true,
            showing_check_radius_ms: Some(self.config.showing_check_radius),
        }
    }

    fn collection(&self) -> Rc<SubtitleCollection<DisplaySubtitle>> {
        Rc::clone(&self.collection.borrow())
    }

    fn length(&self) -> Time {
        model::track_length(self.duration.get(), self.collection().subtitles())
    }

    fn channel(&self) -> Option<VideoChannel> {
        self.session.borrow().channel.clone()
    }

    /// Publish a new subtitle list by replacing the index
    fn set_subtitles(&self, subtitles: Vec<DisplaySubtitle>) {
        let collection = SubtitleCollection::new(subtitles, self.collection_options());
        *self.collection.borrow_mut() = Rc::new(collection);
        self.refresh_scheduler();
    }

    fn refresh_scheduler(&self) {
        let handle = if self.modes.get().is_condensed() {
            let collection = self.collection();
            CondensedScheduler::for_session(
                Rc::clone(&self.sync),
                collection.subtitles(),
                self.length(),
                self.config.condensed,
                Rc::clone(&self.session.borrow().closed),
            )
            .start()
        } else {
            None
        };

        let previous = self.scheduler.replace(handle);
        drop(previous);
    }

    fn play(&self, forward_to_media: bool) {
        self.sync.play(forward_to_media);
        self.emit(PlayerEvent::PlayingChanged(true));
    }

    fn pause(&self, forward_to_media: bool) {
        self.sync.pause(forward_to_media);
        self.emit(PlayerEvent::PlayingChanged(false));
    }

    /// Seek, keeping the clock still while the media catches up
    async fn seek(self: Rc<Self>, time: Time, forward_to_media: bool, closed: Rc<Cell<bool>>) {
        let clock = Rc::clone(self.sync.clock());
        let playing = clock.running();
        if playing {
            clock.stop();
        }

        self.sync.seek(time, forward_to_media).await;

        if closed.get() {
            return;
        }
        if playing {
            clock.start();
        }
        self.emit(PlayerEvent::Seeked(time));
    }

    fn apply_offset(&self, offset: Time, forward_to_video: bool) -> Result<(), SettingsError> {
        let subtitles = model::apply_offset(self.collection().subtitles(), offset);
        self.set_subtitles(subtitles);

        if forward_to_video {
            if let Some(channel) = self.channel() {
                channel.offset(offset);
            }
        }

        self.emit(PlayerEvent::OffsetChanged(offset));
        self.settings.set_offset(offset)
    }

    fn update_modes(&self, update: impl FnOnce(&mut PlayModes)) {
        let mut modes = self.modes.get();
        update(&mut modes);
        self.modes.set(modes);

        if let Some(channel) = self.channel() {
            channel.condensed_mode_toggle(modes.is_condensed());
        }

        self.refresh_scheduler();
        self.emit(PlayerEvent::PlayModesChanged(modes));
    }

    fn set_hide_subtitle_player(&self, hidden: bool) {
        self.hide_subtitle_player.set(hidden);
        if let Some(channel) = self.channel() {
            channel.hide_subtitle_player_toggle(hidden);
        }
        self.emit(PlayerEvent::HideSubtitlePlayerChanged(hidden));
    }

    fn toggle_subtitle_track(&self, track: usize) {
        let disabled = {
            let mut tracks = self.disabled_tracks.borrow_mut();
            if !tracks.remove(&track) {
                tracks.insert(track);
            }
            tracks.contains(&track)
        };
        self.emit(PlayerEvent::SubtitleTrackToggled { track, disabled });
    }

    fn auto_pause_at(&self, edge: AutoPausePreference) {
        if self.settings.auto_pause_preference() == edge {
            log::debug!("Auto-pausing at {:?}", edge);
            self.pause(true);
        }
    }

    fn begin_anki_dialog(&self) {
        let playing = self.sync.clock().running();
        if playing {
            self.pause(true);
        }
        self.resume_after_anki.set(playing);
        self.emit(PlayerEvent::AnkiDialogRequested);
    }

    fn finish_anki_dialog(&self, resume: bool) {
        if let Some(channel) = self.channel() {
            channel.finished_anki_dialog_request(resume);
        }

        if self.resume_after_anki.replace(false) && resume {
            self.play(true);
        }
    }

    fn push_settings(&self, channel: &VideoChannel) {
        if !self.collection().is_empty() {
            channel.subtitle_settings(&self.settings.subtitle_settings());
        }
        channel.anki_settings(&self.settings.anki_settings());
        channel.misc_settings(&self.settings.misc_settings());
    }

    fn handle_ready(self: &Rc<Self>, paused: bool) {
        let Some(channel) = self.channel() else {
            return;
        };

        let state = channel.state();
        self.duration.set(Some(state.duration));
        let length = self.length();

        channel.ready(length, self.video_file_name.borrow().as_deref());

        let collection = self.collection();
        if !collection.is_empty() {
            let subtitles: Vec<Subtitle> = collection
                .subtitles()
                .iter()
                .map(|s| s.subtitle.clone())
                .collect();
            channel.subtitle_settings(&self.settings.subtitle_settings());
            channel.subtitles(&subtitles, &self.file_names.borrow());
        }
        channel.anki_settings(&self.settings.anki_settings());
        channel.misc_settings(&self.settings.misc_settings());
        channel.condensed_mode_toggle(self.modes.get().is_condensed());
        channel.hide_subtitle_player_toggle(self.hide_subtitle_player.get());

        if let Some(tracks) = state.audio_tracks.filter(|tracks| tracks.len() > 1) {
            self.emit(PlayerEvent::AudioTracks {
                tracks,
                selected: state.selected_audio_track,
            });
        }

        self.sync.clock().set_time(state.current_time * 1_000.0);
        if paused {
            self.sync.pause(false);
        } else {
            self.sync.play(false);
        }
        self.sync.set_playback_rate(state.playback_rate, false);

        self.refresh_scheduler();
        self.emit(PlayerEvent::Ready { length, paused });

        let first = {
            let mut session = self.session.borrow_mut();
            !std::mem::replace(&mut session.subscribed, true)
        };
        if first {
            self.subscribe(&channel);
        }
    }

    /// Inbound handlers, registered once per channel
    fn subscribe(self: &Rc<Self>, channel: &VideoChannel) {
        let closed = Rc::clone(&self.session.borrow().closed);

        channel
            .on_play(bind(self, |inner, echo: bool| inner.play(echo)))
            .detach();
        channel
            .on_pause(bind(self, |inner, echo: bool| inner.pause(echo)))
            .detach();

        let offset = bind(self, |inner, offset: Time| {
            let offset = offset.max(-inner.length());
            if let Err(e) = inner.apply_offset(offset, false) {
                log::warn!("Failed to remember offset: {}", e);
            }
        });
        channel.on_offset(offset).detach();

        let seek_closed = Rc::clone(&closed);
        let seek = bind(self, move |inner, (seconds, echo): (f64, bool)| {
            let task = Rc::clone(inner).seek(time::from_seconds(seconds), echo, Rc::clone(&seek_closed));
            tokio::task::spawn_local(task);
        });
        channel
            .on_current_time(move |seconds, echo| seek((seconds, echo)))
            .detach();

        let track_closed = closed;
        let track = bind(self, move |inner, id: String| {
            let inner = Rc::clone(inner);
            let closed = Rc::clone(&track_closed);
            tokio::task::spawn_local(async move {
                let clock = Rc::clone(inner.sync.clock());
                let playing = clock.running();
                if playing {
                    clock.stop();
                }

                inner.sync.media().on_ready().await;

                if closed.get() {
                    return;
                }
                if playing {
                    clock.start();
                }
                inner.emit(PlayerEvent::AudioTrackSelected(id));
            });
        });
        channel
            .on_audio_track_selected(move |id| track(id.to_string()))
            .detach();

        let copy = bind(self, |inner, copy: CopyMessage| inner.emit(PlayerEvent::Copy(copy)));
        channel.on_copy(move |message| copy(message.clone())).detach();

        let condensed = bind(self, |inner, ()| {
            let enabled = !inner.modes.get().is_condensed();
            inner.update_modes(|modes| modes.set_condensed(enabled));
        });
        channel.on_condensed_mode_toggle(move || condensed(())).detach();

        let hide = bind(self, |inner, ()| {
            inner.set_hide_subtitle_player(!inner.hide_subtitle_player.get())
        });
        channel.on_hide_subtitle_player_toggle(move || hide(())).detach();

        let anki = bind(self, |inner, _forward: bool| inner.begin_anki_dialog());
        channel.on_anki_dialog_request(anki).detach();

        channel
            .on_toggle_subtitle_track_in_list(bind(self, |inner, track: usize| {
                inner.toggle_subtitle_track(track)
            }))
            .detach();

        let exit = bind(self, |inner, ()| inner.emit(PlayerEvent::Exit));
        channel.on_exit(move || exit(())).detach();

        let pop_out = bind(self, |inner, ()| inner.emit(PlayerEvent::PopOutToggled));
        channel.on_pop_out_toggle(move || pop_out(())).detach();
    }

    fn open_channel(self: &Rc<Self>, media: MediaSource) {
        let (protocol, channel_id, needs_init): (Box<dyn VideoProtocol>, Option<String>, bool) =
            match media {
                MediaSource::None => return,
                MediaSource::Local(element) => {
                    let duration = element.duration();
                    self.duration.set(duration.is_finite().then_some(duration));
                    self.sync.set_media(MediaAdapter::new(element));
                    return;
                }
                MediaSource::PopOut { registry } => {
                    let protocol = BroadcastChannelProtocol::open_session(&registry);
                    let name = protocol.name().to_string();
                    (Box::new(protocol), Some(name), false)
                }
                MediaSource::Frame { bus } => {
                    let frame_id = session_id();
                    let protocol = WindowMessageProtocol::open(&bus, PLAYER, VIDEO, &frame_id);
                    (Box::new(protocol), Some(frame_id), false)
                }
                MediaSource::ExtensionTab { bus, tab_id, src } => {
                    let protocol = ExtensionRelayProtocol::open(&bus, PLAYER, VIDEO, tab_id, &src);
                    (Box::new(protocol), None, true)
                }
            };

        let channel = VideoChannel::new(protocol);
        self.sync.set_media(MediaAdapter::new(Rc::new(channel.clone())));
        {
            let mut session = self.session.borrow_mut();
            session.channel = Some(channel.clone());
            session.channel_id = channel_id;
        }

        channel
            .on_ready(bind(self, |inner, paused: bool| inner.handle_ready(paused)))
            .detach();

        if needs_init {
            channel.init();
        }
    }

    fn current_subtitles(&self) -> SubtitleSlice<DisplaySubtitle> {
        let time = self.sync.clock().time(self.length() as f64) as Time;
        let mut slice = self.collection().subtitles_at(time);

        {
            let disabled = self.disabled_tracks.borrow();
            if !disabled.is_empty() {
                slice.showing.retain(|s| !disabled.contains(&s.subtitle.track));
            }
        }

        if self.modes.get().is_auto_pause() {
            if let Some(subtitle) = &slice.started_showing {
                self.auto_pause.started_showing(subtitle);
            }
            if let Some(subtitle) = &slice.will_stop_showing {
                self.auto_pause.will_stop_showing(subtitle);
            }
        }

        slice
    }

    fn unload(&self) {
        let session = std::mem::take(&mut *self.session.borrow_mut());
        session.closed.set(true);

        let scheduler = self.scheduler.borrow_mut().take();
        drop(scheduler);

        if let Some(channel) = session.channel {
            channel.close();
        }

        self.sync.reset();
        self.auto_pause.clear();
        *self.collection.borrow_mut() = Rc::new(SubtitleCollection::empty());
        self.file_names.borrow_mut().clear();
        self.video_file_name.borrow_mut().take();
        self.duration.set(None);
        self.disabled_tracks.borrow_mut().clear();
        self.resume_after_anki.set(false);
    }
}

/// Subtitle player session manager
pub struct Player {
    inner: Rc<Inner>,
}

impl Player {
    /// Create a player and the receiving end of its event stream
    pub fn new(
        config: PlayerConfig,
        settings: SettingsProvider,
        reader: Rc<dyn SubtitleReader>,
        clock_source: Rc<dyn TimeSource>,
    ) -> (Self, channel::Receiver<PlayerEvent>) {
        let (events, receiver) = channel::unbounded();
        let clock = Rc::new(Clock::new(clock_source));

        let inner = Rc::new(Inner {
            config,
            settings,
            reader,
            sync: Rc::new(SyncController::new(clock)),
            events,
            collection: RefCell::new(Rc::new(SubtitleCollection::empty())),
            file_names: RefCell::new(Vec::new()),
            video_file_name: RefCell::new(None),
            duration: Cell::new(None),
            modes: Cell::new(PlayModes::new()),
            hide_subtitle_player: Cell::new(false),
            disabled_tracks: RefCell::new(BTreeSet::new()),
            auto_pause: AutoPauseContext::new(),
            scheduler: RefCell::new(None),
            session: RefCell::new(Session::default()),
            resume_after_anki: Cell::new(false),
        });

        inner
            .sync
            .on_seeked(bind(&inner, |inner, _time: Time| inner.auto_pause.clear()))
            .detach();
        let weak = Rc::downgrade(&inner);
        inner
            .auto_pause
            .on_started_showing(move |_subtitle| {
                if let Some(inner) = weak.upgrade() {
                    inner.auto_pause_at(AutoPausePreference::AtStart);
                }
            })
            .detach();
        let weak = Rc::downgrade(&inner);
        inner
            .auto_pause
            .on_will_stop_showing(move |_subtitle| {
                if let Some(inner) = weak.upgrade() {
                    inner.auto_pause_at(AutoPausePreference::AtEnd);
                }
            })
            .detach();

        (Self { inner }, receiver)
    }

    pub fn clock(&self) -> Rc<Clock> {
        Rc::clone(self.inner.sync.clock())
    }

    pub fn playing(&self) -> bool {
        self.inner.sync.playing()
    }

    /// Track length in milliseconds: the longer of the media and the subtitles
    pub fn length(&self) -> Time {
        self.inner.length()
    }

    pub fn offset(&self) -> Time {
        model::current_offset(self.inner.collection().subtitles())
    }

    pub fn subtitles(&self) -> Vec<DisplaySubtitle> {
        self.inner.collection().subtitles().to_vec()
    }

    pub fn subtitle_file_names(&self) -> Vec<String> {
        self.inner.file_names.borrow().clone()
    }

    pub fn modes(&self) -> PlayModes {
        self.inner.modes.get()
    }

    pub fn hide_subtitle_player(&self) -> bool {
        self.inner.hide_subtitle_player.get()
    }

    pub fn disabled_tracks(&self) -> Vec<usize> {
        self.inner.disabled_tracks.borrow().iter().copied().collect()
    }

    /// Channel to the video of the current session, if it lives elsewhere
    pub fn channel(&self) -> Option<VideoChannel> {
        self.inner.channel()
    }

    /// Broadcast channel name or frame id the video side must connect with
    pub fn channel_id(&self) -> Option<String> {
        self.inner.session.borrow().channel_id.clone()
    }

    /// Replace the current session with one built from `sources`.
    ///
    /// If [`unload`](Self::unload) or another `load` runs while subtitles are
    /// being read, this load finishes without building anything.
    pub async fn load(&self, sources: Sources) -> Result<(), PlayerError> {
        self.unload();

        let closed = Rc::new(Cell::new(false));
        self.inner.session.borrow_mut().closed = Rc::clone(&closed);

        if !sources.subtitle_files.is_empty() {
            let offset = self.inner.settings.offset();
            let cues = match self.inner.reader.subtitles(&sources.subtitle_files).await {
                Ok(cues) => cues,
                Err(e) => {
                    log::error!("Failed to load subtitles: {}", e);
                    if !closed.get() {
                        self.inner.emit(PlayerEvent::Alert {
                            message: e.to_string(),
                            severity: "error".to_string(),
                        });
                    }
                    return Err(e.into());
                }
            };

            if closed.get() {
                log::debug!("Session closed while reading subtitles");
                return Ok(());
            }

            let file_names: Vec<String> = sources
                .subtitle_files
                .iter()
                .map(|file| file.name.clone())
                .collect();
            let subtitles = model::from_cues(cues, offset);
            log::info!("Loaded {} subtitles from {} files", subtitles.len(), file_names.len());

            self.inner.emit(PlayerEvent::SubtitlesLoaded {
                count: subtitles.len(),
                file_names: file_names.clone(),
            });
            *self.inner.file_names.borrow_mut() = file_names;
            self.inner.set_subtitles(subtitles);
            if offset != 0 {
                self.inner.emit(PlayerEvent::OffsetChanged(offset));
            }
        }

        if closed.get() {
            return Ok(());
        }

        *self.inner.video_file_name.borrow_mut() = sources.video_file_name;
        self.inner.open_channel(sources.media);
        self.inner.refresh_scheduler();
        Ok(())
    }

    /// Tear the current session down
    pub fn unload(&self) {
        self.inner.unload();
    }

    pub fn process_command(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        match command {
            PlayerCommand::Play => self.inner.play(true),
            PlayerCommand::Pause => self.inner.pause(true),
            PlayerCommand::Seek(time) => {
                let closed = Rc::clone(&self.inner.session.borrow().closed);
                tokio::task::spawn_local(Rc::clone(&self.inner).seek(time, true, closed));
            }
            PlayerCommand::ApplyOffset(offset) => self.inner.apply_offset(offset, true)?,
            PlayerCommand::SetCondensed(enabled) => {
                self.inner.update_modes(|modes| modes.set_condensed(enabled))
            }
            PlayerCommand::SetAutoPause(enabled) => {
                self.inner.update_modes(|modes| modes.set_auto_pause(enabled))
            }
            PlayerCommand::SetPlaybackRate(rate) => {
                self.inner.sync.set_playback_rate(rate, true);
                self.inner.emit(PlayerEvent::PlaybackRateChanged(rate));
            }
            PlayerCommand::SelectAudioTrack(id) => {
                if let Some(channel) = self.inner.channel() {
                    channel.audio_track_selected(&id);
                }
            }
            PlayerCommand::SetHideSubtitlePlayer(hidden) => {
                self.inner.set_hide_subtitle_player(hidden)
            }
            PlayerCommand::ToggleSubtitleTrack(track) => self.inner.toggle_subtitle_track(track),
        }

        Ok(())
    }

    /// Seek to `time` (ms) and wait until the media can play
    pub async fn seek(&self, time: Time) {
        let closed = Rc::clone(&self.inner.session.borrow().closed);
        Rc::clone(&self.inner).seek(time, true, closed).await;
    }

    /// Subtitles at the clock's current time; feeds auto-pause when enabled
    pub fn current_subtitles(&self) -> SubtitleSlice<DisplaySubtitle> {
        self.inner.current_subtitles()
    }

    /// Push the current settings to the video again
    pub fn refresh_settings(&self) {
        if let Some(channel) = self.inner.channel() {
            self.inner.push_settings(&channel);
        }
    }

    /// The card dialog opened on the player side
    pub fn begin_anki_dialog(&self) {
        self.inner.begin_anki_dialog();
    }

    /// The card dialog closed; resume if it paused playback and `resume` is set
    pub fn finish_anki_dialog(&self, resume: bool) {
        self.inner.finish_anki_dialog(resume);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.inner.unload();
    }
}
