//! User settings, read through an injected storage port.
//!
//! Each settings group is stored as one JSON document. Missing or unreadable
//! documents, and missing fields within them, fall back to defaults.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::time::Time;
use crate::playback::state::AutoPausePreference;

const SUBTITLE_SETTINGS_KEY: &str = "subtitleSettings";
const ANKI_SETTINGS_KEY: &str = "ankiSettings";
const MISC_SETTINGS_KEY: &str = "miscSettings";
const OFFSET_KEY: &str = "offset";

/// Error type for settings persistence
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Subtitle appearance on the video surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubtitleSettings {
    pub subtitle_size: u32,
    pub subtitle_color: String,
    pub subtitle_outline_thickness: f64,
    pub subtitle_outline_color: String,
    pub subtitle_background_color: String,
    pub subtitle_background_opacity: f64,
    pub subtitle_font_family: String,
    pub image_based_subtitle_scale_factor: f64,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            subtitle_size: 36,
            subtitle_color: "#ffffff".to_string(),
            subtitle_outline_thickness: 0.0,
            subtitle_outline_color: "#000000".to_string(),
            subtitle_background_color: "#000000".to_string(),
            subtitle_background_opacity: 0.5,
            subtitle_font_family: String::new(),
            image_based_subtitle_scale_factor: 1.0,
        }
    }
}

/// Card export settings, forwarded untouched to the video surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnkiSettings {
    pub anki_connect_url: String,
    pub deck: String,
    pub note_type: String,
    pub sentence_field: String,
    pub definition_field: String,
    pub audio_field: String,
    pub image_field: String,
    pub word_field: String,
    pub source_field: String,
    pub url_field: String,
    pub custom_anki_fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub prefer_mp3: bool,
    pub audio_padding_start: Time,
    pub audio_padding_end: Time,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub surrounding_subtitles_count_radius: u32,
    pub surrounding_subtitles_time_radius: Time,
}

impl Default for AnkiSettings {
    fn default() -> Self {
        Self {
            anki_connect_url: "http://127.0.0.1:8765".to_string(),
            deck: String::new(),
            note_type: String::new(),
            sentence_field: String::new(),
            definition_field: String::new(),
            audio_field: String::new(),
            image_field: String::new(),
            word_field: String::new(),
            source_field: String::new(),
            url_field: String::new(),
            custom_anki_fields: BTreeMap::new(),
            tags: Vec::new(),
            prefer_mp3: true,
            audio_padding_start: 0,
            audio_padding_end: 500,
            max_image_width: 0,
            max_image_height: 0,
            surrounding_subtitles_count_radius: 2,
            surrounding_subtitles_time_radius: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MiscSettings {
    pub theme_type: String,
    pub copy_to_clipboard_on_mine: bool,
    pub auto_pause_preference: AutoPausePreference,
    pub remember_subtitle_offset: bool,
    pub auto_copy_current_subtitle: bool,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            theme_type: "dark".to_string(),
            copy_to_clipboard_on_mine: false,
            auto_pause_preference: AutoPausePreference::AtEnd,
            remember_subtitle_offset: true,
            auto_copy_current_subtitle: false,
        }
    }
}

/// Key-value storage backing the settings
pub trait StoragePort {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

/// Volatile storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }
}

/// Grouped settings snapshots over a storage port
#[derive(Clone)]
pub struct SettingsProvider {
    storage: Rc<dyn StoragePort>,
}

impl SettingsProvider {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    /// Provider over fresh in-memory storage
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStorage::new()))
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.storage.get(key) else {
            return T::default();
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Ignoring unreadable {} in storage: {}", key, e);
                T::default()
            }
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        let raw = serde_json::to_string(value)?;
        self.storage.set(key, raw);
        Ok(())
    }

    pub fn subtitle_settings(&self) -> SubtitleSettings {
        self.load(SUBTITLE_SETTINGS_KEY)
    }

    pub fn set_subtitle_settings(&self, settings: &SubtitleSettings) -> Result<(), SettingsError> {
        self.store(SUBTITLE_SETTINGS_KEY, settings)
    }

    pub fn anki_settings(&self) -> AnkiSettings {
        self.load(ANKI_SETTINGS_KEY)
    }

    pub fn set_anki_settings(&self, settings: &AnkiSettings) -> Result<(), SettingsError> {
        self.store(ANKI_SETTINGS_KEY, settings)
    }

    pub fn misc_settings(&self) -> MiscSettings {
        self.load(MISC_SETTINGS_KEY)
    }

    pub fn set_misc_settings(&self, settings: &MiscSettings) -> Result<(), SettingsError> {
        self.store(MISC_SETTINGS_KEY, settings)
    }

    pub fn auto_pause_preference(&self) -> AutoPausePreference {
        self.misc_settings().auto_pause_preference
    }

    /// Subtitle offset remembered from the previous session
    pub fn offset(&self) -> Time {
        if !self.misc_settings().remember_subtitle_offset {
            return 0;
        }
        self.load(OFFSET_KEY)
    }

    pub fn set_offset(&self, offset: Time) -> Result<(), SettingsError> {
        self.store(OFFSET_KEY, &offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_storage_empty() {
        let settings = SettingsProvider::in_memory();

        assert_eq!(settings.subtitle_settings().subtitle_size, 36);
        assert_eq!(settings.anki_settings().anki_connect_url, "http://127.0.0.1:8765");
        assert_eq!(settings.anki_settings().audio_padding_end, 500);
        assert_eq!(settings.auto_pause_preference(), AutoPausePreference::AtEnd);
        assert_eq!(settings.offset(), 0);
    }

    #[test]
    fn test_round_trip_through_storage() {
        let storage = Rc::new(MemoryStorage::new());
        let settings = SettingsProvider::new(storage.clone());

        let mut subtitle = settings.subtitle_settings();
        subtitle.subtitle_color = "#ff0000".to_string();
        settings.set_subtitle_settings(&subtitle).unwrap();

        let reopened = SettingsProvider::new(storage);
        assert_eq!(reopened.subtitle_settings().subtitle_color, "#ff0000");
    }

    #[test]
    fn test_partial_and_malformed_documents() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set(SUBTITLE_SETTINGS_KEY, r#"{"subtitleSize": 48}"#.to_string());
        storage.set(ANKI_SETTINGS_KEY, "{broken".to_string());
        let settings = SettingsProvider::new(storage);

        let subtitle = settings.subtitle_settings();
        assert_eq!(subtitle.subtitle_size, 48);
        assert_eq!(subtitle.subtitle_background_opacity, 0.5);
        assert_eq!(settings.anki_settings(), AnkiSettings::default());
    }

    #[test]
    fn test_offset_respects_remember_flag() {
        let settings = SettingsProvider::in_memory();
        settings.set_offset(-1_250).unwrap();
        assert_eq!(settings.offset(), -1_250);

        let misc = MiscSettings {
            remember_subtitle_offset: false,
            ..MiscSettings::default()
        };
        settings.set_misc_settings(&misc).unwrap();
        assert_eq!(settings.offset(), 0);
    }
}
