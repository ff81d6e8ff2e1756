//! Subtitle ingestion port.

use async_trait::async_trait;

use crate::core::time::{self, Time};
use crate::subtitle::model::RawCue;

/// Error type for subtitle loading
#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    #[error("Unsupported subtitle file extension: {0}")]
    UnsupportedExtension(String),
    #[error("Malformed subtitle file {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A subtitle file handed over by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleFile {
    pub name: String,
    pub contents: String,
}

impl SubtitleFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Lower-cased extension without the dot
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
    }
}

/// Turns subtitle files into cues sorted ascending by start
#[async_trait(?Send)]
pub trait SubtitleReader {
    async fn subtitles(&self, files: &[SubtitleFile]) -> Result<Vec<RawCue>, SubtitleError>;
}

#[derive(serde::Deserialize)]
struct JsonCue {
    #[serde(deserialize_with = "time::deserialize_millis")]
    start: Time,
    #[serde(deserialize_with = "time::deserialize_millis")]
    end: Time,
    text: String,
}

/// Reads `.json` cue lists (`[{"start": ms, "end": ms, "text": "..."}]`)
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCueReader;

impl JsonCueReader {
    pub fn new() -> Self {
        Self
    }

    fn read_file(file: &SubtitleFile, track: usize) -> Result<Vec<RawCue>, SubtitleError> {
        match file.extension().as_deref() {
            Some("json") => {}
            other => {
                return Err(SubtitleError::UnsupportedExtension(
                    other.unwrap_or_default().to_string(),
                ))
            }
        }

        let cues: Vec<JsonCue> =
            serde_json::from_str(&file.contents).map_err(|source| SubtitleError::Malformed {
                name: file.name.clone(),
                source,
            })?;

        Ok(cues
            .into_iter()
            .map(|cue| RawCue {
                start: cue.start,
                end: cue.end,
                text: cue.text,
                track,
            })
            .collect())
    }
}

#[async_trait(?Send)]
impl SubtitleReader for JsonCueReader {
    async fn subtitles(&self, files: &[SubtitleFile]) -> Result<Vec<RawCue>, SubtitleError> {
        let mut cues = Vec::new();

        for (track, file) in files.iter().enumerate() {
            let mut file_cues = Self::read_file(file, track)?;
            log::debug!("Read {} cues from {}", file_cues.len(), file.name);
            cues.append(&mut file_cues);
        }

        cues.sort_by_key(|cue| cue.start);
        Ok(cues)
    }
}
