pub mod collection;
pub mod model;
pub mod reader;

pub use collection::{CollectionOptions, SubtitleCollection, SubtitleSlice};
pub use model::{DisplaySubtitle, RawCue, Subtitle, Timed};
pub use reader::{JsonCueReader, SubtitleError, SubtitleFile, SubtitleReader};
