pub mod auto_pause;
pub mod condensed;
pub mod engine;
pub mod state;
pub mod sync;

pub use auto_pause::AutoPauseContext;
pub use condensed::{CondensedConfig, CondensedScheduler, SchedulerHandle};
pub use engine::{
    MediaSource, Player, PlayerCommand, PlayerConfig, PlayerError, PlayerEvent, Sources,
};
pub use state::{AutoPausePreference, PlayModes};
pub use sync::SyncController;
