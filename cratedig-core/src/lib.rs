pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod library;
pub mod model;
pub mod navigation;
pub mod paths;
pub mod playback;
pub mod protocol;
pub mod scene;
pub mod scroll;
pub mod sync;
pub mod time;

pub use camera::{CameraPose, CameraRig};
pub use config::{
    BrowsePose, CameraConfig, CratedigConfig, LibraryConfig, LoggingConfig, OrbitConfig,
    OrbitProfile, PlayerConfig, ScrollConfig, ServerConfig, UiConfig, ViewPose,
};
pub use error::CoreError;
pub use geometry::Spherical;
pub use glam::DVec3;
pub use library::{
    AlbumLocation, Crate, CrateItem, GroupingMode, LibrarySettings, LibraryView, SortMode,
};
pub use model::{parse_catalog, Album, Catalog, Disc, Track};
pub use navigation::{Navigator, SessionContext, ViewState};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME};
pub use playback::{Advance, LoadedDisc, NowPlaying, PlaybackPhase, PlaybackSession};
pub use protocol::{ClientMessage, MessageSink, NavSnapshot, PlaybackSync, ServerMessage};
pub use scene::{Affordances, Chrome, Pick, SceneBus, SceneEvent};
pub use scroll::ScrollEngine;
pub use sync::PendingSnapshot;
pub use time::format_clock;
