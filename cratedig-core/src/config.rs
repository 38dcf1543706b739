use crate::error::{CoreError, Result};
use const_format::concatcp;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Host the bundled media server listens on by default
pub const DEFAULT_HOST: &str = "127.0.0.1:8000";

/// Default websocket endpoint for playback and navigation sync
pub const DEFAULT_SERVER_URL: &str = concatcp!("ws://", DEFAULT_HOST, "/ws");

/// Default HTTP endpoint serving the album catalog
pub const DEFAULT_CATALOG_URL: &str = concatcp!("http://", DEFAULT_HOST, "/api/library");

/// Accent color used until an album with its own color is inspected
pub const DEFAULT_ACCENT: &str = "#44aa88";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CratedigConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub orbit: OrbitConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    /// Fixed delay before each reconnect attempt
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Retries for the catalog request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

const fn default_reconnect_delay() -> u64 {
    3000
}

const fn default_request_timeout() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            catalog_url: default_catalog_url(),
            reconnect_delay_ms: default_reconnect_delay(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Maximum slots per crate, separators included
    #[serde(default = "default_crate_size")]
    pub crate_size: usize,
}

const fn default_crate_size() -> usize {
    50
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            crate_size: default_crate_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_speed_overview")]
    pub speed_overview: f64,
    #[serde(default = "default_speed_browse")]
    pub speed_browse: f64,
    /// Degrees of field of view per wheel unit in the player view
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f64,
    #[serde(default)]
    pub inverted: bool,
}

const fn default_damping() -> f64 {
    0.1
}

const fn default_speed_overview() -> f64 {
    0.005
}

const fn default_speed_browse() -> f64 {
    0.003
}

const fn default_zoom_speed() -> f64 {
    0.05
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            speed_overview: default_speed_overview(),
            speed_browse: default_speed_browse(),
            zoom_speed: default_zoom_speed(),
            inverted: false,
        }
    }
}

/// Fixed camera placement for one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPose {
    pub position: DVec3,
    pub look: DVec3,
    pub fov: f64,
    /// Zero places the camera instantly
    #[serde(default)]
    pub transition_ms: u64,
}

impl ViewPose {
    #[must_use]
    pub const fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Browse placement follows the scroll position, so only the look origin and
/// the camera's offset from the look point are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrowsePose {
    pub look_origin: DVec3,
    pub offset: DVec3,
    pub fov: f64,
    #[serde(default)]
    pub transition_ms: u64,
}

impl BrowsePose {
    #[must_use]
    pub const fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_overview_pose")]
    pub overview: ViewPose,
    #[serde(default = "default_browse_pose")]
    pub browse: BrowsePose,
    #[serde(default = "default_inspect_pose")]
    pub inspect: ViewPose,
    #[serde(default = "default_player_pose")]
    pub player: ViewPose,
    /// World units between neighbouring crates in the overview
    #[serde(default = "default_crate_spacing")]
    pub crate_spacing: f64,
    /// World units between neighbouring records while digging
    #[serde(default = "default_digging_spacing")]
    pub digging_spacing: f64,
}

const fn default_overview_pose() -> ViewPose {
    ViewPose {
        position: DVec3::new(0.0, 30.0, 0.0),
        look: DVec3::new(0.0, 10.0, -80.0),
        fov: 30.0,
        transition_ms: 0,
    }
}

const fn default_browse_pose() -> BrowsePose {
    BrowsePose {
        look_origin: DVec3::new(100.0, 5.0, 0.0),
        offset: DVec3::new(-30.0, 45.0, 0.0),
        fov: 30.0,
        transition_ms: 0,
    }
}

const fn default_inspect_pose() -> ViewPose {
    ViewPose {
        position: DVec3::new(0.0, 0.0, 70.0),
        look: DVec3::new(0.0, 0.0, 100.0),
        fov: 65.0,
        transition_ms: 0,
    }
}

const fn default_player_pose() -> ViewPose {
    ViewPose {
        position: DVec3::new(-75.0, 25.0, 10.0),
        look: DVec3::new(-100.0, 0.0, 0.0),
        fov: 30.0,
        transition_ms: 0,
    }
}

const fn default_crate_spacing() -> f64 {
    16.0
}

const fn default_digging_spacing() -> f64 {
    0.6
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            overview: default_overview_pose(),
            browse: default_browse_pose(),
            inspect: default_inspect_pose(),
            player: default_player_pose(),
            crate_spacing: default_crate_spacing(),
            digging_spacing: default_digging_spacing(),
        }
    }
}

/// Drag response and limits for one view's orbit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitProfile {
    /// Radians per pointer pixel
    pub sensitivity: f64,
    /// Half-width of the azimuth window around the drag baseline
    pub limit_azimuth: f64,
    /// Half-height of the polar window around the drag baseline
    pub limit_polar: f64,
    pub min_polar: f64,
    pub max_polar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    #[serde(default = "default_orbit_profile")]
    pub default: OrbitProfile,
    #[serde(default = "default_inspect_orbit")]
    pub inspect: OrbitProfile,
    #[serde(default = "default_player_orbit")]
    pub player: OrbitProfile,
}

const fn default_smoothing() -> f64 {
    0.1
}

fn default_orbit_profile() -> OrbitProfile {
    OrbitProfile {
        sensitivity: 0.005,
        limit_azimuth: 10.0,
        limit_polar: 0.4,
        min_polar: 0.1,
        max_polar: PI / 2.0,
    }
}

fn default_inspect_orbit() -> OrbitProfile {
    OrbitProfile {
        sensitivity: 0.005,
        limit_azimuth: 0.2,
        limit_polar: 0.2,
        min_polar: 0.1,
        max_polar: PI / 1.5,
    }
}

fn default_player_orbit() -> OrbitProfile {
    OrbitProfile {
        sensitivity: 0.004,
        limit_azimuth: 10.0,
        limit_polar: 0.4,
        min_polar: 0.2,
        max_polar: PI / 2.2,
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            smoothing: default_smoothing(),
            default: default_orbit_profile(),
            inspect: default_inspect_orbit(),
            player: default_player_orbit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_fov_min")]
    pub fov_min: f64,
    #[serde(default = "default_fov_max")]
    pub fov_max: f64,
    /// How long an eased disc load stays in the loading phase
    #[serde(default = "default_disc_fly")]
    pub disc_fly_ms: u64,
    #[serde(default)]
    pub arm_rest: f64,
    #[serde(default = "default_arm_start")]
    pub arm_start: f64,
    #[serde(default = "default_arm_end")]
    pub arm_end: f64,
    #[serde(default = "default_damping")]
    pub arm_damping: f64,
    /// Radians per frame while playing
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f64,
    #[serde(default = "default_radius_outer")]
    pub radius_outer: f64,
    #[serde(default = "default_radius_inner")]
    pub radius_inner: f64,
}

const fn default_fov_min() -> f64 {
    10.0
}

const fn default_fov_max() -> f64 {
    75.0
}

const fn default_disc_fly() -> u64 {
    1500
}

const fn default_arm_start() -> f64 {
    -0.42
}

const fn default_arm_end() -> f64 {
    -0.83
}

const fn default_rotation_speed() -> f64 {
    0.035
}

const fn default_radius_outer() -> f64 {
    3.3
}

const fn default_radius_inner() -> f64 {
    1.2
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fov_min: default_fov_min(),
            fov_max: default_fov_max(),
            disc_fly_ms: default_disc_fly(),
            arm_rest: 0.0,
            arm_start: default_arm_start(),
            arm_end: default_arm_end(),
            arm_damping: default_damping(),
            rotation_speed: default_rotation_speed(),
            radius_outer: default_radius_outer(),
            radius_inner: default_radius_inner(),
        }
    }
}

impl PlayerConfig {
    #[must_use]
    pub const fn disc_fly(&self) -> Duration {
        Duration::from_millis(self.disc_fly_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_accent")]
    pub default_accent: String,
    #[serde(default = "default_marquee_interval")]
    pub marquee_interval_ms: u64,
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

fn default_accent() -> String {
    DEFAULT_ACCENT.to_string()
}

const fn default_marquee_interval() -> u64 {
    200
}

fn default_window_title() -> String {
    "Cratedig".to_string()
}

const fn default_frame_rate() -> u32 {
    60
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_accent: default_accent(),
            marquee_interval_ms: default_marquee_interval(),
            window_title: default_window_title(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl UiConfig {
    /// Duration of one rendered frame, never zero.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/cratedig/cratedig.log
    #[serde(default)]
    pub enabled: bool,
}

impl CratedigConfig {
    /// Get the config file path (~/.config/cratedig/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default path, writing the template on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, written, parsed or
    /// fails validation.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `path`, writing the template there if it is missing.
    /// A freshly written template yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written, parsed or fails
    /// validation.
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load and validate config from an existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.library.crate_size == 0 {
            return Err(invalid("library.crate_size must be at least 1"));
        }
        if self.player.fov_min >= self.player.fov_max {
            return Err(invalid("player.fov_min must be below player.fov_max"));
        }
        for (name, damping) in [
            ("scroll.damping", self.scroll.damping),
            ("orbit.smoothing", self.orbit.smoothing),
            ("player.arm_damping", self.player.arm_damping),
        ] {
            if damping <= 0.0 || damping > 1.0 {
                return Err(invalid(&format!("{name} must be in (0, 1]")));
            }
        }
        for (name, profile) in [
            ("orbit.default", &self.orbit.default),
            ("orbit.inspect", &self.orbit.inspect),
            ("orbit.player", &self.orbit.player),
        ] {
            if profile.min_polar >= profile.max_polar {
                return Err(invalid(&format!(
                    "{name}.min_polar must be below {name}.max_polar"
                )));
            }
        }
        if self.player.radius_inner >= self.player.radius_outer {
            return Err(invalid("player.radius_inner must be below player.radius_outer"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.to_string(),
    }
}

/// Commented template written on first run. Values mirror the defaults.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# Cratedig Configuration
# ~/.config/cratedig/config.toml

[server]
url = ""#,
    DEFAULT_SERVER_URL,
    r#""
catalog_url = ""#,
    DEFAULT_CATALOG_URL,
    r#""
# Fixed delay between reconnect attempts
reconnect_delay_ms = 3000
request_timeout_secs = 10
max_retries = 3

[library]
# Slots per crate, separators included
crate_size = 50

[scroll]
damping = 0.1
speed_overview = 0.005
speed_browse = 0.003
zoom_speed = 0.05
inverted = false

[camera]
crate_spacing = 16.0
digging_spacing = 0.6

[camera.overview]
position = [0.0, 30.0, 0.0]
look = [0.0, 10.0, -80.0]
fov = 30.0
transition_ms = 0

[camera.browse]
look_origin = [100.0, 5.0, 0.0]
offset = [-30.0, 45.0, 0.0]
fov = 30.0
transition_ms = 0

[camera.inspect]
position = [0.0, 0.0, 70.0]
look = [0.0, 0.0, 100.0]
fov = 65.0
transition_ms = 0

[camera.player]
position = [-75.0, 25.0, 10.0]
look = [-100.0, 0.0, 0.0]
fov = 30.0
transition_ms = 0

[orbit]
smoothing = 0.1

[orbit.default]
sensitivity = 0.005
limit_azimuth = 10.0
limit_polar = 0.4
min_polar = 0.1
max_polar = 1.5707963267948966

[orbit.inspect]
sensitivity = 0.005
limit_azimuth = 0.2
limit_polar = 0.2
min_polar = 0.1
max_polar = 2.0943951023931953

[orbit.player]
sensitivity = 0.004
limit_azimuth = 10.0
limit_polar = 0.4
min_polar = 0.2
max_polar = 1.4279966607226333

[player]
fov_min = 10.0
fov_max = 75.0
disc_fly_ms = 1500
arm_rest = 0.0
arm_start = -0.42
arm_end = -0.83
arm_damping = 0.1
rotation_speed = 0.035
radius_outer = 3.3
radius_inner = 1.2

[ui]
default_accent = ""#,
    DEFAULT_ACCENT,
    r#""
marquee_interval_ms = 200
window_title = "Cratedig"
frame_rate = 60

[logging]
# Also write logs to ~/.config/cratedig/cratedig.log
enabled = false
"#
);
