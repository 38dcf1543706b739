//! The four-view navigation state machine.
//!
//! [`Navigator`] owns the session context and is the single place where user
//! input, server pushes and the catalog load meet. Every entry into a view
//! publishes [`SceneEvent`]s for the renderer and persists a [`NavSnapshot`]
//! to the server so another client, or a reload, can resume from it.

use crate::camera::{CameraPose, CameraRig};
use crate::config::{CratedigConfig, OrbitProfile};
use crate::error::CoreError;
use crate::library::{LibrarySettings, LibraryView, SortMode};
use crate::model::{Album, Catalog};
use crate::playback::{Advance, PlaybackPhase, PlaybackSession};
use crate::protocol::{ClientMessage, MessageSink, NavSnapshot, ServerMessage};
use crate::scene::{Affordances, Chrome, Pick, SceneBus, SceneEvent};
use crate::scroll::ScrollEngine;
use crate::sync::PendingSnapshot;
use crate::time::format_clock;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const LOG_TARGET: &str = "cratedig::navigation";

/// The four views, ordered by depth. Serialized as its index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum ViewState {
    #[default]
    Overview = 0,
    Browse = 1,
    Inspect = 2,
    Player = 3,
}

impl TryFrom<u8> for ViewState {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Overview),
            1 => Ok(Self::Browse),
            2 => Ok(Self::Inspect),
            3 => Ok(Self::Player),
            other => Err(CoreError::UnknownViewState(other)),
        }
    }
}

impl From<ViewState> for u8 {
    fn from(view: ViewState) -> Self {
        view as Self
    }
}

/// State owned by the session: the catalog, its current view and playback.
#[derive(Debug)]
pub struct SessionContext {
    pub catalog: Catalog,
    pub library: LibraryView,
    pub playback: PlaybackSession,
    /// Theme accent color currently applied
    pub accent: String,
}

#[derive(Debug)]
pub struct Navigator {
    config: CratedigConfig,
    sink: MessageSink,
    scene: SceneBus,
    ctx: SessionContext,
    scroll: ScrollEngine,
    camera: CameraRig,
    view: ViewState,
    pending: PendingSnapshot,
    library_loaded: bool,
    scroll_inverted: bool,
    active_crate: Option<usize>,
    active_album: Option<Arc<Album>>,
    active_disc: usize,
}

impl Navigator {
    #[must_use]
    pub fn new(config: CratedigConfig, sink: MessageSink, scene: SceneBus) -> Self {
        let start = config.camera.overview;
        let camera = CameraRig::new(
            CameraPose {
                position: start.position,
                look_at: start.look,
                fov: start.fov,
            },
            config.orbit.smoothing,
        );
        let ctx = SessionContext {
            catalog: Vec::new(),
            library: LibraryView::default(),
            playback: PlaybackSession::new(sink.clone(), config.player.clone()),
            accent: config.ui.default_accent.clone(),
        };
        Self {
            scroll: ScrollEngine::new(config.scroll.damping),
            scroll_inverted: config.scroll.inverted,
            camera,
            ctx,
            sink,
            scene,
            config,
            view: ViewState::Overview,
            pending: PendingSnapshot::new(),
            library_loaded: false,
            active_crate: None,
            active_album: None,
            active_disc: 0,
        }
    }

    #[must_use]
    pub const fn view(&self) -> ViewState {
        self.view
    }

    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.ctx
    }

    #[must_use]
    pub const fn library(&self) -> &LibraryView {
        &self.ctx.library
    }

    #[must_use]
    pub const fn playback(&self) -> &PlaybackSession {
        &self.ctx.playback
    }

    #[must_use]
    pub const fn scroll(&self) -> &ScrollEngine {
        &self.scroll
    }

    #[must_use]
    pub const fn camera(&self) -> &CameraRig {
        &self.camera
    }

    #[must_use]
    pub const fn active_crate(&self) -> Option<usize> {
        self.active_crate
    }

    #[must_use]
    pub const fn active_album(&self) -> Option<&Arc<Album>> {
        self.active_album.as_ref()
    }

    #[must_use]
    pub const fn active_disc(&self) -> usize {
        self.active_disc
    }

    #[must_use]
    pub const fn is_library_loaded(&self) -> bool {
        self.library_loaded
    }

    /// Whether a sync snapshot is waiting for the catalog.
    #[must_use]
    pub const fn is_sync_pending(&self) -> bool {
        self.pending.is_pending()
    }

    #[must_use]
    pub const fn is_scroll_inverted(&self) -> bool {
        self.scroll_inverted
    }

    /// Which view buttons are enabled.
    #[must_use]
    pub const fn affordances(&self) -> Affordances {
        Affordances {
            overview: true,
            browse: self.active_crate.is_some(),
            inspect: self.active_album.is_some(),
            player: self.ctx.playback.has_played(),
        }
    }

    /// Describe the current position for the server.
    #[must_use]
    pub fn snapshot(&self) -> NavSnapshot {
        let settings = self.ctx.library.settings();
        NavSnapshot {
            sort_mode: settings.sort,
            crate_index: self.active_crate.unwrap_or(0),
            album_id: self.active_album.as_ref().map(|a| a.id.clone()),
            disc_index: self.active_disc,
            view_state: self.view,
            accent_color: Some(self.ctx.accent.clone()),
            ascending: settings.ascending,
            grouping_mode: settings.grouping,
        }
    }

    /// Elapsed time of the current track as `m:ss`.
    #[must_use]
    pub fn elapsed_label(&self, now: Instant) -> String {
        format_clock(self.ctx.playback.elapsed(now))
    }

    // Catalog lifecycle

    /// Install the fetched catalog and enter the first interactive view.
    ///
    /// A snapshot buffered from an early sync is replayed here, once;
    /// otherwise the library starts unsorted at the overview.
    pub fn on_catalog_loaded(&mut self, catalog: Catalog, now: Instant) {
        info!(target: LOG_TARGET, "Catalog loaded: {} albums", catalog.len());
        self.ctx.catalog = catalog;
        self.library_loaded = true;
        self.scene.emit(SceneEvent::Status("Ready".into()));

        if let Some(snapshot) = self.pending.take() {
            info!(target: LOG_TARGET, "Replaying buffered sync snapshot");
            self.restore(&snapshot, now);
        } else {
            self.rebuild_library(LibrarySettings::default());
            self.enter_overview();
        }
    }

    /// The catalog could not be fetched; stay non-interactive.
    pub fn on_catalog_failed(&mut self, reason: &str) {
        error!(target: LOG_TARGET, "Failed to load catalog: {reason}");
        self.scene
            .emit(SceneEvent::Status(format!("Failed to load library: {reason}")));
    }

    /// Surface a transport status line.
    pub fn on_connection_status(&self, text: &str) {
        self.scene.emit(SceneEvent::Status(text.to_string()));
    }

    fn rebuild_library(&mut self, settings: LibrarySettings) {
        self.ctx.library =
            LibraryView::build(&self.ctx.catalog, settings, self.config.library.crate_size);
        self.active_crate = self
            .active_crate
            .and_then(|index| self.ctx.library.clamp_index(index));
        debug!(
            target: LOG_TARGET,
            "Library rebuilt: {} crates ({}, ascending={}, {:?})",
            self.ctx.library.len(),
            settings.sort,
            settings.ascending,
            settings.grouping
        );
        self.scene.emit(SceneEvent::LibraryRebuilt {
            crate_count: self.ctx.library.len(),
        });
    }

    // View entry

    /// Show every crate of the current library.
    pub fn enter_overview(&mut self) {
        self.change_view(ViewState::Overview);
        let settings = self.ctx.library.settings();
        self.scene
            .emit(SceneEvent::TitleChanged(format!("Collection ({})", settings.sort)));
        self.scene.emit(SceneEvent::OverviewRebuilt {
            labels: self
                .ctx
                .library
                .crates()
                .iter()
                .map(|c| c.label.clone())
                .collect(),
        });
        self.scroll.reset(self.ctx.library.len());
        self.place_camera(true);
        self.after_transition();
    }

    /// Dig through one crate. Out-of-range indices are clamped.
    ///
    /// Returns `false` if the library has no crates.
    pub fn enter_browse(&mut self, crate_index: usize) -> bool {
        let Some(index) = self.ctx.library.clamp_index(crate_index) else {
            debug!(target: LOG_TARGET, "No crates to browse");
            return false;
        };
        let Some((label, item_count)) = self.ctx.library.get(index).map(|c| (c.label.clone(), c.len()))
        else {
            return false;
        };

        self.active_crate = Some(index);
        self.change_view(ViewState::Browse);
        self.scene.emit(SceneEvent::TitleChanged(label.clone()));
        self.scene.emit(SceneEvent::BrowseRebuilt {
            crate_index: index,
            label,
            item_count,
        });
        self.scroll.reset(item_count);
        self.place_camera(true);
        self.after_transition();
        true
    }

    /// Look at one album's sleeve and discs.
    pub fn enter_inspect(&mut self, album: Arc<Album>) {
        if !matches!(&self.active_album, Some(active) if active.id == album.id) {
            self.active_disc = 0;
        }
        if let Some(accent) = album.accent_color.as_deref().filter(|c| !c.is_empty()) {
            self.set_accent(accent);
        }
        self.active_album = Some(Arc::clone(&album));
        self.change_view(ViewState::Inspect);
        self.scene.emit(SceneEvent::TitleChanged(album.title.clone()));
        self.scene.emit(SceneEvent::InspectRebuilt { album });
        self.place_camera(false);
        self.after_transition();
    }

    /// Put a disc of the active album on the turntable.
    ///
    /// An eased load flies the disc in and auto-plays; an instant one (used
    /// when resuming) leaves it ready. Returns `false` without changing view
    /// when there is no active album or the disc does not exist.
    pub fn enter_player(&mut self, disc_index: usize, instant: bool, now: Instant) -> bool {
        let Some(album) = self.active_album.clone() else {
            warn!(target: LOG_TARGET, "Cannot enter player without an active album");
            return false;
        };
        let Some(disc_number) = album
            .discs
            .get(disc_index)
            .filter(|d| !d.tracks.is_empty())
            .map(|d| d.disc_number)
        else {
            warn!(
                target: LOG_TARGET,
                "Album {} has no playable disc at index {disc_index}", album.id
            );
            return false;
        };
        if let Err(e) = self
            .ctx
            .playback
            .load_disc(Arc::clone(&album), disc_index, instant, now)
        {
            warn!(target: LOG_TARGET, "Failed to load disc: {e}");
            return false;
        }

        self.active_disc = disc_index;
        self.change_view(ViewState::Player);
        let accent = album
            .accent_color
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.config.ui.default_accent.clone());
        self.set_accent(&accent);
        self.scene.emit(SceneEvent::DiscLoading {
            disc_number,
            instant,
        });
        self.place_camera(true);
        self.after_transition();
        self.emit_transport();
        true
    }

    /// Jump to a view from the navigation bar. Disabled views are ignored.
    pub fn navigate(&mut self, view: ViewState) -> bool {
        if !self.affordances().allows(view) {
            return false;
        }
        match view {
            ViewState::Overview => self.enter_overview(),
            ViewState::Browse => {
                let index = self.active_crate.unwrap_or(0);
                return self.enter_browse(index);
            }
            ViewState::Inspect => {
                let Some(album) = self.active_album.clone() else {
                    return false;
                };
                self.enter_inspect(album);
            }
            ViewState::Player => {
                // Return to whatever is on the platter without reloading it
                self.change_view(ViewState::Player);
                self.place_camera(true);
                self.after_transition();
                self.emit_transport();
            }
        }
        true
    }

    /// Replay a snapshot by walking forward through the views it implies.
    ///
    /// Stops early at the deepest view whose data still exists. Returns the
    /// view reached.
    pub fn restore(&mut self, snapshot: &NavSnapshot, now: Instant) -> ViewState {
        if let Some(accent) = snapshot.accent_color.as_deref().filter(|c| !c.is_empty()) {
            self.set_accent(accent);
        }
        self.rebuild_library(LibrarySettings {
            sort: snapshot.sort_mode,
            ascending: snapshot.ascending,
            grouping: snapshot.grouping_mode,
        });

        let located = snapshot
            .album_id
            .as_deref()
            .and_then(|id| self.ctx.library.locate_album(id));
        let crate_index = located
            .as_ref()
            .map(|l| l.crate_index)
            .or_else(|| self.ctx.library.clamp_index(snapshot.crate_index));

        self.enter_overview();
        let target = snapshot.view_state;
        if target < ViewState::Browse {
            return self.view;
        }

        let Some(crate_index) = crate_index else {
            info!(target: LOG_TARGET, "Snapshot replay stopped at overview: library is empty");
            return self.view;
        };
        self.enter_browse(crate_index);
        if target < ViewState::Inspect {
            return self.view;
        }

        let Some(location) = located else {
            info!(
                target: LOG_TARGET,
                "Snapshot replay stopped at browse: album {:?} not in catalog",
                snapshot.album_id
            );
            return self.view;
        };
        self.scroll.select(location.slot);
        self.enter_inspect(location.album);
        if target < ViewState::Player {
            return self.view;
        }

        if !self.enter_player(snapshot.disc_index, true, now) {
            info!(
                target: LOG_TARGET,
                "Snapshot replay stopped at inspect: disc {} unavailable", snapshot.disc_index
            );
        }
        self.view
    }

    fn change_view(&mut self, view: ViewState) {
        if self.camera.is_orbiting() {
            self.camera.end_orbit();
        }
        self.view = view;
        self.scene.emit(SceneEvent::ViewChanged {
            view,
            chrome: Chrome::for_view(view),
        });
    }

    /// Persist the new position and refresh the view buttons.
    fn after_transition(&self) {
        let snapshot = self.snapshot();
        debug!(
            target: LOG_TARGET,
            "Persisting snapshot: view={:?} crate={} album={:?}",
            snapshot.view_state,
            snapshot.crate_index,
            snapshot.album_id
        );
        self.sink.send(ClientMessage::UpdateNav(snapshot));
        self.scene
            .emit(SceneEvent::AffordancesChanged(self.affordances()));
    }

    fn set_accent(&mut self, accent: &str) {
        if self.ctx.accent != accent {
            self.ctx.accent = accent.to_string();
            self.scene.emit(SceneEvent::AccentChanged(accent.to_string()));
        }
    }

    fn emit_transport(&self) {
        let playback = &self.ctx.playback;
        let (title, artist) = match (playback.now_playing(), playback.current_track()) {
            (Some(playing), _) => (Some(playing.title.clone()), Some(playing.artist.clone())),
            (None, Some(track)) => (
                Some(track.title.clone()),
                playback.loaded().map(|l| l.album().artist.clone()),
            ),
            (None, None) => (None, None),
        };
        self.scene.emit(SceneEvent::Transport {
            playing: playback.phase() == PlaybackPhase::Playing,
            title,
            artist,
        });
    }

    // Camera

    /// Where the camera should sit for the current view and scroll position.
    fn target_pose(&self) -> (CameraPose, Duration) {
        let cam = &self.config.camera;
        let current = self.scroll.current();
        match self.view {
            ViewState::Overview => {
                let p = cam.overview;
                let shift = DVec3::new(current * cam.crate_spacing, 0.0, 0.0);
                let pose = CameraPose {
                    position: p.position + shift,
                    look_at: p.look + shift,
                    fov: p.fov,
                };
                (pose, p.transition())
            }
            ViewState::Browse => {
                let b = cam.browse;
                let look_at = b.look_origin + DVec3::new(current * cam.digging_spacing, 0.0, 0.0);
                let pose = CameraPose {
                    position: look_at + b.offset,
                    look_at,
                    fov: b.fov,
                };
                (pose, b.transition())
            }
            ViewState::Inspect | ViewState::Player => {
                let p = if self.view == ViewState::Inspect {
                    cam.inspect
                } else {
                    cam.player
                };
                let pose = CameraPose {
                    position: p.position,
                    look_at: p.look,
                    fov: p.fov,
                };
                (pose, p.transition())
            }
        }
    }

    fn place_camera(&mut self, instant: bool) {
        let (pose, transition) = self.target_pose();
        let duration = if instant { Duration::ZERO } else { transition };
        self.camera
            .place(pose.position, pose.look_at, pose.fov, duration);
    }

    fn orbit_profile(&self) -> OrbitProfile {
        match self.view {
            ViewState::Inspect => self.config.orbit.inspect,
            ViewState::Player => self.config.orbit.player,
            ViewState::Overview | ViewState::Browse => self.config.orbit.default,
        }
    }

    // Input

    /// Wheel input: scrolls in overview and browse, zooms in the player.
    pub fn wheel(&mut self, delta_y: f64) {
        let delta = if self.scroll_inverted { -delta_y } else { delta_y };
        let scroll = &self.config.scroll;
        match self.view {
            ViewState::Overview => self.scroll.nudge(delta * scroll.speed_overview),
            ViewState::Browse => self.scroll.nudge(delta * scroll.speed_browse),
            ViewState::Player => {
                let player = &self.config.player;
                self.camera
                    .zoom(delta * scroll.zoom_speed, player.fov_min, player.fov_max);
            }
            ViewState::Inspect => {}
        }
    }

    /// Flip wheel direction. Returns the new setting.
    pub fn toggle_scroll_inversion(&mut self) -> bool {
        self.scroll_inverted = !self.scroll_inverted;
        self.scroll_inverted
    }

    /// Resolve a click on the scene.
    pub fn pick(&mut self, pick: Pick, now: Instant) -> bool {
        match (self.view, pick) {
            (ViewState::Overview, Pick::Crate(index)) => self.enter_browse(index),
            (ViewState::Browse, Pick::Album(slot)) => {
                let album = self
                    .active_crate
                    .and_then(|c| self.ctx.library.get(c))
                    .and_then(|c| c.album_at(slot))
                    .cloned();
                let Some(album) = album else {
                    return false;
                };
                if self.scroll.is_near(slot) {
                    self.enter_inspect(album);
                } else {
                    self.scroll.select(slot);
                }
                true
            }
            (ViewState::Inspect, Pick::DiscItem(index)) => self.enter_player(index, false, now),
            (ViewState::Player, Pick::VinylSurface { radius }) => {
                let seeked = self.ctx.playback.seek_to_radius(radius, now);
                if seeked {
                    self.emit_transport();
                }
                seeked
            }
            _ => false,
        }
    }

    /// Start an orbit drag. Only the inspect and player views orbit.
    pub fn begin_orbit(&mut self, pointer: (f64, f64)) -> bool {
        if !matches!(self.view, ViewState::Inspect | ViewState::Player) {
            return false;
        }
        let profile = self.orbit_profile();
        self.camera.begin_orbit(pointer, profile);
        true
    }

    pub fn drag_orbit(&mut self, pointer: (f64, f64)) {
        self.camera.drag_orbit(pointer);
    }

    pub fn end_orbit(&mut self) {
        self.camera.end_orbit();
    }

    /// Step to the neighbouring crate, wrapping around. Browse only.
    pub fn cycle_crate(&mut self, direction: isize) -> bool {
        if self.view != ViewState::Browse {
            return false;
        }
        let (Some(current), count) = (self.active_crate, self.ctx.library.len()) else {
            return false;
        };
        if count == 0 {
            return false;
        }
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let next = (current as isize + direction).rem_euclid(count as isize) as usize;
        self.enter_browse(next)
    }

    // Library controls

    /// Re-sort the library and return to the overview.
    pub fn set_sort_mode(&mut self, sort: SortMode) {
        let settings = LibrarySettings {
            sort,
            ..self.ctx.library.settings()
        };
        self.rebuild_library(settings);
        self.enter_overview();
    }

    /// Flip ascending/descending. Ignored in catalog order.
    pub fn toggle_order(&mut self) -> bool {
        let mut settings = self.ctx.library.settings();
        if settings.sort == SortMode::Raw {
            return false;
        }
        settings.ascending = !settings.ascending;
        self.rebuild_library(settings);
        self.enter_overview();
        true
    }

    /// Switch between flow and bucket grouping. Ignored in catalog order.
    pub fn toggle_grouping(&mut self) -> bool {
        let mut settings = self.ctx.library.settings();
        if settings.sort == SortMode::Raw {
            return false;
        }
        settings.grouping = settings.grouping.toggled();
        self.rebuild_library(settings);
        self.enter_overview();
        true
    }

    // Transport

    /// Request a volume in `[0, 1]`. Returns the value sent.
    pub fn set_volume(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let value = value.clamp(0.0, 1.0);
        self.sink.send(ClientMessage::Volume { value });
        Some(value)
    }

    pub fn play_pause(&mut self, now: Instant) {
        self.ctx.playback.pause(now);
        let status = if self.ctx.playback.phase() == PlaybackPhase::Playing {
            "Playing"
        } else {
            "Paused"
        };
        self.scene.emit(SceneEvent::Status(status.into()));
        self.emit_transport();
    }

    pub fn stop(&mut self) {
        self.ctx.playback.stop();
        self.emit_transport();
    }

    /// Request the next track, or move on to the next disc.
    pub fn next_track(&mut self, now: Instant) {
        match self.ctx.playback.advance(now) {
            Advance::Track(index) => debug!(target: LOG_TARGET, "Advanced to track {index}"),
            Advance::DiscFinished => self.on_disc_finished(now),
            Advance::NoDisc => {}
        }
    }

    pub fn previous_track(&mut self, now: Instant) {
        self.ctx.playback.previous(now);
    }

    /// Play the album's next disc, or stop after the last one.
    fn on_disc_finished(&mut self, now: Instant) {
        let Some(loaded) = self.ctx.playback.loaded() else {
            return;
        };
        let album = Arc::clone(loaded.album());
        let next = loaded.disc_index() + 1;
        if next < album.discs.len() {
            info!(target: LOG_TARGET, "Disc finished, loading disc {} of {}", next + 1, album.title);
            self.active_album = Some(album);
            self.enter_player(next, false, now);
        } else {
            info!(target: LOG_TARGET, "End of album {}", album.title);
            self.stop();
        }
    }

    // Server

    /// Apply one message pushed by the server.
    pub fn handle_server_message(&mut self, message: ServerMessage, now: Instant) {
        match message {
            ServerMessage::Sync {
                playback,
                navigation,
            } => {
                if let Some(playback) = playback.filter(|p| p.is_playing) {
                    self.ctx.playback.note_playing(playback.track, playback.artist);
                    self.emit_transport_playing();
                }
                let Some(snapshot) = navigation else {
                    return;
                };
                if self.library_loaded {
                    info!(target: LOG_TARGET, "Applying sync snapshot");
                    self.restore(&snapshot, now);
                } else {
                    if self.pending.offer(snapshot).is_some() {
                        debug!(target: LOG_TARGET, "Replaced earlier buffered snapshot");
                    }
                    info!(target: LOG_TARGET, "Catalog not loaded yet, buffering sync snapshot");
                }
            }
            ServerMessage::Playing { track, artist } => {
                self.ctx.playback.note_playing(track, artist);
                self.scene.emit(SceneEvent::Status("Playing".into()));
                self.emit_transport_playing();
            }
            ServerMessage::Paused => self.emit_transport_idle(),
            ServerMessage::Stopped => {
                self.ctx.playback.stopped_remotely();
                self.emit_transport_idle();
            }
            ServerMessage::Finished => {
                debug!(target: LOG_TARGET, "Server reported track finished");
                self.next_track(now);
            }
            ServerMessage::Error { message } => {
                warn!(target: LOG_TARGET, "Server error: {message}");
                self.scene.emit(SceneEvent::Status(message));
            }
        }
    }

    /// The server says audio is running, whatever the local phase.
    fn emit_transport_playing(&self) {
        let playing = self.ctx.playback.now_playing();
        self.scene.emit(SceneEvent::Transport {
            playing: true,
            title: playing.map(|p| p.title.clone()),
            artist: playing.map(|p| p.artist.clone()),
        });
        self.scene
            .emit(SceneEvent::AffordancesChanged(self.affordances()));
    }

    fn emit_transport_idle(&self) {
        let playing = self.ctx.playback.now_playing();
        self.scene.emit(SceneEvent::Transport {
            playing: false,
            title: playing.map(|p| p.title.clone()),
            artist: playing.map(|p| p.artist.clone()),
        });
    }

    // Frame

    /// Advance playback visuals, scroll and camera by one frame.
    pub fn frame(&mut self, dt: Duration, now: Instant) {
        if self.ctx.playback.update(now) {
            self.emit_transport();
        }
        if matches!(self.view, ViewState::Overview | ViewState::Browse) {
            self.scroll.step();
            if !self.camera.is_transitioning() {
                let (pose, _) = self.target_pose();
                self.camera.set_look_at(pose.look_at);
            }
        }
        self.camera.update(dt);
    }
}
