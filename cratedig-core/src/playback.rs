use crate::config::PlayerConfig;
use crate::error::{CoreError, Result};
use crate::model::{Album, Disc, Track};
use crate::protocol::{ClientMessage, MessageSink};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const LOG_TARGET: &str = "cratedig::playback";

/// Local view of the turntable. The server owns the audio; these phases only
/// track what has been requested and acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Empty,
    /// Disc is flying onto the platter
    Loading,
    /// Disc on the platter, nothing playing
    Ready,
    Playing,
    Paused,
}

/// The disc on the platter and the album it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDisc {
    album: Arc<Album>,
    disc_index: usize,
}

impl LoadedDisc {
    #[must_use]
    pub const fn album(&self) -> &Arc<Album> {
        &self.album
    }

    #[must_use]
    pub const fn disc_index(&self) -> usize {
        self.disc_index
    }

    /// The disc record. Indices are checked on load.
    #[must_use]
    pub fn disc(&self) -> &Disc {
        &self.album.discs[self.disc_index]
    }
}

/// Last track the server reported as playing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
}

/// What should happen after the server reports the current track ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The next track was requested
    Track(usize),
    /// The last track of the disc finished
    DiscFinished,
    NoDisc,
}

#[derive(Debug)]
pub struct PlaybackSession {
    sink: MessageSink,
    config: PlayerConfig,
    disc: Option<LoadedDisc>,
    phase: PlaybackPhase,
    track_index: usize,
    started_at: Option<Instant>,
    offset: Duration,
    /// Set while an eased load is in flight
    ready_at: Option<Instant>,
    now_playing: Option<NowPlaying>,
    has_played: bool,
    arm_angle: f64,
    arm_target: f64,
    rotation: f64,
}

impl PlaybackSession {
    #[must_use]
    pub fn new(sink: MessageSink, config: PlayerConfig) -> Self {
        let rest = config.arm_rest;
        Self {
            sink,
            config,
            disc: None,
            phase: PlaybackPhase::Empty,
            track_index: 0,
            started_at: None,
            offset: Duration::ZERO,
            ready_at: None,
            now_playing: None,
            has_played: false,
            arm_angle: rest,
            arm_target: rest,
            rotation: 0.0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[must_use]
    pub const fn loaded(&self) -> Option<&LoadedDisc> {
        self.disc.as_ref()
    }

    #[must_use]
    pub const fn track_index(&self) -> usize {
        self.track_index
    }

    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.disc
            .as_ref()
            .and_then(|d| d.disc().tracks.get(self.track_index))
    }

    /// Whether playback has started at least once this session.
    #[must_use]
    pub const fn has_played(&self) -> bool {
        self.has_played
    }

    #[must_use]
    pub const fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    /// Tone-arm angle around its pivot, in radians.
    #[must_use]
    pub const fn arm_angle(&self) -> f64 {
        self.arm_angle
    }

    /// Accumulated platter rotation, in radians.
    #[must_use]
    pub const fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Record the server's report of what is playing.
    pub fn note_playing(&mut self, title: Option<String>, artist: Option<String>) {
        self.has_played = true;
        if let Some(title) = title {
            self.now_playing = Some(NowPlaying {
                title,
                artist: artist.unwrap_or_default(),
            });
        }
    }

    /// Put a disc on the platter, replacing whatever was there.
    ///
    /// An instant load is ready immediately with the arm at the start of the
    /// record and does not auto-play. Otherwise the session stays in
    /// [`PlaybackPhase::Loading`] for the disc flight and then plays track 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the album has no disc at `disc_index` or the disc
    /// has no tracks. The platter is left empty in that case.
    pub fn load_disc(
        &mut self,
        album: Arc<Album>,
        disc_index: usize,
        instant: bool,
        now: Instant,
    ) -> Result<()> {
        if self.phase != PlaybackPhase::Empty {
            self.unload();
        }
        let disc = album
            .discs
            .get(disc_index)
            .ok_or(CoreError::DiscOutOfRange { index: disc_index })?;
        if disc.tracks.is_empty() {
            return Err(CoreError::EmptyDisc {
                disc_number: disc.disc_number,
            });
        }
        debug!(
            target: LOG_TARGET,
            "Loading disc {} of {} ({} tracks)",
            disc.disc_number,
            album.title,
            disc.tracks.len()
        );

        self.disc = Some(LoadedDisc { album, disc_index });
        self.has_played = true;
        self.track_index = 0;
        self.offset = Duration::ZERO;
        self.started_at = None;

        if instant {
            self.phase = PlaybackPhase::Ready;
            self.arm_angle = self.config.arm_start;
            self.arm_target = self.config.arm_start;
        } else {
            self.phase = PlaybackPhase::Loading;
            self.ready_at = Some(now + self.config.disc_fly());
        }
        Ok(())
    }

    /// Stop and clear the platter.
    pub fn unload(&mut self) {
        if self.phase == PlaybackPhase::Empty {
            return;
        }
        self.stop();
        self.disc = None;
        self.ready_at = None;
        self.phase = PlaybackPhase::Empty;
    }

    /// Request `index` from `offset`. Out-of-range indices are ignored.
    ///
    /// Returns whether a play intent was sent.
    pub fn play_track(&mut self, index: usize, offset: Duration, now: Instant) -> bool {
        let Some(loaded) = &self.disc else {
            return false;
        };
        let Some(track) = loaded.disc().tracks.get(index) else {
            return false;
        };
        let message = ClientMessage::Play {
            file_path: track.file_path.clone(),
            title: track.title.clone(),
            artist: loaded.album.artist.clone(),
            start_time: offset.as_secs_f64(),
        };

        self.track_index = index;
        self.offset = offset;
        self.started_at = Some(now);
        self.ready_at = None;
        self.phase = PlaybackPhase::Playing;
        self.has_played = true;
        self.sink.send(message);
        true
    }

    /// Toggle pause. A stopped disc plays its current track from the top.
    pub fn pause(&mut self, now: Instant) {
        match self.phase {
            PlaybackPhase::Ready => {
                self.play_track(self.track_index, Duration::ZERO, now);
            }
            PlaybackPhase::Playing => {
                self.offset = self.elapsed(now);
                self.started_at = None;
                self.phase = PlaybackPhase::Paused;
                self.sink.send(ClientMessage::pause());
            }
            PlaybackPhase::Paused => {
                self.started_at = Some(now);
                self.phase = PlaybackPhase::Playing;
                self.sink.send(ClientMessage::pause());
            }
            PlaybackPhase::Empty | PlaybackPhase::Loading => {}
        }
    }

    /// Request a stop and return the arm to rest.
    pub fn stop(&mut self) {
        self.sink.send(ClientMessage::stop());
        if self.disc.is_some() {
            self.phase = PlaybackPhase::Ready;
        }
        self.ready_at = None;
        self.started_at = None;
        self.offset = Duration::ZERO;
        self.arm_target = self.config.arm_rest;
    }

    /// Server confirmed a stop, possibly requested by another client.
    pub fn stopped_remotely(&mut self) {
        if matches!(self.phase, PlaybackPhase::Playing | PlaybackPhase::Paused) {
            self.phase = PlaybackPhase::Ready;
            self.started_at = None;
            self.offset = Duration::ZERO;
            self.arm_target = self.config.arm_rest;
        }
    }

    /// Position in the current track, computed on demand.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.phase {
            PlaybackPhase::Playing => {
                let since = self
                    .started_at
                    .map_or(Duration::ZERO, |start| now.saturating_duration_since(start));
                self.offset + since
            }
            PlaybackPhase::Paused => self.offset,
            _ => Duration::ZERO,
        }
    }

    /// Request the track after the one the server last reported.
    ///
    /// The lookup is by title, first match, since the server may have moved
    /// on without us. Duplicate titles on one disc resolve to the earliest.
    pub fn advance(&mut self, now: Instant) -> Advance {
        let Some(loaded) = &self.disc else {
            warn!(target: LOG_TARGET, "Cannot advance: no disc loaded");
            return Advance::NoDisc;
        };
        let disc = loaded.disc();
        let track_count = disc.tracks.len();
        let current = match &self.now_playing {
            Some(playing) => disc.position_of(&playing.title).unwrap_or_else(|| {
                warn!(
                    target: LOG_TARGET,
                    "Last played \"{}\" is not on disc {}, assuming first track",
                    playing.title,
                    disc.disc_number
                );
                0
            }),
            None => {
                warn!(target: LOG_TARGET, "No track reported yet, assuming first track");
                0
            }
        };
        let next = current + 1;
        if next < track_count {
            self.play_track(next, Duration::ZERO, now);
            Advance::Track(next)
        } else {
            Advance::DiscFinished
        }
    }

    /// Previous track, or restart the first one.
    pub fn previous(&mut self, now: Instant) {
        let index = self.track_index.saturating_sub(1);
        self.play_track(index, Duration::ZERO, now);
    }

    /// Seek by clicking the vinyl at `radius` from the spindle.
    ///
    /// The groove area maps linearly onto the whole disc, outer edge first.
    /// Returns whether a play intent was sent.
    pub fn seek_to_radius(&mut self, radius: f64, now: Instant) -> bool {
        let (outer, inner) = (self.config.radius_outer, self.config.radius_inner);
        if !(inner..=outer).contains(&radius) || outer <= inner {
            return false;
        }
        let Some(loaded) = &self.disc else {
            return false;
        };
        let progress = (outer - radius) / (outer - inner);
        let target = loaded.disc().total_duration().mul_f64(progress);

        let mut acc = Duration::ZERO;
        let mut hit = None;
        for (i, track) in loaded.disc().tracks.iter().enumerate() {
            let length = track.duration();
            if target <= acc + length {
                hit = Some((i, target.saturating_sub(acc)));
                break;
            }
            acc += length;
        }
        hit.is_some_and(|(index, offset)| self.play_track(index, offset, now))
    }

    /// Share of the whole disc already played, in `[0, 1]`.
    #[must_use]
    pub fn disc_progress(&self, now: Instant) -> f64 {
        let Some(loaded) = &self.disc else {
            return 0.0;
        };
        let disc = loaded.disc();
        let total = disc.total_duration();
        if total.is_zero() {
            return 0.0;
        }
        let before: Duration = disc.tracks.iter().take(self.track_index).map(Track::duration).sum();
        ((before + self.elapsed(now)).as_secs_f64() / total.as_secs_f64()).min(1.0)
    }

    /// Advance one frame: finish a pending load, spin the platter and ease
    /// the tone-arm.
    ///
    /// Returns `true` on the frame an eased load completes.
    pub fn update(&mut self, now: Instant) -> bool {
        let mut became_ready = false;
        if self.phase == PlaybackPhase::Loading && self.ready_at.is_some_and(|at| now >= at) {
            self.ready_at = None;
            self.phase = PlaybackPhase::Ready;
            self.play_track(0, Duration::ZERO, now);
            became_ready = true;
        }

        if self.phase == PlaybackPhase::Playing {
            self.rotation -= self.config.rotation_speed;
            let progress = self.disc_progress(now);
            self.arm_target = (self.config.arm_end - self.config.arm_start)
                .mul_add(progress, self.config.arm_start);
        }
        self.arm_angle += (self.arm_target - self.arm_angle) * self.config.arm_damping;
        became_ready
    }
}
