//! Events the state machine publishes for the renderer and page chrome.

use crate::model::Album;
use crate::navigation::ViewState;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Buffered events per subscriber before it starts lagging.
pub const SCENE_CHANNEL_CAPACITY: usize = 64;

/// Which of the four view buttons are clickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub overview: bool,
    pub browse: bool,
    pub inspect: bool,
    pub player: bool,
}

impl Affordances {
    #[must_use]
    pub const fn allows(&self, view: ViewState) -> bool {
        match view {
            ViewState::Overview => self.overview,
            ViewState::Browse => self.browse,
            ViewState::Inspect => self.inspect,
            ViewState::Player => self.player,
        }
    }
}

/// Page chrome shown alongside each view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    pub transport: bool,
    pub crate_nav: bool,
    pub filter_bar: bool,
}

impl Chrome {
    #[must_use]
    pub const fn for_view(view: ViewState) -> Self {
        Self {
            transport: matches!(view, ViewState::Player),
            crate_nav: matches!(view, ViewState::Browse),
            filter_bar: matches!(view, ViewState::Overview | ViewState::Browse),
        }
    }
}

/// What the user clicked, resolved once from the hit object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pick {
    /// A crate in the overview
    Crate(usize),
    /// An album slot in the active crate
    Album(usize),
    /// A divider card in the active crate
    Separator(usize),
    /// A disc of the inspected album
    DiscItem(usize),
    /// The record on the platter, at this distance from the spindle
    VinylSurface { radius: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    ViewChanged {
        view: ViewState,
        chrome: Chrome,
    },
    AffordancesChanged(Affordances),
    /// Crate labels for the overview, in order
    OverviewRebuilt {
        labels: Vec<String>,
    },
    BrowseRebuilt {
        crate_index: usize,
        label: String,
        item_count: usize,
    },
    InspectRebuilt {
        album: Arc<Album>,
    },
    DiscLoading {
        disc_number: u32,
        instant: bool,
    },
    AccentChanged(String),
    TitleChanged(String),
    Status(String),
    /// Now-playing transport line
    Transport {
        playing: bool,
        title: Option<String>,
        artist: Option<String>,
    },
    LibraryRebuilt {
        crate_count: usize,
    },
}

/// Fan-out of [`SceneEvent`]s. Sending never blocks; with no subscribers the
/// event is dropped.
#[derive(Debug, Clone)]
pub struct SceneBus {
    tx: broadcast::Sender<SceneEvent>,
}

impl Default for SceneBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SCENE_CHANNEL_CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SceneEvent) {
        let _ = self.tx.send(event);
    }
}
