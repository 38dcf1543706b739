//! Sorted, grouped and paginated view over the catalog.
//!
//! A [`LibraryView`] is rebuilt wholesale whenever the sort mode, order or
//! grouping changes. Building is a pure function of the catalog, the
//! [`LibrarySettings`] and the crate size.

use crate::model::Album;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Bucket key for values that do not start with an ASCII letter.
pub const OTHER_BUCKET: char = '#';

/// Label used for a flow-mode crate that holds only separators.
const FALLBACK_CRATE_LABEL: &str = "Collection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortMode {
    /// Catalog order, paginated; ignores order and grouping
    #[default]
    Raw,
    Artist,
    Album,
}

impl SortMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::Artist => "ARTIST",
            Self::Album => "ALBUM",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupingMode {
    /// Continuous run with separator cards between groups
    #[default]
    Flow,
    /// One or more crates per initial letter
    Bucket,
}

impl GroupingMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Flow => Self::Bucket,
            Self::Bucket => Self::Flow,
        }
    }
}

/// The user-selectable knobs that shape a [`LibraryView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySettings {
    pub sort: SortMode,
    pub ascending: bool,
    pub grouping: GroupingMode,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            sort: SortMode::Raw,
            ascending: true,
            grouping: GroupingMode::Flow,
        }
    }
}

/// One slot in a crate.
#[derive(Debug, Clone, PartialEq)]
pub enum CrateItem {
    Album(Arc<Album>),
    /// Label-only divider card; never selectable
    Separator { label: String },
}

impl CrateItem {
    #[must_use]
    pub fn as_album(&self) -> Option<&Arc<Album>> {
        match self {
            Self::Album(album) => Some(album),
            Self::Separator { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_separator(&self) -> bool {
        matches!(self, Self::Separator { .. })
    }
}

/// A page of the library, the unit shown in the browse view.
#[derive(Debug, Clone, PartialEq)]
pub struct Crate {
    pub label: String,
    pub items: Vec<CrateItem>,
}

impl Crate {
    /// Number of slots including separators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The album at a slot, or `None` for separators and out-of-range slots.
    #[must_use]
    pub fn album_at(&self, index: usize) -> Option<&Arc<Album>> {
        self.items.get(index).and_then(CrateItem::as_album)
    }

    /// Slot index of the album with this id.
    #[must_use]
    pub fn position_of(&self, album_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.as_album().is_some_and(|a| a.id == album_id))
    }

    pub fn albums(&self) -> impl Iterator<Item = &Arc<Album>> {
        self.items.iter().filter_map(CrateItem::as_album)
    }
}

/// Where an album sits in the current view.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumLocation {
    pub crate_index: usize,
    pub slot: usize,
    pub album: Arc<Album>,
}

/// Ordered crates derived from the catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LibraryView {
    settings: LibrarySettings,
    crates: Vec<Crate>,
}

impl LibraryView {
    /// Partition the catalog into crates of at most `crate_size` slots.
    ///
    /// A `crate_size` of zero is treated as one.
    #[must_use]
    pub fn build(catalog: &[Arc<Album>], settings: LibrarySettings, crate_size: usize) -> Self {
        let size = crate_size.max(1);
        let crates = match (settings.sort, settings.grouping) {
            (SortMode::Raw, _) => paginate_raw(catalog, size),
            (sort, GroupingMode::Bucket) => {
                let sorted = sorted_albums(catalog, sort, settings.ascending);
                paginate_buckets(sorted, sort, settings.ascending, size)
            }
            (sort, GroupingMode::Flow) => {
                let sorted = sorted_albums(catalog, sort, settings.ascending);
                paginate_flow(&sorted, sort, size)
            }
        };
        Self { settings, crates }
    }

    #[must_use]
    pub const fn settings(&self) -> LibrarySettings {
        self.settings
    }

    #[must_use]
    pub fn crates(&self) -> &[Crate] {
        &self.crates
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Crate> {
        self.crates.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.crates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crates.is_empty()
    }

    /// Clamp an index into `[0, len)`, or `None` when there are no crates.
    #[must_use]
    pub fn clamp_index(&self, index: usize) -> Option<usize> {
        if self.crates.is_empty() {
            None
        } else {
            Some(index.min(self.crates.len() - 1))
        }
    }

    /// Scan every crate for the album with this id.
    #[must_use]
    pub fn locate_album(&self, album_id: &str) -> Option<AlbumLocation> {
        self.crates.iter().enumerate().find_map(|(crate_index, c)| {
            c.position_of(album_id).and_then(|slot| {
                c.album_at(slot).map(|album| AlbumLocation {
                    crate_index,
                    slot,
                    album: Arc::clone(album),
                })
            })
        })
    }
}

fn paginate_raw(catalog: &[Arc<Album>], size: usize) -> Vec<Crate> {
    catalog
        .chunks(size)
        .enumerate()
        .map(|(page, chunk)| {
            let start = page * size;
            Crate {
                label: format!("{} - {}", start + 1, start + chunk.len()),
                items: chunk.iter().cloned().map(CrateItem::Album).collect(),
            }
        })
        .collect()
}

fn sorted_albums(catalog: &[Arc<Album>], sort: SortMode, ascending: bool) -> Vec<Arc<Album>> {
    let by_artist = sort == SortMode::Artist;
    let mut keyed: Vec<(String, Arc<Album>)> = catalog
        .iter()
        .map(|a| (a.sort_value(by_artist).to_uppercase(), Arc::clone(a)))
        .collect();
    // Stable: equal keys keep catalog order in both directions
    keyed.sort_by(|(a, _), (b, _)| if ascending { a.cmp(b) } else { b.cmp(a) });
    keyed.into_iter().map(|(_, album)| album).collect()
}

/// Initial-letter bucket of a sort value: `A`-`Z`, or [`OTHER_BUCKET`].
#[must_use]
pub fn bucket_key(value: &str) -> char {
    value
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .filter(char::is_ascii_uppercase)
        .unwrap_or(OTHER_BUCKET)
}

fn paginate_buckets(
    sorted: Vec<Arc<Album>>,
    sort: SortMode,
    ascending: bool,
    size: usize,
) -> Vec<Crate> {
    let by_artist = sort == SortMode::Artist;
    let mut buckets: BTreeMap<char, Vec<Arc<Album>>> = BTreeMap::new();
    for album in sorted {
        let key = bucket_key(album.sort_value(by_artist));
        buckets.entry(key).or_default().push(album);
    }

    let ordered: Vec<(char, Vec<Arc<Album>>)> = if ascending {
        buckets.into_iter().collect()
    } else {
        buckets.into_iter().rev().collect()
    };

    let mut crates = Vec::new();
    for (key, albums) in ordered {
        let split = albums.len() > size;
        for (page, chunk) in albums.chunks(size).enumerate() {
            let label = if split {
                format!("{key} ({})", page + 1)
            } else {
                key.to_string()
            };
            crates.push(Crate {
                label,
                items: chunk.iter().cloned().map(CrateItem::Album).collect(),
            });
        }
    }
    crates
}

fn paginate_flow(sorted: &[Arc<Album>], sort: SortMode, size: usize) -> Vec<Crate> {
    let by_artist = sort == SortMode::Artist;
    let mut run: Vec<CrateItem> = Vec::with_capacity(sorted.len());
    let mut last_group: Option<String> = None;

    for album in sorted {
        let (group, label) = if by_artist {
            (album.artist.to_uppercase(), album.artist.clone())
        } else {
            let key = bucket_key(&album.title).to_string();
            (key.clone(), key)
        };
        if last_group.as_ref() != Some(&group) {
            run.push(CrateItem::Separator { label });
            last_group = Some(group);
        }
        run.push(CrateItem::Album(Arc::clone(album)));
    }

    let mut crates = Vec::new();
    let mut page: Vec<CrateItem> = Vec::with_capacity(size);
    for item in run {
        page.push(item);
        if page.len() < size {
            continue;
        }
        // A trailing separator belongs with the album that follows it
        let carry = if page.len() > 1 && page.last().is_some_and(CrateItem::is_separator) {
            page.pop()
        } else {
            None
        };
        crates.push(flow_crate(std::mem::take(&mut page), by_artist));
        page.extend(carry);
    }
    if !page.is_empty() {
        crates.push(flow_crate(page, by_artist));
    }
    crates
}

fn flow_crate(items: Vec<CrateItem>, by_artist: bool) -> Crate {
    let first = items.iter().find_map(CrateItem::as_album);
    let last = items.iter().rev().find_map(CrateItem::as_album);
    let label = match (first, last) {
        (Some(first), Some(last)) => format!(
            "{} - {}",
            label_prefix(first.sort_value(by_artist)),
            label_prefix(last.sort_value(by_artist))
        ),
        _ => FALLBACK_CRATE_LABEL.to_string(),
    };
    Crate { label, items }
}

fn label_prefix(value: &str) -> String {
    value.chars().take(3).collect::<String>().to_uppercase()
}
