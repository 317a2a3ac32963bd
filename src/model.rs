use serde::Deserialize;
use time::{Date, OffsetDateTime};

pub const MS_PER_MINUTE: f64 = 60_000.0;
pub const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct ListeningEvent {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub ms_played: Option<u64>,
    #[serde(default, rename = "master_metadata_track_name")]
    pub track_name: Option<String>,
    #[serde(default, rename = "master_metadata_album_artist_name")]
    pub artist_name: Option<String>,
}

impl ListeningEvent {
    /// Song identity for ranking, present only when both names are non-empty.
    pub fn track_key(&self) -> Option<TrackKey> {
        let track = self.track_name.as_deref().filter(|name| !name.is_empty())?;
        let artist = self.artist_name.as_deref().filter(|name| !name.is_empty())?;
        Some(TrackKey::new(track, artist))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey {
    pub track: String,
    pub artist: String,
}

impl TrackKey {
    pub fn new(track: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            artist: artist.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedSong {
    pub track: String,
    pub artist: String,
    pub played_ms: u64,
    pub minutes: f64,
}

impl RankedSong {
    pub fn new(key: TrackKey, played_ms: u64) -> Self {
        Self {
            track: key.track,
            artist: key.artist,
            played_ms,
            minutes: played_ms as f64 / MS_PER_MINUTE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistStat {
    pub artist: String,
    pub total_ms: u64,
    pub total_minutes: f64,
    pub average_position: f64,
    pub song_count: usize,
    pub top_considered_count: usize,
}

impl ArtistStat {
    pub fn total_hours(&self) -> f64 {
        self.total_minutes / 60.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetRange {
    pub earliest: OffsetDateTime,
    pub latest: OffsetDateTime,
}

impl DatasetRange {
    pub fn full_window(&self) -> Window {
        Window {
            from: self.earliest,
            to: self.latest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

impl Window {
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        instant >= self.from && instant <= self.to
    }

    pub fn from_date(&self) -> Date {
        self.from.date()
    }

    pub fn to_date(&self) -> Date {
        self.to.date()
    }
}

/// How many entries each ranking prints. `None` means every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayLimits {
    pub songs: Option<usize>,
    pub artists: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkippedRecords {
    /// Records that could not be decoded or carried an unparseable timestamp.
    pub malformed: usize,
    /// Records missing a timestamp or a played duration.
    pub incomplete: usize,
}

impl SkippedRecords {
    pub fn total(&self) -> usize {
        self.malformed + self.incomplete
    }
}
