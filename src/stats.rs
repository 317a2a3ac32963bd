use crate::history::parse_timestamp;
use crate::model::{
    ArtistStat, ListeningEvent, MS_PER_HOUR, RankedSong, SkippedRecords, TrackKey,
    Window,
};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub const TOP_POSITIONS_CONSIDERED: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    songs: Vec<(TrackKey, u64)>,
    song_index: HashMap<TrackKey, usize>,
    yearly_ms: BTreeMap<i32, u64>,
    pub skipped: SkippedRecords,
}

impl Aggregation {
    pub fn add_song(&mut self, key: TrackKey, played_ms: u64) {
        match self.song_index.get(&key) {
            Some(&index) => {
                let total = &mut self.songs[index].1;
                *total = total.saturating_add(played_ms);
            }
            None => {
                self.song_index.insert(key.clone(), self.songs.len());
                self.songs.push((key, played_ms));
            }
        }
    }

    pub fn add_year(&mut self, year: i32, played_ms: u64) {
        let total = self.yearly_ms.entry(year).or_default();
        *total = total.saturating_add(played_ms);
    }

    pub fn song_ms(&self, key: &TrackKey) -> Option<u64> {
        self.song_index.get(key).map(|&index| self.songs[index].1)
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }

    pub fn year_ms(&self, year: i32) -> Option<u64> {
        self.yearly_ms.get(&year).copied()
    }

    pub fn yearly_hours(&self) -> BTreeMap<i32, f64> {
        self.yearly_ms
            .iter()
            .map(|(&year, &ms)| (year, ms as f64 / MS_PER_HOUR))
            .collect()
    }

    /// Songs sorted by listened time, longest first. Ties keep the order in
    /// which the songs were first seen.
    pub fn ranked_songs(&self) -> Vec<RankedSong> {
        let mut ranked: Vec<RankedSong> = self
            .songs
            .iter()
            .map(|(key, ms)| RankedSong::new(key.clone(), *ms))
            .collect();
        ranked.sort_by(|a, b| b.played_ms.cmp(&a.played_ms));
        ranked
    }
}

pub fn aggregate(records: &[Value], window: &Window) -> Aggregation {
    let mut aggregation = Aggregation::default();
    for (index, record) in records.iter().enumerate() {
        let event = match ListeningEvent::deserialize(record) {
            Ok(event) => event,
            Err(err) => {
                log::warn!("skipping record {index}: {err}");
                aggregation.skipped.malformed += 1;
                continue;
            }
        };
        let (Some(raw_ts), Some(played_ms)) = (event.ts.as_deref(), event.ms_played) else {
            log::debug!("skipping record {index}: missing timestamp or duration");
            aggregation.skipped.incomplete += 1;
            continue;
        };
        let played_at = match parse_timestamp(raw_ts) {
            Ok(played_at) => played_at,
            Err(err) => {
                log::warn!("skipping record {index}: {err:#}");
                aggregation.skipped.malformed += 1;
                continue;
            }
        };
        if !window.contains(played_at) {
            continue;
        }

        aggregation.add_year(played_at.year(), played_ms);
        if let Some(key) = event.track_key() {
            aggregation.add_song(key, played_ms);
        }
    }
    aggregation
}

/// Groups ranked songs by artist, in order of each artist's best placed song.
pub fn artist_stats(ranked: &[RankedSong]) -> Vec<ArtistStat> {
    struct Accumulator<'a> {
        artist: &'a str,
        total_ms: u64,
        total_minutes: f64,
        positions: Vec<usize>,
    }

    let mut lookup: HashMap<&str, usize> = HashMap::new();
    let mut artists: Vec<Accumulator<'_>> = Vec::new();
    for (offset, song) in ranked.iter().enumerate() {
        let index = *lookup.entry(song.artist.as_str()).or_insert_with(|| {
            artists.push(Accumulator {
                artist: &song.artist,
                total_ms: 0,
                total_minutes: 0.0,
                positions: Vec::new(),
            });
            artists.len() - 1
        });
        let entry = &mut artists[index];
        entry.total_ms = entry.total_ms.saturating_add(song.played_ms);
        entry.total_minutes += song.minutes;
        entry.positions.push(offset + 1);
    }

    artists
        .into_iter()
        .map(|mut entry| {
            entry.positions.sort_unstable();
            let song_count = entry.positions.len();
            let top_considered_count = song_count.min(TOP_POSITIONS_CONSIDERED);
            let top_sum: usize = entry.positions[..top_considered_count].iter().sum();
            ArtistStat {
                artist: entry.artist.to_string(),
                total_ms: entry.total_ms,
                total_minutes: entry.total_minutes,
                average_position: top_sum as f64 / top_considered_count as f64,
                song_count,
                top_considered_count,
            }
        })
        .collect()
}

pub fn artists_by_time(stats: &[ArtistStat]) -> Vec<ArtistStat> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.total_ms.cmp(&a.total_ms));
    sorted
}

pub fn artists_by_position(stats: &[ArtistStat]) -> Vec<ArtistStat> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| compare_positions(a, b));
    sorted
}

fn compare_positions(a: &ArtistStat, b: &ArtistStat) -> Ordering {
    a.average_position.total_cmp(&b.average_position)
}

#[derive(Debug, Clone, Default)]
pub struct Rankings {
    pub songs: Vec<RankedSong>,
    pub artists_by_time: Vec<ArtistStat>,
    pub artists_by_position: Vec<ArtistStat>,
    pub yearly_hours: BTreeMap<i32, f64>,
    pub skipped: SkippedRecords,
}

impl Rankings {
    pub fn from_aggregation(aggregation: &Aggregation) -> Self {
        let songs = aggregation.ranked_songs();
        let stats = artist_stats(&songs);
        Self {
            artists_by_time: artists_by_time(&stats),
            artists_by_position: artists_by_position(&stats),
            songs,
            yearly_hours: aggregation.yearly_hours(),
            skipped: aggregation.skipped,
        }
    }

    pub fn artist_count(&self) -> usize {
        self.artists_by_time.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn play(ts: &str, track: &str, artist: &str, ms: u64) -> Value {
        json!({
            "ts": ts,
            "ms_played": ms,
            "master_metadata_track_name": track,
            "master_metadata_album_artist_name": artist,
        })
    }

    fn wide_window() -> Window {
        Window {
            from: datetime!(2000-01-01 00:00:00 UTC),
            to: datetime!(2099-12-31 23:59:59 UTC),
        }
    }

    fn song(track: &str, artist: &str, ms: u64) -> RankedSong {
        RankedSong::new(TrackKey::new(track, artist), ms)
    }

    #[test]
    fn worked_example_totals_and_ranking() {
        let records = vec![
            play("2023-01-01T10:00:00Z", "A", "X", 120_000),
            play("2023-01-01T11:00:00Z", "B", "X", 60_000),
            play("2023-06-01T00:00:00Z", "A", "X", 180_000),
        ];
        let aggregation = aggregate(&records, &wide_window());

        assert_eq!(aggregation.song_ms(&TrackKey::new("A", "X")), Some(300_000));
        assert_eq!(aggregation.song_ms(&TrackKey::new("B", "X")), Some(60_000));

        let ranked = aggregation.ranked_songs();
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].track.as_str(), ranked[0].minutes), ("A", 5.0));
        assert_eq!((ranked[1].track.as_str(), ranked[1].minutes), ("B", 1.0));

        let yearly = aggregation.yearly_hours();
        assert_eq!(yearly.len(), 1);
        assert!((yearly[&2023] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn unnamed_plays_count_toward_the_year_only() {
        let records = vec![
            play("2022-05-01T10:00:00Z", "A", "X", 60_000),
            json!({
                "ts": "2022-05-01T11:00:00Z",
                "ms_played": 30_000,
                "master_metadata_track_name": null,
                "master_metadata_album_artist_name": null,
                "episode_name": "Some podcast"
            }),
            json!({"ts": "2022-05-01T12:00:00Z", "ms_played": 10_000}),
        ];
        let aggregation = aggregate(&records, &wide_window());

        assert_eq!(aggregation.song_count(), 1);
        assert_eq!(aggregation.year_ms(2022), Some(100_000));
        assert_eq!(aggregation.skipped, SkippedRecords::default());
    }

    #[test]
    fn bad_records_are_counted_and_skipped() {
        let records = vec![
            play("2023-01-01T10:00:00Z", "A", "X", 60_000),
            json!({"ts": "2023-01-01T11:00:00Z", "ms_played": "a lot"}),
            json!("not an object"),
            json!({"ts": "01/01/2023", "ms_played": 5}),
            json!({"ms_played": 5, "master_metadata_track_name": "B"}),
            json!({"ts": "2023-01-01T12:00:00Z"}),
            json!({"ts": "2023-01-01T13:00:00Z", "ms_played": -5}),
        ];
        let aggregation = aggregate(&records, &wide_window());

        assert_eq!(aggregation.song_count(), 1);
        assert_eq!(aggregation.year_ms(2023), Some(60_000));
        assert_eq!(aggregation.skipped.malformed, 4);
        assert_eq!(aggregation.skipped.incomplete, 2);
    }

    #[test]
    fn window_filters_songs_and_years_alike() {
        let records = vec![
            play("2022-12-31T23:59:59Z", "Old", "X", 60_000),
            play("2023-01-31T23:59:59Z", "Edge", "X", 60_000),
            play("2023-02-01T00:00:00Z", "Late", "X", 60_000),
        ];
        let window = Window {
            from: datetime!(2023-01-01 00:00:00 UTC),
            to: datetime!(2023-01-31 23:59:59 UTC),
        };
        let aggregation = aggregate(&records, &window);

        assert_eq!(aggregation.song_count(), 1);
        assert!(aggregation.song_ms(&TrackKey::new("Edge", "X")).is_some());
        assert_eq!(aggregation.year_ms(2022), None);
        assert_eq!(aggregation.year_ms(2023), Some(60_000));
    }

    #[test]
    fn zero_duration_plays_still_create_a_key() {
        let records = vec![play("2023-01-01T10:00:00Z", "Skip", "X", 0)];
        let ranked = aggregate(&records, &wide_window()).ranked_songs();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].minutes, 0.0);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let records = vec![
            play("2023-01-01T10:00:00Z", "First", "X", 60_000),
            play("2023-01-01T11:00:00Z", "Second", "Y", 60_000),
            play("2023-01-01T12:00:00Z", "Top", "Z", 90_000),
        ];
        let ranked = aggregate(&records, &wide_window()).ranked_songs();
        let order: Vec<&str> = ranked.iter().map(|song| song.track.as_str()).collect();

        assert_eq!(order, vec!["Top", "First", "Second"]);
    }

    #[test]
    fn same_title_by_different_artists_are_different_songs() {
        let records = vec![
            play("2023-01-01T10:00:00Z", "Intro", "X", 60_000),
            play("2023-01-01T11:00:00Z", "Intro", "Y", 60_000),
        ];
        assert_eq!(aggregate(&records, &wide_window()).song_count(), 2);
    }

    #[test]
    fn artist_average_uses_best_five_positions() {
        // X holds positions 1, 3, 4, 5, 6 and 8; Y holds 2 and 7.
        let ranked = vec![
            song("s1", "X", 800),
            song("s2", "Y", 700),
            song("s3", "X", 600),
            song("s4", "X", 500),
            song("s5", "X", 400),
            song("s6", "X", 300),
            song("s7", "Y", 200),
            song("s8", "X", 100),
        ];
        let stats = artist_stats(&ranked);

        let x = &stats[0];
        assert_eq!(x.artist, "X");
        assert_eq!(x.song_count, 6);
        assert_eq!(x.top_considered_count, 5);
        assert_eq!(x.average_position, (1 + 3 + 4 + 5 + 6) as f64 / 5.0);
        assert_eq!(x.total_ms, 2_700);

        let y = &stats[1];
        assert_eq!(y.song_count, 2);
        assert_eq!(y.top_considered_count, 2);
        assert_eq!(y.average_position, 4.5);
    }

    #[test]
    fn artist_views_sort_independently() {
        let ranked = vec![
            song("hit", "OneHit", 10_000),
            song("a", "Steady", 9_000),
            song("b", "Steady", 8_000),
            song("c", "Steady", 7_000),
        ];
        let stats = artist_stats(&ranked);

        let time_sorted = artists_by_time(&stats);
        let by_time: Vec<&str> = time_sorted
            .iter()
            .map(|stat| stat.artist.as_str())
            .collect();
        let position_sorted = artists_by_position(&stats);
        let by_position: Vec<&str> = position_sorted
            .iter()
            .map(|stat| stat.artist.as_str())
            .collect();

        assert_eq!(by_time, vec!["Steady", "OneHit"]);
        assert_eq!(by_position, vec!["OneHit", "Steady"]);
    }

    #[test]
    fn rankings_bundle_every_view() {
        let records = vec![
            play("2023-01-01T10:00:00Z", "A", "X", 120_000),
            play("2024-01-01T11:00:00Z", "B", "Y", 60_000),
            json!({"ts": "broken", "ms_played": 1}),
        ];
        let rankings = Rankings::from_aggregation(&aggregate(&records, &wide_window()));

        assert_eq!(rankings.songs.len(), 2);
        assert_eq!(rankings.artist_count(), 2);
        assert_eq!(rankings.yearly_hours.keys().copied().collect::<Vec<_>>(), vec![2023, 2024]);
        assert_eq!(rankings.skipped.malformed, 1);
        assert_eq!(rankings.songs.iter().map(|song| song.minutes).sum::<f64>(), 3.0);
    }

    proptest::proptest! {
        #[test]
        fn ranking_invariants_hold(plays in proptest::collection::vec((0u8..12, 0u8..4, 0u64..600_000), 1..120)) {
            let records: Vec<Value> = plays
                .iter()
                .map(|(track, artist, ms)| {
                    play("2023-03-01T12:00:00Z", &format!("t{track}"), &format!("a{artist}"), *ms)
                })
                .collect();
            let rankings = Rankings::from_aggregation(&aggregate(&records, &wide_window()));

            proptest::prop_assert!(rankings.songs.windows(2).all(|pair| pair[0].minutes >= pair[1].minutes));

            let song_minutes: f64 = rankings.songs.iter().map(|song| song.minutes).sum();
            let artist_minutes: f64 = rankings.artists_by_time.iter().map(|stat| stat.total_minutes).sum();
            proptest::prop_assert!((song_minutes - artist_minutes).abs() < 1e-6);

            let song_ms: u64 = rankings.songs.iter().map(|song| song.played_ms).sum();
            let artist_ms: u64 = rankings.artists_by_time.iter().map(|stat| stat.total_ms).sum();
            proptest::prop_assert_eq!(song_ms, artist_ms);

            for stat in &rankings.artists_by_position {
                proptest::prop_assert!(stat.top_considered_count <= TOP_POSITIONS_CONSIDERED);
                proptest::prop_assert!(stat.top_considered_count <= stat.song_count);
                if stat.song_count == 1 {
                    let position = rankings
                        .songs
                        .iter()
                        .position(|song| song.artist == stat.artist)
                        .map(|index| index + 1);
                    proptest::prop_assert_eq!(Some(stat.average_position), position.map(|p| p as f64));
                }
            }
            proptest::prop_assert!(rankings
                .artists_by_position
                .windows(2)
                .all(|pair| pair[0].average_position <= pair[1].average_position));
        }
    }
}
