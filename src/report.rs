use crate::model::{DisplayLimits, RankedSong, SkippedRecords};
use crate::stats::{Rankings, TOP_POSITIONS_CONSIDERED};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Applies the "0 means everything" rule and caps a limit at what exists.
pub fn clamp_limit(requested: usize, available: usize, what: &str) -> Option<usize> {
    if requested == 0 {
        return None;
    }
    if requested > available {
        log::warn!("{what} limit exceeds total {what}s. Setting to maximum ({available})");
        return Some(available);
    }
    Some(requested)
}

pub fn resolve_limits(songs: usize, artists: usize, rankings: &Rankings) -> DisplayLimits {
    DisplayLimits {
        songs: clamp_limit(songs, rankings.songs.len(), "song"),
        artists: clamp_limit(artists, rankings.artist_count(), "artist"),
    }
}

pub fn write_report<W: Write>(
    out: &mut W,
    rankings: &Rankings,
    limits: DisplayLimits,
) -> io::Result<()> {
    write_song_ranking(out, &rankings.songs, limits.songs)?;
    write_artist_rankings(out, rankings, limits.artists)?;
    write_yearly_totals(out, &rankings.yearly_hours)?;
    write_skipped(out, rankings.skipped)?;
    Ok(())
}

pub fn write_song_ranking<W: Write>(
    out: &mut W,
    songs: &[RankedSong],
    limit: Option<usize>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Top {} Songs by Total Listen Time (in minutes):",
        limit_label(limit)
    )?;
    for (index, song) in songs.iter().take(display_count(limit)).enumerate() {
        writeln!(
            out,
            "{}. {} - {}: {:.2} minutes",
            index + 1,
            song.track,
            song.artist,
            song.minutes
        )?;
    }
    Ok(())
}

pub fn write_artist_rankings<W: Write>(
    out: &mut W,
    rankings: &Rankings,
    limit: Option<usize>,
) -> io::Result<()> {
    let label = limit_label(limit);

    writeln!(out)?;
    writeln!(out, "Top {label} Artists by Total Listen Time:")?;
    for (index, stat) in rankings
        .artists_by_time
        .iter()
        .take(display_count(limit))
        .enumerate()
    {
        writeln!(
            out,
            "{}. {}: {:.2} hours ({:.2} minutes)",
            index + 1,
            stat.artist,
            stat.total_hours(),
            stat.total_minutes
        )?;
        writeln!(
            out,
            "   Average position of top {} songs: {:.1} (out of {} total songs)",
            stat.top_considered_count, stat.average_position, stat.song_count
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Top {label} Artists by Average Song Position (of their top {TOP_POSITIONS_CONSIDERED} songs):"
    )?;
    for (index, stat) in rankings
        .artists_by_position
        .iter()
        .take(display_count(limit))
        .enumerate()
    {
        writeln!(
            out,
            "{}. {}: Average position {:.1} (top {} of {} songs)   Total listening time: {:.2} hours",
            index + 1,
            stat.artist,
            stat.average_position,
            stat.top_considered_count,
            stat.song_count,
            stat.total_hours()
        )?;
    }
    Ok(())
}

pub fn write_yearly_totals<W: Write>(out: &mut W, yearly: &BTreeMap<i32, f64>) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Yearly Listening Statistics:")?;
    for (year, hours) in yearly {
        writeln!(out, "{year}: {hours:.2} hours")?;
    }
    Ok(())
}

fn write_skipped<W: Write>(out: &mut W, skipped: SkippedRecords) -> io::Result<()> {
    if skipped.total() == 0 {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(
        out,
        "Skipped records: {} malformed, {} incomplete",
        skipped.malformed, skipped.incomplete
    )
}

fn limit_label(limit: Option<usize>) -> String {
    match limit {
        Some(limit) => limit.to_string(),
        None => String::from("All"),
    }
}

fn display_count(limit: Option<usize>) -> usize {
    limit.unwrap_or(usize::MAX)
}
