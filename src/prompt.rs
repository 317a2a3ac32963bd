use crate::history::parse_date;
use crate::model::DatasetRange;
use crate::range::{Resolution, resolve_window};
use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use time::Date;

/// Invalid answers are re-asked until a valid one arrives or the input ends.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read answer")?;
        if read == 0 {
            bail!("input closed while waiting for an answer to {question:?}");
        }
        Ok(line.trim().to_string())
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    pub fn ask_date_bounds(&mut self) -> Result<(Option<Date>, Option<Date>)> {
        self.say("")?;
        self.say("Enter dates in format YYYY-MM-DD")?;
        loop {
            let from = self.ask("From date (or press Enter for earliest)")?;
            let to = self.ask("To date (or press Enter for latest)")?;
            match (optional_date(&from), optional_date(&to)) {
                (Ok(from), Ok(to)) => return Ok((from, to)),
                _ => self.say("Invalid date format. Please use YYYY-MM-DD format.")?,
            }
        }
    }

    pub fn ask_window(&mut self, range: &DatasetRange) -> Result<Resolution> {
        loop {
            let (from, to) = self.ask_date_bounds()?;
            match resolve_window(range, from, to) {
                Ok(resolution) => return Ok(resolution),
                Err(err) => self.say(&format!("{err:#}. Please choose another range."))?,
            }
        }
    }

    /// Returns the raw song and artist limits, 0 meaning "show all".
    pub fn ask_limits(&mut self, total_songs: usize, total_artists: usize) -> Result<(usize, usize)> {
        loop {
            self.say("")?;
            self.say("Enter display limits (0 for all):")?;
            let songs = self.ask(&format!("Number of songs to display (0-{total_songs})"))?;
            let artists = self.ask(&format!("Number of artists to display (0-{total_artists})"))?;

            let (Ok(songs), Ok(artists)) = (songs.parse::<i64>(), artists.parse::<i64>()) else {
                self.say("Please enter valid numbers.")?;
                continue;
            };
            if songs < 0 || artists < 0 {
                self.say("Please enter non-negative numbers.")?;
                continue;
            }
            return Ok((
                usize::try_from(songs).unwrap_or(usize::MAX),
                usize::try_from(artists).unwrap_or(usize::MAX),
            ));
        }
    }
}

fn optional_date(raw: &str) -> Result<Option<Date>> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_date(raw).map(Some)
}
