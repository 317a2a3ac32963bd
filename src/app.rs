use crate::history::load_history;
use crate::prompt::Console;
use crate::range::{Resolution, dataset_range, resolve_window};
use crate::report::{resolve_limits, write_report};
use crate::stats::{Rankings, aggregate};
use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use time::Date;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub files: Vec<PathBuf>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub song_limit: Option<usize>,
    pub artist_limit: Option<usize>,
    pub batch: bool,
}

impl RunOptions {
    fn dates_given(&self) -> bool {
        self.batch || self.from.is_some() || self.to.is_some()
    }

    fn limits_given(&self) -> bool {
        self.batch || self.song_limit.is_some() || self.artist_limit.is_some()
    }
}

pub fn run(options: RunOptions) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with_io(options, stdin.lock(), stdout.lock())
}

pub fn run_with_io<R: BufRead, W: Write>(options: RunOptions, input: R, mut output: W) -> Result<()> {
    if options.files.is_empty() {
        bail!("no input files given");
    }

    let loaded = load_history(&options.files);
    if !loaded.failures.is_empty() {
        log::warn!(
            "{} of {} files could not be loaded",
            loaded.failures.len(),
            options.files.len()
        );
    }
    let range = dataset_range(&loaded.records)?;

    let mut console = Console::new(input, &mut output);
    console.say("")?;
    console.say(&format!(
        "Dataset range: {} to {}",
        range.earliest.date(),
        range.latest.date()
    ))?;

    let resolution = if options.dates_given() {
        resolve_window(&range, options.from, options.to)?
    } else {
        console.ask_window(&range)?
    };
    log_substitutions(&resolution);
    console.say("")?;
    console.say(&format!(
        "Analyzing data from {} to {}",
        resolution.window.from_date(),
        resolution.window.to_date()
    ))?;

    let aggregation = aggregate(&loaded.records, &resolution.window);
    log::debug!(
        "aggregated {} songs, skipped {} records",
        aggregation.song_count(),
        aggregation.skipped.total()
    );
    let rankings = Rankings::from_aggregation(&aggregation);

    let (songs, artists) = if options.limits_given() {
        (
            options.song_limit.unwrap_or(0),
            options.artist_limit.unwrap_or(0),
        )
    } else {
        console.ask_limits(rankings.songs.len(), rankings.artist_count())?
    };
    let limits = resolve_limits(songs, artists, &rankings);
    drop(console);

    write_report(&mut output, &rankings, limits).context("failed to write report")?;
    output.flush()?;
    Ok(())
}

fn log_substitutions(resolution: &Resolution) {
    for substitution in &resolution.substitutions {
        log::info!("{substitution}");
    }
}
