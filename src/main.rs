use clap::Parser;
use std::path::PathBuf;
use streamstats::app::{RunOptions, run};
use streamstats::config::resolve_input_files;
use streamstats::history::parse_date;
use time::Date;

/// Ranks songs, artists and years from streaming history exports
#[derive(Parser, Debug)]
#[command(name = "streamstats", version, long_about = None)]
struct Cli {
    /// History files to read, in order. Defaults to the export chunks in the data directory
    files: Vec<PathBuf>,

    /// Directory searched for Streaming_History_Audio_*.json files.
    /// Falls back to $STREAMSTATS_DATA_DIR, then the current directory
    #[arg(long)]
    dir: Option<PathBuf>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    from: Option<Date>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    to: Option<Date>,

    /// Number of songs to show, 0 for all
    #[arg(long)]
    songs: Option<usize>,

    /// Number of artists to show, 0 for all
    #[arg(long)]
    artists: Option<usize>,

    /// Do not prompt; use defaults for anything not given
    #[arg(long)]
    batch: bool,

    /// Show debug diagnostics
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let files = resolve_input_files(cli.files, cli.dir.as_deref())?;
    run(RunOptions {
        files,
        from: cli.from,
        to: cli.to,
        song_limit: cli.songs,
        artist_limit: cli.artists,
        batch: cli.batch,
    })
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn parse_date_arg(raw: &str) -> Result<Date, String> {
    parse_date(raw).map_err(|err| format!("{err:#}, expected YYYY-MM-DD"))
}
