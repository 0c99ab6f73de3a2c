use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use mid2tja::midi::reclocked_path;
use mid2tja::{convert, load_midi, reclock, ChartError, ChartOptions, GapFraction, NoteSymbol};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Byte order mark expected by chart players.
const UTF8_BOM: &str = "\u{feff}";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a MIDI file to a TJA chart
    Convert(ConvertArgs),
    /// Rescale a MIDI file's ticks per beat and tempo
    Reclock(ReclockArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input MIDI file
    input: PathBuf,

    /// Note symbol written for every note (0 for timing only)
    note: Option<NoteSymbol>,

    /// Minimum long-note length and gap as a fraction of a whole note, e.g. 1/192 or 0.005
    #[arg(short = 'g', long)]
    long_gap: Option<GapFraction>,

    /// YAML options file (title, note, long-gap)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chart title (defaults to the input path)
    #[arg(short, long)]
    title: Option<String>,

    /// Output path (defaults to <input>.tja)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReclockArgs {
    /// Input MIDI file
    input: PathBuf,

    /// New ticks per beat
    ticks_per_beat: u16,

    /// Tempo multiplier
    rate: f64,

    /// Output path (defaults to <input>.<tpb>tpb-<rate>xbpm.mid)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Reclock(args) => run_reclock(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run_convert(args: ConvertArgs) -> Result<(), ChartError> {
    let mut options = match &args.config {
        Some(path) => ChartOptions::from_yaml(&read_text(path)?)?,
        None => ChartOptions::default(),
    };
    if let Some(note) = args.note {
        options.note = note;
    }
    if let Some(gap) = args.long_gap {
        options.long_gap = gap;
    }
    if args.title.is_some() {
        options.title = args.title;
    }
    if options.title.is_none() {
        options.title = Some(args.input.display().to_string());
    }

    log::info!("reading {}", args.input.display());
    let song = load_midi(&args.input)?;
    log::info!(
        "{} track(s) at {} ticks per beat",
        song.tracks.len(),
        song.ticks_per_beat
    );

    let tja = convert(&song, &options)?;

    let output = args
        .output
        .unwrap_or_else(|| with_suffix(&args.input, ".tja"));
    write_file(&output, format!("{}{}", UTF8_BOM, tja).as_bytes())?;
    log::info!("wrote {}", output.display());

    Ok(())
}

fn run_reclock(args: ReclockArgs) -> Result<(), ChartError> {
    let bytes = fs::read(&args.input).map_err(|e| {
        ChartError::IoError(format!("cannot read '{}': {}", args.input.display(), e))
    })?;
    let reclocked = reclock(&bytes, args.ticks_per_beat, args.rate)?;

    let output = args
        .output
        .unwrap_or_else(|| reclocked_path(&args.input, args.ticks_per_beat, args.rate));
    write_file(&output, &reclocked)?;
    log::info!("wrote {}", output.display());

    Ok(())
}

fn read_text(path: &Path) -> Result<String, ChartError> {
    fs::read_to_string(path)
        .map_err(|e| ChartError::IoError(format!("cannot read '{}': {}", path.display(), e)))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ChartError> {
    fs::write(path, contents)
        .map_err(|e| ChartError::IoError(format!("cannot write '{}': {}", path.display(), e)))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
