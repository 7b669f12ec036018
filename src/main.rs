mod cue;
mod error;
mod layout;
mod media;
mod parser;
mod script;
mod serialiser;
mod session;
mod sync;
mod time;

use crate::media::{guess_content_type, MediaElement, SimulatedMedia};
use crate::parser::Parser;
use crate::script::Command;
use crate::serialiser::{Presenter, TerminalPresenter};
use crate::session::{KeyOutcome, Player};
use crate::time::format_timestamp;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};

use anyhow::{anyhow, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use log::{debug, warn};

fn main() {
    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Follow a subtitle track along with audio or video playback")]
struct Cli {
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Log more detail; repeat for even more."
    )]
    verbose: u8,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    #[command(about = "Parse a subtitle file and list its cues")]
    Parse {
        #[arg(
            value_name = "FILE",
            help = "The subtitle file to read. Use '-' to read from standard input."
        )]
        input: String,
        #[arg(long, help = "Print the cues as a renumbered SRT file instead of a list.")]
        srt: bool,
    },
    #[command(about = "List the cues that are active at a given position")]
    Active {
        #[arg(value_name = "FILE", help = "The subtitle file to read.")]
        input: String,
        #[arg(
            value_name = "TIME",
            help = "Position in seconds, or a timestamp such as 00:01:02,500."
        )]
        time: String,
    },
    #[command(about = "Run the player against a script of events")]
    Play {
        #[arg(short, long, value_name = "FILE", help = "The media file to load.")]
        media: Option<String>,
        #[arg(
            long,
            value_name = "TYPE",
            help = "Content type of the media file. Guessed from the extension if not supplied."
        )]
        media_type: Option<String>,
        #[arg(long, value_name = "SECS", help = "Length of the media file in seconds.")]
        duration: Option<f64>,
        #[arg(short, long, value_name = "FILE", help = "The subtitle file to load.")]
        subtitles: Option<String>,
        #[arg(
            long,
            value_name = "FILE",
            help = "The event script to run. If not supplied, events are read from standard input.",
            default_value = "-"
        )]
        script: String,
        #[arg(
            long,
            value_name = "SECS",
            help = "Interval between position updates while playing.",
            default_value_t = 0.25
        )]
        tick: f64,
    },
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    match cli.command {
        CliCommand::Parse { input, srt } => parse(&input, srt),
        CliCommand::Active { input, time } => active(&input, &time),
        CliCommand::Play {
            media,
            media_type,
            duration,
            subtitles,
            script,
            tick,
        } => {
            if !(tick > 0.0) || !tick.is_finite() {
                return Err(anyhow!("The tick interval must be a positive number of seconds."));
            }
            let opts = PlayOpts { duration, tick };
            play(media, media_type, subtitles, &script, opts)
        }
    }
}

fn setup_logger(level: u8) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    let log_level = match level {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    builder.filter_level(log_level);
    builder.format_timestamp_millis();
    builder.init();
}

fn read_input(path: &str) -> Result<String> {
    let mut bytes = Vec::new();
    if path == "-" {
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read from stdin")?;
    } else {
        bytes = std::fs::read(path).context(format!("Failed to open input file: '{}'", path))?;
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse(input: &str, srt: bool) -> Result<()> {
    let data = read_input(input)?;
    let parsed = Parser::new()?.parse_subtitles(&data);
    for issue in &parsed.issues {
        eprintln!("warning: {}", issue);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if srt {
        serialiser::write_srt(&mut out, &parsed.cues)?;
    } else {
        writeln!(
            out,
            "{:?} subtitles, {} cues, {} skipped",
            parsed.format,
            parsed.cues.len(),
            parsed.skipped()
        )?;
        let entries: Vec<_> = sync::cue_entries(&parsed.cues).collect();
        serialiser::write_entries(&mut out, &entries)?;
    }
    Ok(())
}

fn active(input: &str, time: &str) -> Result<()> {
    let position = script::parse_position(time)?;
    let data = read_input(input)?;
    let parsed = Parser::new()?.parse_subtitles(&data);

    let active = sync::active_at(&parsed.cues, position);
    debug!("{} of {} cues active at {}", active.len(), parsed.cues.len(), position);
    for index in active {
        let cue = &parsed.cues[index];
        println!(
            "[{}] {} - {}  {}",
            index,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text.lines().collect::<Vec<_>>().join(" / ")
        );
    }
    Ok(())
}

struct PlayOpts {
    duration: Option<f64>,
    tick: f64,
}

fn play(
    media: Option<String>,
    media_type: Option<String>,
    subtitles: Option<String>,
    script_path: &str,
    opts: PlayOpts,
) -> Result<()> {
    let mut player = Player::new(TerminalPresenter::new(io::stdout()))?;

    if let Some(path) = media {
        load_media(&mut player, &path, media_type.as_deref(), opts.duration)?;
    }
    if let Some(path) = subtitles {
        load_subtitles(&mut player, &path)?;
    }

    let events: Box<dyn BufRead> = if script_path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(script_path)
            .context(format!("Failed to open script: '{}'", script_path))?;
        Box::new(BufReader::new(file))
    };

    for (idx, line) in events.lines().enumerate() {
        let line = line.context("Failed to read the event script")?;
        let result = script::parse_command(&line)
            .and_then(|command| match command {
                Some(command) => execute(&mut player, command, &opts),
                None => Ok(()),
            });
        if let Err(err) = result {
            warn!("Line {}: {:#}", idx + 1, err);
            eprintln!("line {}: {:#}", idx + 1, err);
        }
    }
    Ok(())
}

fn execute<P: Presenter>(player: &mut Player<P>, command: Command, opts: &PlayOpts) -> Result<()> {
    match command {
        Command::Media { path, content_type } => {
            load_media(player, &path, content_type.as_deref(), None)?;
        }
        Command::Subtitles { path } => load_subtitles(player, &path)?,
        Command::Key(code) => {
            if player.handle_key(&code) == KeyOutcome::Ignored {
                debug!("Key '{}' ignored", code);
            }
        }
        Command::Select(index) => player.select(index)?,
        Command::Wait(secs) => player.wait(secs, opts.tick)?,
        Command::Seek(position) => player.seek(position)?,
        Command::Drag {
            client_x,
            container_left,
            container_width,
        } => {
            player.begin_divider_drag();
            player.move_divider(client_x, container_left, container_width)?;
            player.end_divider_drag()?;
        }
        Command::Status => {
            let status = player.status();
            let position = status
                .position
                .map_or_else(|| "-".to_string(), format_timestamp);
            let state = match status.paused {
                Some(true) => "paused",
                Some(false) => "playing",
                None => "no media",
            };
            println!(
                "status: {} {} ({} cues, active {:?})",
                position, state, status.cues, status.active
            );
        }
    }
    Ok(())
}

fn load_media<P: Presenter>(
    player: &mut Player<P>,
    path: &str,
    content_type: Option<&str>,
    duration: Option<f64>,
) -> Result<()> {
    let content_type = content_type
        .or_else(|| guess_content_type(path))
        .unwrap_or_default();
    let source = path.to_string();
    let loaded = player.load_media(content_type, |kind| {
        Box::new(SimulatedMedia::new(source, kind, duration)) as Box<dyn MediaElement>
    })?;
    if loaded.is_none() {
        warn!("'{}' is not an audio or video file", path);
    }
    Ok(())
}

fn load_subtitles<P: Presenter>(player: &mut Player<P>, path: &str) -> Result<()> {
    let data = read_input(path)?;
    let summary = player
        .load_subtitles(&data)
        .context(format!("Failed to load subtitles: '{}'", path))?;
    if summary.cues == 0 {
        warn!("No cues found in '{}'", path);
    }
    Ok(())
}
