use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::{
    fs,
    io::{self, BufRead},
    path::PathBuf,
};
use theremin::{
    AudioContext, Capabilities, Config, LevelDirection, NoteRange, ThereminApp, Waveform,
    mapping::{self, LEVEL_MARKERS_DB},
};
use theremin_player::{Player, PlayerHandle};

mod command;
use command::Command;

#[derive(Clone, Copy, ValueEnum)]
enum WaveformArg {
    Sine,
    Triangle,
    Saw,
    Square,
}

impl From<WaveformArg> for Waveform {
    fn from(waveform: WaveformArg) -> Self {
        match waveform {
            WaveformArg::Sine => Self::Sine,
            WaveformArg::Triangle => Self::Triangle,
            WaveformArg::Saw => Self::Saw,
            WaveformArg::Square => Self::Square,
        }
    }
}

#[derive(Parser)]
#[command(name = "theremin")]
#[command(
    about = "Play a theremin. Reads one command per line from stdin: start, stop, xy <x> <y>, range <low> <high>, low <note>, high <note>, quit"
)]
struct Cli {
    /// JSON file with startup settings. Flags take precedence over the file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Lowest note of the range (MIDI note number)
    #[arg(long)]
    low: Option<i32>,
    /// Highest note of the range (MIDI note number)
    #[arg(long)]
    high: Option<i32>,
    #[arg(long)]
    pitch_time_constant: Option<f32>,
    #[arg(long)]
    level_time_constant: Option<f32>,
    #[arg(short, long)]
    waveform: Option<WaveformArg>,
    /// Silent at the bottom edge rather than the top
    #[arg(long)]
    bottom_to_top: bool,
    /// Emulate an engine with no constant source node
    #[arg(long, conflicts_with = "direct_only")]
    legacy: bool,
    /// Emulate an engine that cannot connect signals to parameters
    #[arg(long)]
    direct_only: bool,
    #[arg(long, default_value_t = 0.01)]
    latency: f32,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Config::from_json(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Config::default(),
        };
        if let Some(low) = self.low {
            config.low = low;
        }
        if let Some(high) = self.high {
            config.high = high;
        }
        if let Some(pitch_time_constant) = self.pitch_time_constant {
            config.pitch_time_constant_s = pitch_time_constant;
        }
        if let Some(level_time_constant) = self.level_time_constant {
            config.level_time_constant_s = level_time_constant;
        }
        if let Some(waveform) = self.waveform {
            config.waveform = waveform.into();
        }
        if self.bottom_to_top {
            config.level_direction = LevelDirection::BottomToTop;
        }
        Ok(config)
    }

    fn capabilities(&self) -> Capabilities {
        if self.legacy {
            Capabilities::LEGACY
        } else if self.direct_only {
            Capabilities::DIRECT_ONLY
        } else {
            Capabilities::MODERN
        }
    }
}

fn log_range(range: NoteRange) {
    log::info!(
        "range {} ({}) .. {} ({})",
        mapping::note_name(range.low()),
        range.low(),
        mapping::note_name(range.high()),
        range.high(),
    );
}

/// Where each level marker sits on the surface, for drawing a scale beside the pointer.
fn log_level_markers(level_direction: LevelDirection) {
    for db in LEVEL_MARKERS_DB {
        let y = level_direction.level_y(mapping::y_of_level_db(db));
        log::debug!("{} dB at y = {:.3}", db, y);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.config()?;
    let player_config = theremin_player::Config {
        target_latency_s: cli.latency,
    };
    let player = Player::new()?;
    let ctx = AudioContext::new(player.sample_rate_hz()?, cli.capabilities());
    let mut app = ThereminApp::new(ctx.clone(), &config)?;
    log_range(app.range());
    log_level_markers(config.level_direction);
    // The output stream starts with the instrument, on the first start command.
    let mut handle: Option<PlayerHandle> = None;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                log::warn!("ignoring {:?}: {}", line, e);
                continue;
            }
        };
        match command {
            Command::Start => {
                app.set_running(true)?;
                match &handle {
                    Some(handle) => handle.resume()?,
                    None => handle = Some(player.play(ctx.renderer(), player_config)?),
                }
            }
            Command::Stop => {
                app.set_running(false)?;
                if let Some(handle) = &handle {
                    handle.pause()?;
                }
            }
            Command::Xy { x, y } => {
                app.set_gesture(x, y);
                if app.is_running() {
                    let level_y = config.level_direction.level_y(y);
                    log::debug!("level {:.1} dB", mapping::level_db(level_y));
                }
            }
            Command::Range { low, high } => match NoteRange::new(low, high) {
                Ok(range) => {
                    app.set_range(range);
                    log_range(range);
                }
                Err(e) => log::warn!("{}", e),
            },
            Command::Low(note) => log_range(app.set_range_low(note)),
            Command::High(note) => log_range(app.set_range_high(note)),
            Command::Quit => break,
        }
    }
    Ok(())
}
