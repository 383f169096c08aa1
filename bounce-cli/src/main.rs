//! Command-line front end for the bounce music core.
//!
//! Stands in for the game's physics and UI layers: it feeds simulated
//! ball collisions into a [`GameSession`], prints the detected notes and
//! can replay and export the recorded sequence.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bounce_core::{CoreConfig, CoreError, GameSession, InstrumentType, PitchTable};

#[derive(Parser)]
#[command(name = "bounce-cli", about = "Bounce music core demo driver")]
struct Cli {
    /// Path to a JSON config file (missing fields use defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a round of ball bounces and print the detected notes
    Simulate {
        /// Number of collisions to simulate
        #[arg(long, default_value_t = 8)]
        bounces: usize,
        /// Seconds between collisions
        #[arg(long, default_value_t = 0.3)]
        interval: f32,
        /// RNG seed for reproducible rounds
        #[arg(long)]
        seed: Option<u64>,
        /// Replay the recorded sequence after the round
        #[arg(long)]
        play: bool,
        /// Export the sequence as a text file into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Print every note the detector can quantize to
    Table,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Simulate {
            bounces,
            interval,
            seed,
            play,
            export,
        } => simulate(config, bounces, interval, seed, play, export),
        Command::Table => print_table(&config),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<CoreConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(CoreConfig::default()),
    }
}

fn simulate(
    config: CoreConfig,
    bounces: usize,
    interval: f32,
    seed: Option<u64>,
    play: bool,
    export: Option<PathBuf>,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut session = GameSession::new(config);
    session.start_round();
    println!("Simulating {} bounces...", bounces);

    for i in 0..bounces {
        let instrument = InstrumentType::ALL[rng.gen_range(0..InstrumentType::ALL.len())];
        let normalized_y: f32 = rng.r#gen();

        let report = session.handle_collision_with(instrument, normalized_y, &mut rng);
        println!(
            "  {:>2}. {:<8} y={:.2}  {:>8.2} Hz -> {}",
            i + 1,
            instrument.to_string(),
            normalized_y,
            report.frequency,
            report.note_name
        );

        if i + 1 < bounces {
            thread::sleep(Duration::from_secs_f32(interval));
        }
    }

    session.finish_round();
    println!("Recorded {} notes.", session.sequence().len());

    if play {
        match session.replay_channel() {
            Ok(receiver) => {
                println!("Replaying...");
                drain_replay(&receiver);
            }
            Err(CoreError::EmptySequence) => warn!("nothing to replay"),
            Err(err) => return Err(err).context("replaying sequence"),
        }
    }

    if let Some(directory) = export {
        match session.export(&directory) {
            Ok(path) => println!("Sequence exported to {}", path.display()),
            Err(CoreError::EmptySequence) => warn!("nothing to export"),
            Err(err) => return Err(err).context("exporting sequence"),
        }
    }

    Ok(())
}

/// Prints replayed notes as they arrive, bailing out if the playback
/// worker stalls instead of blocking the terminal forever.
fn drain_replay(receiver: &crossbeam_channel::Receiver<bounce_core::NoteEvent>) {
    loop {
        match receiver.recv_timeout(Duration::from_secs(30)) {
            Ok(event) => println!(
                "  {:>6.2}s  {:<8} {}",
                event.timestamp,
                event.instrument.to_string(),
                event.note_name
            ),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                warn!("replay stalled, giving up");
                break;
            }
        }
    }
}

fn print_table(config: &CoreConfig) -> Result<()> {
    let table = PitchTable::new(config.octave_range);
    for note in table.notes() {
        println!("{}: {:.2} Hz", note.name, note.frequency);
    }
    Ok(())
}
