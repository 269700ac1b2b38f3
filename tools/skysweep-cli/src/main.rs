//! Skysweep - listen to the sky
//!
//! Fetches multi-band survey images around a sky position and sweeps them
//! column by column, turning brightness into pitch.
//!
//! # Commands
//!
//! - `skysweep preview` - Write the false-color image of a location
//! - `skysweep play` - Sweep a location through the speakers
//! - `skysweep render` - Write a sweep to WAV (waveform) or MIDI (voice)
//! - `skysweep instruments` - List instruments for the voice renderer
//! - `skysweep config` - Show or write the effective configuration
//!
//! # Usage
//!
//! ```bash
//! # Whirlpool Galaxy, sine tones
//! skysweep play 13:29:52.7 +47:11:43
//!
//! # Same field as a violin line, written to a MIDI file
//! skysweep render 13:29:52.7 +47:11:43 --renderer voice --instrument Violin
//!
//! # Degrees, one pitch per band
//! skysweep play 202.47 47.195 --unit degrees --per-band
//! ```
//!
//! # Configuration (config.toml)
//!
//! ```toml
//! renderer = "waveform"
//!
//! [survey]
//! bands = ["SDSSu", "SDSSg", "SDSSr", "SDSSi", "SDSSz"]
//! size = 256
//! radius_deg = 0.2
//!
//! [mapping]
//! mode = "combined"
//! kind = "midi"
//! min = 21
//! max = 108
//! ```

mod config;
mod fits;
mod instruments;
mod location;
mod play;
mod playback;
mod preview;
mod render;
mod skyview;
mod sonify;
mod synth;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use skysweep_core::SonifyError;

/// Skysweep - listen to the sky
#[derive(Parser)]
#[command(name = "skysweep")]
#[command(about = "Sonify sky survey images column by column")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the false-color image of a location
    Preview(preview::PreviewArgs),

    /// Sweep a location through the default audio device
    Play(play::PlayArgs),

    /// Write a sweep to a WAV or MIDI file
    Render(render::RenderArgs),

    /// List General MIDI instruments
    Instruments(instruments::InstrumentsArgs),

    /// Show or write the configuration file
    Config(config::ConfigArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Preview(args) => preview::execute(args),
        Commands::Play(args) => play::execute(args),
        Commands::Render(args) => render::execute(args),
        Commands::Instruments(args) => instruments::execute(args),
        Commands::Config(args) => config::execute(args),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let no_data = e
                .chain()
                .any(|cause| matches!(cause.downcast_ref::<SonifyError>(), Some(SonifyError::NoData)));
            if no_data {
                eprintln!("No images available for the given location.");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
