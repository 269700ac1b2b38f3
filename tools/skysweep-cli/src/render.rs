//! Render command - write a sweep to disk instead of playing it
//!
//! The waveform renderer produces a 16-bit WAV file. The voice renderer
//! records its note events and writes a Standard MIDI File.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

use skysweep_core::export::{concat_tones, write_wav};
use skysweep_core::smf::write_smf;
use skysweep_core::{
    BandImages, Config, NoteEvent, NoteRecorder, RendererKind, Tone, ToneRenderer, VoiceRenderer,
    VoiceSettings, WaveformRenderer, sweep,
};

use crate::location::LocationArgs;
use crate::sonify::{SweepArgs, describe};

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Output file (default: out.wav, or out.mid for the voice renderer)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

fn default_output(kind: RendererKind) -> PathBuf {
    match kind {
        RendererKind::Waveform => PathBuf::from("out.wav"),
        RendererKind::Voice => PathBuf::from("out.mid"),
    }
}

/// Render every column into tones, in column order.
fn collect_tones(
    images: &BandImages,
    config: &Config,
    renderer: &mut dyn ToneRenderer,
) -> Result<Vec<Tone>> {
    let frames = sweep(images, &config.mapping, renderer)?;
    let width = frames.width();
    let mut tones = Vec::with_capacity(width);
    for frame in frames {
        let frame = frame?;
        debug!("{}", describe(&frame, width));
        tones.push(frame.tone);
    }
    Ok(tones)
}

/// Render a waveform sweep and write it as WAV. Returns the duration in seconds.
pub fn render_wav(images: &BandImages, config: &Config, out: &Path) -> Result<f32> {
    let mut renderer = WaveformRenderer::new(config.waveform.clone());
    let tones = collect_tones(images, config, &mut renderer)?;
    let Some(buffer) = concat_tones(&tones) else {
        bail!("The sweep produced no audio");
    };
    write_wav(&buffer, out).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(buffer.duration())
}

/// Render a voice sweep and write it as a MIDI file. Returns the note count.
pub fn render_midi(images: &BandImages, config: &Config, out: &Path) -> Result<usize> {
    let settings = VoiceSettings {
        pace: false,
        ..config.voice.clone()
    };
    let mut renderer = VoiceRenderer::new(NoteRecorder::new(), &settings)?;
    let tones = collect_tones(images, config, &mut renderer)?;
    let notes: Vec<NoteEvent> = tones.iter().flat_map(|t| t.notes().iter().copied()).collect();
    write_smf(&notes, renderer.program(), out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(notes.len())
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let mut config = args.location.config()?;
    args.sweep.apply(&mut config)?;
    let cache = args.location.open()?;
    let images = args.location.fetch(&cache, &config)?;

    let out = args.out.unwrap_or_else(|| default_output(config.renderer));
    match config.renderer {
        RendererKind::Waveform => {
            let seconds = render_wav(&images, &config, &out)?;
            println!("Rendered {:.1}s of audio to {}", seconds, out.display());
        }
        RendererKind::Voice => {
            let count = render_midi(&images, &config, &out)?;
            println!(
                "Rendered {} notes ({}) to {}",
                count,
                config.voice.instrument,
                out.display()
            );
        }
    }
    Ok(())
}
