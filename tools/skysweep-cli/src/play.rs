//! Play command - sweep a location through the default audio device
//!
//! With `--frames-dir`, the preview with the current scan line drawn in is
//! written for every column as it sounds, keeping picture and audio in step.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use image::RgbImage;
use tracing::{debug, info};

use skysweep_core::preview::compose_preview;
use skysweep_core::{
    BandImages, Config, RendererKind, SweepFrame, SynthBackend, ToneRenderer, VoiceRenderer,
    VoiceSettings, WaveformRenderer, sweep,
};

use crate::location::LocationArgs;
use crate::playback::{AudioOutput, SampleWriter};
use crate::preview::write_frame;
use crate::sonify::{SweepArgs, describe};
use crate::synth::LiveSynth;

/// Release tail left for the last synth note before the device closes
const SYNTH_TAIL: Duration = Duration::from_millis(100);

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Play the sweep this many times
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Write the scan-line frame of every played column into this directory
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,
}

/// Scan-line frames written alongside playback.
struct FrameWriter {
    preview: RgbImage,
    dir: PathBuf,
}

impl FrameWriter {
    fn open(images: &BandImages, dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self {
            preview: compose_preview(images)?,
            dir: dir.to_path_buf(),
        })
    }

    fn write(&self, frame: &SweepFrame) -> Result<()> {
        write_frame(&self.preview, &self.dir, frame.column)?;
        Ok(())
    }
}

/// Run one sweep, handing every frame to `sink`. Returns the number of frames.
fn run<R, F>(
    images: &BandImages,
    config: &Config,
    renderer: &mut R,
    frames_out: Option<&FrameWriter>,
    mut sink: F,
) -> Result<usize>
where
    R: ToneRenderer + ?Sized,
    F: FnMut(&SweepFrame),
{
    let frames = sweep(images, &config.mapping, renderer)?;
    let width = frames.width();
    let mut played = 0;
    for frame in frames {
        let frame = frame?;
        debug!("{}", describe(&frame, width));
        if let Some(out) = frames_out {
            out.write(&frame)?;
        }
        sink(&frame);
        played += 1;
    }
    Ok(played)
}

fn play_waveform(
    images: &BandImages,
    config: &Config,
    frames_out: Option<&FrameWriter>,
    writer: &mut SampleWriter,
) -> Result<usize> {
    let mut renderer = WaveformRenderer::new(config.waveform.clone());
    let played = run(images, config, &mut renderer, frames_out, |frame| {
        if let Some(buffer) = frame.tone.as_buffer() {
            writer.write_mono(&buffer.samples, buffer.sample_rate);
        }
    })?;
    writer.drain();
    Ok(played)
}

fn play_voice<B>(
    images: &BandImages,
    config: &Config,
    frames_out: Option<&FrameWriter>,
    renderer: &mut VoiceRenderer<B>,
) -> Result<usize>
where
    B: SynthBackend,
{
    renderer.reset();
    // Paced rendering already sounds the notes; nothing left to hand on
    run(images, config, renderer, frames_out, |_| {})
}

/// Execute the play command
pub fn execute(args: PlayArgs) -> Result<()> {
    let mut config = args.location.config()?;
    args.sweep.apply(&mut config)?;
    let cache = args.location.open()?;

    let frames_for = |images: &BandImages| -> Result<Option<FrameWriter>> {
        args.frames_dir
            .as_deref()
            .map(|dir| FrameWriter::open(images, dir))
            .transpose()
    };

    match config.renderer {
        RendererKind::Waveform => {
            let (output, mut writer) = AudioOutput::open()?;
            debug!(format = ?output.format(), "playing waveform sweep");
            for round in 0..args.repeat {
                let images = args.location.fetch(&cache, &config)?;
                let frames_out = frames_for(&images)?;
                let started = Instant::now();
                let played = play_waveform(&images, &config, frames_out.as_ref(), &mut writer)?;
                info!(
                    "Sweep {} played {} columns in {:.1}s",
                    round + 1,
                    played,
                    started.elapsed().as_secs_f32()
                );
            }
        }
        RendererKind::Voice => {
            let settings = VoiceSettings {
                pace: true,
                ..config.voice.clone()
            };
            let mut renderer = VoiceRenderer::new(LiveSynth::open()?, &settings)?;
            for round in 0..args.repeat {
                let images = args.location.fetch(&cache, &config)?;
                let frames_out = frames_for(&images)?;
                let started = Instant::now();
                let played = play_voice(&images, &config, frames_out.as_ref(), &mut renderer)?;
                info!(
                    "Sweep {} played {} columns on {} in {:.1}s",
                    round + 1,
                    played,
                    settings.instrument,
                    started.elapsed().as_secs_f32()
                );
            }
            thread::sleep(SYNTH_TAIL);
        }
    }

    if let Some(dir) = &args.frames_dir {
        println!("Scan-line frames written to {}", dir.display());
    }
    println!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skysweep_core::render::SynthCommand;
    use skysweep_core::{Band, BandImage, NoteRecorder};

    fn images() -> BandImages {
        let ramp = BandImage::from_rows(2, 3, vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0]).unwrap();
        vec![(Band::new("SDSSr"), Some(ramp))]
    }

    #[test]
    fn test_frames_follow_played_columns() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("frames");
        let images = images();
        let frames_out = FrameWriter::open(&images, &frames_dir).unwrap();

        let mut renderer = WaveformRenderer::new(Config::default().waveform);
        let mut columns = Vec::new();
        let played = run(&images, &Config::default(), &mut renderer, Some(&frames_out), |frame| {
            columns.push(frame.column);
            assert!(frames_dir.join(format!("frame_{:04}.png", frame.column)).exists());
        })
        .unwrap();

        assert_eq!(played, 3);
        assert_eq!(columns, vec![0, 1, 2]);
    }

    #[test]
    fn test_voice_repeat_plays_every_column() {
        let config = Config::default();
        let settings = VoiceSettings {
            pace: false,
            ..VoiceSettings::default()
        };
        let mut renderer = VoiceRenderer::new(NoteRecorder::new(), &settings).unwrap();

        assert_eq!(play_voice(&images(), &config, None, &mut renderer).unwrap(), 3);
        assert_eq!(play_voice(&images(), &config, None, &mut renderer).unwrap(), 3);
        let note_ons = renderer
            .backend()
            .commands()
            .iter()
            .filter(|c| matches!(c, SynthCommand::NoteOn { .. }))
            .count();
        assert_eq!(note_ons, 6);
    }
}
