//! Preview command - write the false-color image of a location
//!
//! Optionally writes one frame every N columns with the scan line drawn in,
//! e.g. to assemble into an animation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use image::RgbImage;

use skysweep_core::preview::{compose_preview, highlight_column};

use crate::location::LocationArgs;

/// Arguments for the preview command
#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Output PNG path
    #[arg(short, long, default_value = "preview.png")]
    pub out: PathBuf,

    /// Also write scan-line frames into this directory
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    /// Column step between scan-line frames
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    pub every: u32,
}

/// Write the preview with `column` highlighted as `dir/frame_NNNN.png`.
pub fn write_frame(preview: &RgbImage, dir: &Path, column: usize) -> Result<PathBuf> {
    let path = dir.join(format!("frame_{column:04}.png"));
    highlight_column(preview, column)
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Write highlighted frames for columns `0, every, 2*every, ...`.
///
/// Returns the number of frames written.
pub fn write_frames(preview: &RgbImage, dir: &Path, every: usize) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = 0;
    for column in (0..preview.width() as usize).step_by(every.max(1)) {
        write_frame(preview, dir, column)?;
        written += 1;
    }
    Ok(written)
}

/// Execute the preview command
pub fn execute(args: PreviewArgs) -> Result<()> {
    let config = args.location.config()?;
    let cache = args.location.open()?;
    let images = args.location.fetch(&cache, &config)?;

    let preview = compose_preview(&images)?;
    preview
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!(
        "Preview ({}x{}) written to {}",
        preview.width(),
        preview.height(),
        args.out.display()
    );

    if let Some(dir) = &args.frames_dir {
        let count = write_frames(&preview, dir, args.every as usize)?;
        println!("{} scan-line frames written to {}", count, dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skysweep_core::{Band, BandImage};

    #[test]
    fn test_write_frames() {
        let image = BandImage::from_rows(2, 5, (0..10).map(f64::from).collect()).unwrap();
        let images = vec![(Band::new("SDSSr"), Some(image))];
        let preview = compose_preview(&images).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let count = write_frames(&preview, dir.path(), 2).unwrap();
        assert_eq!(count, 3);
        assert!(dir.path().join("frame_0000.png").exists());
        assert!(dir.path().join("frame_0004.png").exists());
    }
}
