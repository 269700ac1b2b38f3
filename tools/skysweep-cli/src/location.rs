//! Shared arguments: where to look and how to get the images

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use skysweep_core::band::present_count;
use skysweep_core::config::{self, Config};
use skysweep_core::{
    BandImage, BandImages, CoordUnit, FetchError, FetchRequest, ImageCache, ImageSource,
    SkyPosition, fetch_bands,
};

use crate::fits;
use crate::skyview::SkyView;

/// Sky position and survey options
#[derive(Args, Debug)]
pub struct LocationArgs {
    /// Right ascension (e.g. 13:29:52.7, or 202.47 with --unit degrees)
    #[arg(allow_hyphen_values = true)]
    pub ra: String,

    /// Declination (e.g. +47:11:43, or 47.195 with --unit degrees)
    #[arg(allow_hyphen_values = true)]
    pub dec: String,

    /// Coordinate format: hms-dms or degrees
    #[arg(long)]
    pub unit: Option<CoordUnit>,

    /// Image width and height in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Field radius in degrees (the image spans twice this)
    #[arg(long)]
    pub radius: Option<f64>,

    /// Comma-separated survey bands (e.g. SDSSg,SDSSr,SDSSz)
    #[arg(long, value_delimiter = ',')]
    pub bands: Option<Vec<String>>,

    /// Read <band>.fits files from this directory instead of downloading
    #[arg(long)]
    pub fits_dir: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl LocationArgs {
    /// Effective configuration: file values overridden by flags.
    pub fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => config::load(),
        };

        if let Some(unit) = self.unit {
            config.survey.unit = unit;
        }
        if let Some(size) = self.size {
            config.survey.size = size;
        }
        if let Some(radius) = self.radius {
            config.survey.radius_deg = radius;
        }
        if let Some(bands) = &self.bands {
            config.survey.bands = bands.clone();
        }
        Ok(config)
    }

    pub fn position(&self, config: &Config) -> Result<SkyPosition> {
        Ok(SkyPosition::parse(&self.ra, &self.dec, config.survey.unit)?)
    }

    fn source(&self) -> Result<Box<dyn ImageSource>> {
        Ok(match &self.fits_dir {
            Some(dir) => Box::new(FitsDir::new(dir.clone())),
            None => Box::new(SkyView::new()?),
        })
    }

    /// Open the configured image source behind a cache.
    pub fn open(&self) -> Result<ImageCache<Box<dyn ImageSource>>> {
        Ok(ImageCache::new(self.source()?))
    }

    /// Fetch every configured band for the position.
    pub fn fetch(
        &self,
        cache: &ImageCache<Box<dyn ImageSource>>,
        config: &Config,
    ) -> Result<BandImages> {
        let position = self.position(config)?;
        let survey = &config.survey;
        info!(
            "Fetching {} bands at RA {} Dec {} ({})",
            survey.bands.len(),
            position.ra_hms(),
            position.dec_dms(),
            position.frame()
        );

        let images = fetch_bands(
            cache,
            position,
            &survey.band_set(),
            (survey.size, survey.size),
            survey.radius_deg,
        );
        debug!(
            present = present_count(&images),
            hits = cache.hits(),
            misses = cache.misses(),
            "bands fetched"
        );
        Ok(images)
    }
}

/// Offline source reading `<band>.fits` files from a directory.
pub struct FitsDir {
    root: PathBuf,
}

impl FitsDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ImageSource for FitsDir {
    fn fetch(&self, request: &FetchRequest) -> Result<BandImage, FetchError> {
        let path = self.root.join(format!("{}.fits", request.survey));
        debug!("reading {}", path.display());
        fits::read_band(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        location: LocationArgs,
    }

    fn parse(args: &[&str]) -> LocationArgs {
        Harness::parse_from(std::iter::once("skysweep").chain(args.iter().copied())).location
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[survey]\nsize = 64\nradius_deg = 0.5\n").unwrap();

        let args = parse(&[
            "10.5",
            "-20.25",
            "--unit",
            "degrees",
            "--bands",
            "SDSSg,SDSSr",
            "--radius",
            "0.1",
            "--config",
            path.to_str().unwrap(),
        ]);
        let config = args.config().unwrap();
        assert_eq!(config.survey.size, 64);
        assert_eq!(config.survey.radius_deg, 0.1);
        assert_eq!(config.survey.bands, vec!["SDSSg", "SDSSr"]);

        let position = args.position(&config).unwrap();
        assert_eq!(position.dec_deg(), -20.25);
    }

    #[test]
    fn test_fetch_from_fits_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SDSSr.fits"), fits::tests::unsigned_16bit()).unwrap();
        let config_path = dir.path().join("config.toml");

        let args = parse(&[
            "13:29:52.7",
            "+47:11:43",
            "--fits-dir",
            dir.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ]);
        let config = args.config().unwrap();
        let cache = args.open().unwrap();
        let images = args.fetch(&cache, &config).unwrap();

        assert_eq!(images.len(), 5);
        assert_eq!(present_count(&images), 1);
        assert_eq!(images[2].1.as_ref().unwrap().width(), 3);

        // Second fetch is served from the cache
        args.fetch(&cache, &config).unwrap();
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_fits_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FitsDir::new(dir.path().to_path_buf());
        let request = FetchRequest {
            position: SkyPosition::from_degrees(0.0, 0.0).unwrap(),
            survey: "SDSSz".into(),
            width: 8,
            height: 8,
            radius_deg: 0.2,
        };
        assert!(matches!(source.fetch(&request), Err(FetchError::Io(_))));
    }
}
